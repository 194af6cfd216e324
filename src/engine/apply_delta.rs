use crate::model::game_state::{clamp_stat, GameState};
use crate::model::notification::Notification;
use crate::model::turn_delta::TurnDelta;

/// Apply a validated delta to the state, clamping every numeric track to
/// [0,100] in the same step. Returns one notification per change that
/// actually happened.
///
/// An ended session is frozen: the call is a no-op.
pub fn apply_delta(state: &mut GameState, delta: &TurnDelta) -> Vec<Notification> {
    if state.game_over {
        return Vec::new();
    }

    let mut notifications = Vec::new();

    if delta.hp_change != 0 {
        state.health = clamp_stat(state.health + delta.hp_change);
        notifications.push(Notification::HealthChanged {
            delta: delta.hp_change,
        });
    }

    // Bond deltas in bond-less worlds are legal oracle output; they just
    // mean nothing there.
    if delta.bond_change != 0 {
        if let Some(bond) = state.bond.as_mut() {
            *bond = clamp_stat(*bond + delta.bond_change);
            notifications.push(Notification::BondChanged {
                delta: delta.bond_change,
            });
        }
    }

    for (name, shift) in &delta.attribute_changes {
        if *shift == 0 {
            continue;
        }
        // Only attributes the scenario declared exist; a hallucinated
        // stat cannot grow the state vector.
        if let Some(value) = state.attributes.get_mut(name) {
            *value = clamp_stat(*value + shift);
            notifications.push(Notification::AttributeChanged {
                name: name.clone(),
                delta: *shift,
            });
        }
    }

    if let Some(item) = delta.new_item.as_deref() {
        if !is_item_sentinel(item) {
            state.inventory.push(item.to_string());
            notifications.push(Notification::ItemAcquired {
                item: item.to_string(),
            });
        }
    }

    notifications
}

/// "none"/"null" in any casing mean "no item", as does an empty string.
fn is_item_sentinel(item: &str) -> bool {
    let item = item.trim();
    item.is_empty() || item.eq_ignore_ascii_case("none") || item.eq_ignore_ascii_case("null")
}
