use crate::model::game_state::GameState;
use crate::model::report::Ending;

/// Decide whether the turn that just resolved ends the session.
///
/// Predicates run in priority order; the first match wins. Death must
/// outrank a simultaneous bond extreme, so a turn that both kills the
/// protagonist and maxes the bond is still a death.
pub fn evaluate(state: &GameState, completed_turn: u32, turn_cap: u32) -> Option<Ending> {
    if state.health <= 0 {
        return Some(Ending::Death);
    }

    if let Some(bond) = state.bond {
        if bond <= 0 {
            return Some(Ending::Estrangement);
        }
        if bond >= 100 {
            return Some(Ending::Bonded);
        }
    }

    if completed_turn >= turn_cap {
        return Some(Ending::Survival);
    }

    None
}
