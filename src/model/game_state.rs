use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::message::HistoryEntry;
use crate::model::report::FinalReport;
use crate::model::world::ScenarioDef;

/// How many trailing transcript entries are fed back into prompts.
pub const HISTORY_WINDOW: usize = 4;

pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;

pub fn clamp_stat(value: i32) -> i32 {
    value.clamp(STAT_MIN, STAT_MAX)
}

/// The whole session state, one live value per session, no persistence.
/// Owned by the session; the presentation layer only ever sees clones.
///
/// Every numeric track is clamped to [0,100] the moment a delta lands,
/// so no reader can observe a transient out-of-range value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub health: i32,

    /// `None` in worlds that do not track the companion bond.
    pub bond: Option<i32>,

    /// Trait meters, present only in worlds that declare them.
    pub attributes: BTreeMap<String, i32>,

    /// Append-only. Duplicates permitted.
    pub inventory: Vec<String>,

    /// Append-only transcript; prompts read `history_window()`.
    pub history: Vec<HistoryEntry>,

    /// Starts at 1, advances once per fully successful turn.
    pub turn: u32,

    pub game_over: bool,
    pub final_report: Option<FinalReport>,
}

impl GameState {
    pub fn for_scenario(scenario: &ScenarioDef) -> Self {
        Self {
            health: STAT_MAX,
            bond: scenario.tracks_bond.then_some(50),
            attributes: scenario
                .attributes
                .iter()
                .map(|a| (a.name.clone(), clamp_stat(a.start)))
                .collect(),
            inventory: Vec::new(),
            history: Vec::new(),
            turn: 1,
            game_over: false,
            final_report: None,
        }
    }

    /// The trailing slice of the transcript used as prompt context.
    pub fn history_window(&self) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(HISTORY_WINDOW);
        &self.history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::world::builtin_scenarios;

    fn scenario(key: &str) -> ScenarioDef {
        builtin_scenarios().into_iter().find(|s| s.key == key).unwrap()
    }

    #[test]
    fn fresh_state_matches_scenario_tracks() {
        let state = GameState::for_scenario(&scenario("supermarket"));
        assert_eq!(state.health, 100);
        assert_eq!(state.bond, Some(50));
        assert!(state.attributes.is_empty());
        assert_eq!(state.turn, 1);
        assert!(!state.game_over);

        let trial = GameState::for_scenario(&scenario("soul_trial"));
        assert_eq!(trial.bond, None);
        assert_eq!(trial.attributes.get("courage"), Some(&50));
        assert_eq!(trial.attributes.len(), 3);
    }

    #[test]
    fn history_window_is_bounded() {
        let mut state = GameState::for_scenario(&scenario("supermarket"));
        assert!(state.history_window().is_empty());

        for i in 0..6 {
            state.history.push(HistoryEntry::narrator(format!("beat {i}"), None));
        }
        let window = state.history_window();
        assert_eq!(window.len(), HISTORY_WINDOW);
        assert_eq!(window[0].text, "beat 2");
        assert_eq!(window[3].text, "beat 5");
    }
}
