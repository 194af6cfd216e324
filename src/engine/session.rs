use log::{debug, info, warn};
use thiserror::Error;

use crate::engine::apply_delta::apply_delta;
use crate::engine::delta_parser::{parse_delta, DeltaParseError};
use crate::engine::ending;
use crate::engine::llm_client::{Oracle, OracleError};
use crate::engine::prompt_builder::{PromptBuilder, DEFAULT_INSTRUCTION};
use crate::model::game_state::GameState;
use crate::model::message::HistoryEntry;
use crate::model::notification::Notification;
use crate::model::report::{Ending, FinalReport};
use crate::model::world::ScenarioDef;

/// One live playthrough: the scenario, the fixed character roster, and the
/// single GameState value. The hosting layer owns exactly one of these per
/// user session and drops it on reset.
pub struct Session {
    scenario: ScenarioDef,
    protagonist: String,
    companion: String,
    state: GameState,
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("the session has ended; reset to play again")]
    SessionOver,

    #[error("oracle call failed: {0}")]
    Oracle(#[from] OracleError),

    #[error("could not reconcile the story beat: {0}")]
    Delta(#[from] DeltaParseError),
}

/// What a resolved turn hands back to the presentation layer, next to the
/// state snapshot it can read any time.
#[derive(Debug)]
pub struct TurnOutcome {
    pub narrative: String,
    pub notifications: Vec<Notification>,
    pub ending: Option<Ending>,
}

impl Session {
    pub fn new(
        scenario: ScenarioDef,
        protagonist: impl Into<String>,
        companion: impl Into<String>,
    ) -> Self {
        let state = GameState::for_scenario(&scenario);
        Self {
            scenario,
            protagonist: protagonist.into(),
            companion: companion.into(),
            state,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn scenario(&self) -> &ScenarioDef {
        &self.scenario
    }

    /// Discard the playthrough and start the same scenario fresh.
    pub fn reset(&mut self) {
        self.state = GameState::for_scenario(&self.scenario);
    }

    /// Run one complete turn. Atomic: both oracle calls and the delta
    /// parse must succeed before anything is committed, so a failed turn
    /// leaves the state exactly as it was and the player can resubmit.
    pub fn run_turn(
        &mut self,
        oracle: &dyn Oracle,
        instruction: &str,
    ) -> Result<TurnOutcome, TurnError> {
        if self.state.game_over {
            return Err(TurnError::SessionOver);
        }

        let typed = instruction.trim();
        let directive = if typed.is_empty() { DEFAULT_INSTRUCTION } else { typed };

        let narrative_prompt = PromptBuilder::narrative(
            &self.scenario,
            &self.protagonist,
            &self.companion,
            &self.state,
            directive,
        );
        debug!(
            "turn {}: narrative prompt is {} chars",
            self.state.turn,
            narrative_prompt.len()
        );
        let narrative = oracle.complete(&narrative_prompt)?;

        let payload = oracle.complete(&PromptBuilder::reconciliation(&narrative))?;
        let delta = parse_delta(&payload)?;
        if delta.is_empty() {
            debug!("turn {}: zero-delta beat", self.state.turn);
        } else {
            debug!("turn {}: delta {:?}", self.state.turn, delta);
        }

        // Everything below is the commit; no fallible step past this line
        // except the best-effort closing report.
        if !typed.is_empty() {
            self.state.history.push(HistoryEntry::player(typed));
        }
        let image_url = delta.image_prompt.as_deref().and_then(illustration_url);
        self.state
            .history
            .push(HistoryEntry::narrator(narrative.clone(), image_url));

        let notifications = apply_delta(&mut self.state, &delta);

        let completed = self.state.turn;
        self.state.turn += 1;

        let ending = ending::evaluate(&self.state, completed, self.scenario.turn_cap);
        if let Some(ending) = ending {
            self.state.game_over = true;
            info!("session ended on turn {}: {}", completed, ending.title());
            self.state.final_report = self.generate_report(oracle, ending, completed);
        }

        Ok(TurnOutcome {
            narrative,
            notifications,
            ending,
        })
    }

    /// One extra oracle call for the closing report. Its failure must not
    /// take the session down: an ended game with no report is valid.
    fn generate_report(
        &self,
        oracle: &dyn Oracle,
        ending: Ending,
        turns_survived: u32,
    ) -> Option<FinalReport> {
        let prompt = PromptBuilder::report(&self.scenario, &self.protagonist, &self.state, ending);
        let epitaph = match oracle.complete(&prompt) {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!("closing report generation failed: {err}");
                return None;
            }
        };

        Some(FinalReport {
            ending,
            title: ending.title().to_string(),
            epitaph: Some(epitaph),
            health: self.state.health,
            bond: self.state.bond,
            attributes: self.state.attributes.clone(),
            inventory: self.state.inventory.clone(),
            turns_survived,
        })
    }
}

/// Turn an illustration prompt into a pollinations.ai image URL. The URL
/// is stored on the narrator entry; nothing is fetched here.
fn illustration_url(prompt: &str) -> Option<String> {
    let mut url = reqwest::Url::parse("https://image.pollinations.ai").ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push("prompt")
        .push(prompt);
    url.query_pairs_mut()
        .append_pair("width", "1024")
        .append_pair("height", "512")
        .append_pair("nologo", "true");
    Some(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use crate::model::message::HistoryRole;
    use crate::model::world::builtin_scenarios;

    enum Step {
        Reply(&'static str),
        Fail,
    }

    /// In-memory oracle double: replays a script and records every prompt
    /// it was handed.
    struct ScriptedOracle {
        script: RefCell<VecDeque<Step>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedOracle {
        fn new(steps: Vec<Step>) -> Self {
            Self {
                script: RefCell::new(steps.into()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.borrow()[index].clone()
        }
    }

    impl Oracle for ScriptedOracle {
        fn complete(&self, prompt: &str) -> Result<String, OracleError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            match self.script.borrow_mut().pop_front() {
                Some(Step::Reply(text)) => Ok(text.to_string()),
                Some(Step::Fail) | None => Err(OracleError::EmptyCompletion),
            }
        }
    }

    fn scenario(key: &str) -> ScenarioDef {
        builtin_scenarios().into_iter().find(|s| s.key == key).unwrap()
    }

    fn session(key: &str) -> Session {
        Session::new(scenario(key), "Ye Fan", "Eve")
    }

    const DELTA_KNIFE: &str =
        "```json\n{\"hp_change\": -30, \"bond_change\": 5, \"new_item\": \"rusty knife\", \
         \"image_prompt\": \"a dark aisle, cinematic\"}\n```";

    #[test]
    fn a_full_turn_commits_everything_at_once() {
        let mut session = session("supermarket");
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("The shelf gives way and the dead pour in."),
            Step::Reply(DELTA_KNIFE),
        ]);

        let outcome = session.run_turn(&oracle, "charge the enemy").unwrap();

        assert_eq!(outcome.narrative, "The shelf gives way and the dead pour in.");
        assert_eq!(outcome.ending, None);
        assert_eq!(outcome.notifications.len(), 3);

        let state = session.state();
        assert_eq!(state.health, 70);
        assert_eq!(state.bond, Some(55));
        assert_eq!(state.inventory, vec!["rusty knife".to_string()]);
        assert_eq!(state.turn, 2);
        assert!(!state.game_over);

        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].role, HistoryRole::Player);
        assert_eq!(state.history[0].text, "charge the enemy");
        assert_eq!(state.history[1].role, HistoryRole::Narrator);
        let image = state.history[1].image_url.as_deref().unwrap();
        assert!(image.starts_with("https://image.pollinations.ai/prompt/"));
        assert!(image.contains("width=1024"));
        assert!(!image.contains(' '));
    }

    #[test]
    fn empty_instruction_becomes_the_escalation_directive() {
        let mut session = session("supermarket");
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("Quiet, for now."),
            Step::Reply("{\"hp_change\": 0}"),
        ]);

        session.run_turn(&oracle, "   ").unwrap();

        assert!(oracle.prompt(0).contains(DEFAULT_INSTRUCTION));
        // No player entry is recorded for an empty command.
        assert_eq!(session.state().history.len(), 1);
        assert_eq!(session.state().history[0].role, HistoryRole::Narrator);
    }

    #[test]
    fn oracle_failure_aborts_with_no_mutation() {
        let mut session = session("supermarket");
        let oracle = ScriptedOracle::new(vec![Step::Fail]);

        let err = session.run_turn(&oracle, "run").unwrap_err();
        assert!(matches!(err, TurnError::Oracle(_)));

        let state = session.state();
        assert_eq!(state.turn, 1);
        assert!(state.history.is_empty());
        assert_eq!(state.health, 100);
    }

    #[test]
    fn unparseable_delta_discards_the_whole_turn() {
        let mut session = session("supermarket");
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("A narrative that will never be reconciled."),
            Step::Reply("I cannot help with structured output today."),
        ]);

        let err = session.run_turn(&oracle, "hide").unwrap_err();
        assert!(matches!(err, TurnError::Delta(_)));

        // Atomic turn: the already-generated narrative is not committed.
        let state = session.state();
        assert!(state.history.is_empty());
        assert_eq!(state.turn, 1);
    }

    #[test]
    fn death_ending_clamps_health_and_freezes_the_session() {
        let mut session = session("supermarket");
        session.state.health = 20;
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("The horde closes in."),
            Step::Reply("{\"hp_change\": -25, \"bond_change\": 10}"),
            Step::Reply("They held the line until they could not."),
        ]);

        let outcome = session.run_turn(&oracle, "stand and fight").unwrap();

        assert_eq!(outcome.ending, Some(Ending::Death));
        let state = session.state();
        assert_eq!(state.health, 0);
        assert!(state.game_over);

        let report = state.final_report.as_ref().unwrap();
        assert_eq!(report.ending, Ending::Death);
        assert_eq!(report.turns_survived, 1);
        assert_eq!(
            report.epitaph.as_deref(),
            Some("They held the line until they could not.")
        );

        let err = session.run_turn(&oracle, "keep fighting").unwrap_err();
        assert!(matches!(err, TurnError::SessionOver));
    }

    #[test]
    fn bonded_ending_at_the_clamp_boundary() {
        let mut session = session("titanic");
        session.state.bond = Some(95);
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("A promise, sealed on the boat deck."),
            Step::Reply("{\"bond_change\": 10}"),
            Step::Reply("Two names on one lifeboat manifest."),
        ]);

        let outcome = session.run_turn(&oracle, "stay together").unwrap();

        assert_eq!(outcome.ending, Some(Ending::Bonded));
        assert_eq!(session.state().bond, Some(100));
        assert!(session.state().game_over);
    }

    #[test]
    fn report_failure_leaves_a_valid_ended_state() {
        let mut session = session("supermarket");
        session.state.health = 5;
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("It ends in the stockroom."),
            Step::Reply("{\"hp_change\": -80}"),
            Step::Fail,
        ]);

        let outcome = session.run_turn(&oracle, "").unwrap();

        assert_eq!(outcome.ending, Some(Ending::Death));
        assert!(session.state().game_over);
        assert!(session.state().final_report.is_none());
    }

    #[test]
    fn turn_cap_forces_the_survival_ending() {
        let mut scenario = scenario("supermarket");
        scenario.turn_cap = 2;
        let mut session = Session::new(scenario, "Ye Fan", "Eve");

        let oracle = ScriptedOracle::new(vec![
            Step::Reply("Night one."),
            Step::Reply("{\"hp_change\": -5}"),
            Step::Reply("Night two, and dawn."),
            Step::Reply("{\"hp_change\": -5}"),
            Step::Reply("Against every odd, they walked out."),
        ]);

        let first = session.run_turn(&oracle, "bar the doors").unwrap();
        assert_eq!(first.ending, None);

        let second = session.run_turn(&oracle, "wait for dawn").unwrap();
        assert_eq!(second.ending, Some(Ending::Survival));
        assert_eq!(session.state().health, 90);
        assert!(session.state().game_over);
        assert_eq!(
            session.state().final_report.as_ref().unwrap().turns_survived,
            2
        );
    }

    #[test]
    fn reset_discards_the_playthrough() {
        let mut session = session("supermarket");
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("A bad night."),
            Step::Reply("{\"hp_change\": -40}"),
        ]);
        session.run_turn(&oracle, "scavenge").unwrap();
        assert_eq!(session.state().health, 60);

        session.reset();
        let state = session.state();
        assert_eq!(state.health, 100);
        assert_eq!(state.turn, 1);
        assert!(state.history.is_empty());
        assert!(!state.game_over);
    }

    #[test]
    fn trial_attributes_shift_and_stay_clamped() {
        let mut session = session("soul_trial");
        let oracle = ScriptedOracle::new(vec![
            Step::Reply("The mirror asks its first question."),
            Step::Reply("{\"attribute_changes\": {\"courage\": 70, \"coldness\": -80}}"),
        ]);

        session.run_turn(&oracle, "answer honestly").unwrap();

        let state = session.state();
        assert_eq!(state.attributes["courage"], 100);
        assert_eq!(state.attributes["coldness"], 0);
        assert_eq!(state.attributes["wisdom"], 50);
    }
}
