use crate::model::game_state::GameState;
use crate::model::message::{HistoryEntry, HistoryRole};
use crate::model::report::Ending;
use crate::model::world::ScenarioDef;

/// Substituted when the player submits nothing. An empty command is never
/// an error; it means "continue the story unprompted".
pub const DEFAULT_INSTRUCTION: &str = "Keep the story moving and escalate the crisis.";

/// Builds the prompts sent to the oracle.
/// This struct is intentionally dumb: it only formats text. All numeric
/// state the oracle needs to reason about is embedded verbatim; no
/// arithmetic happens here.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Prompt for the prose continuation of the current turn.
    pub fn narrative(
        scenario: &ScenarioDef,
        protagonist: &str,
        companion: &str,
        state: &GameState,
        instruction: &str,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You are the game master of an infinite-flow survival story.\n\n",
        );

        prompt.push_str(&format!("SCENARIO: {}\n", scenario.title));
        prompt.push_str(&scenario.description);
        prompt.push_str("\n\n");

        push_roster_section(&mut prompt, protagonist, companion, state);
        push_pack_section(&mut prompt, state);
        push_history_section(&mut prompt, state.history_window());

        prompt.push_str(&format!("DIRECTIVE: {}\n\n", instruction));

        prompt.push_str(
            "Keep it under 200 words. Tight pacing, vivid imagery, end on a live beat.\n",
        );

        prompt
    }

    /// Prompt for the numeric fallout of a story beat. The oracle is asked
    /// for strict JSON; the parser still treats the shape as untrusted.
    pub fn reconciliation(narrative: &str) -> String {
        let mut prompt = String::new();

        prompt.push_str("Read this story beat:\n'''");
        prompt.push_str(narrative);
        prompt.push_str("'''\n\n");

        prompt.push_str(
            "Do two things:\n\
             1. Work out the numeric fallout (HP, bond, traits, items gained).\n\
             2. Compress the beat into one English illustration prompt \
             (image_prompt). Be concrete and include a style, e.g. cinematic, \
             dark, fantasy.\n\n",
        );

        prompt.push_str(
            "Answer with strictly this JSON shape and nothing else:\n\
             {\n\
             \x20   \"hp_change\": 0,\n\
             \x20   \"bond_change\": 0,\n\
             \x20   \"attribute_changes\": {},\n\
             \x20   \"new_item\": null,\n\
             \x20   \"image_prompt\": \"A cinematic shot of a dark supermarket aisle\"\n\
             }\n",
        );

        prompt
    }

    /// Prompt for the one-shot closing report after the session ends.
    pub fn report(
        scenario: &ScenarioDef,
        protagonist: &str,
        state: &GameState,
        ending: Ending,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("The run has ended: {}.\n", ending.title()));
        prompt.push_str(&format!(
            "{} lasted {} turn(s) in \"{}\". Final HP {}/100",
            protagonist,
            state.turn.saturating_sub(1),
            scenario.title,
            state.health,
        ));
        if let Some(bond) = state.bond {
            prompt.push_str(&format!(", bond {}/100", bond));
        }
        prompt.push('.');
        prompt.push('\n');

        if !state.attributes.is_empty() {
            prompt.push_str("Traits:");
            for (name, value) in &state.attributes {
                prompt.push_str(&format!(" {} {}/100", name, value));
            }
            prompt.push('\n');
        }

        if !state.inventory.is_empty() {
            prompt.push_str(&format!("Pack: {}\n", state.inventory.join(", ")));
        }

        prompt.push_str(
            "\nWrite a closing epitaph for this run in under 80 words. Prose only.\n",
        );

        prompt
    }
}

fn push_roster_section(
    prompt: &mut String,
    protagonist: &str,
    companion: &str,
    state: &GameState,
) {
    prompt.push_str(&format!(
        "PROTAGONIST: {} (HP: {}/100)\n",
        protagonist, state.health
    ));
    match state.bond {
        Some(bond) => {
            prompt.push_str(&format!("COMPANION: {} (bond: {}/100)\n", companion, bond));
        }
        None => prompt.push_str(&format!("COMPANION: {}\n", companion)),
    }

    if !state.attributes.is_empty() {
        prompt.push_str("TRAITS:");
        for (name, value) in &state.attributes {
            prompt.push_str(&format!(" {} {}/100", name, value));
        }
        prompt.push('\n');
    }
    prompt.push('\n');
}

fn push_pack_section(prompt: &mut String, state: &GameState) {
    if state.inventory.is_empty() {
        prompt.push_str("PACK: empty\n\n");
    } else {
        prompt.push_str(&format!("PACK: {}\n\n", state.inventory.join(", ")));
    }
}

fn push_history_section(prompt: &mut String, window: &[HistoryEntry]) {
    if window.is_empty() {
        prompt.push_str("PREVIOUSLY: the story has just begun.\n\n");
        return;
    }

    prompt.push_str("PREVIOUSLY:\n");
    for entry in window {
        let tag = match entry.role {
            HistoryRole::Player => "[PLAYER]",
            HistoryRole::Narrator => "[NARRATOR]",
        };
        prompt.push_str(&format!("{} {}\n", tag, entry.text));
    }
    prompt.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::world::builtin_scenarios;

    fn scenario(key: &str) -> ScenarioDef {
        builtin_scenarios().into_iter().find(|s| s.key == key).unwrap()
    }

    #[test]
    fn narrative_prompt_embeds_numeric_state_and_instruction() {
        let scenario = scenario("supermarket");
        let mut state = GameState::for_scenario(&scenario);
        state.health = 70;
        state.bond = Some(55);
        state.inventory.push("rusty knife".into());

        let prompt =
            PromptBuilder::narrative(&scenario, "Ye Fan", "Eve", &state, "charge the enemy");

        assert!(prompt.contains("PROTAGONIST: Ye Fan (HP: 70/100)"));
        assert!(prompt.contains("COMPANION: Eve (bond: 55/100)"));
        assert!(prompt.contains("PACK: rusty knife"));
        assert!(prompt.contains("DIRECTIVE: charge the enemy"));
    }

    #[test]
    fn narrative_prompt_history_is_windowed() {
        let scenario = scenario("supermarket");
        let mut state = GameState::for_scenario(&scenario);
        for i in 0..7 {
            state
                .history
                .push(HistoryEntry::narrator(format!("beat {i}"), None));
        }

        let prompt = PromptBuilder::narrative(&scenario, "Ye Fan", "Eve", &state, "hold the line");

        assert!(!prompt.contains("beat 2"));
        assert!(prompt.contains("[NARRATOR] beat 3"));
        assert!(prompt.contains("[NARRATOR] beat 6"));
    }

    #[test]
    fn trial_prompt_lists_traits_without_bond() {
        let scenario = scenario("soul_trial");
        let state = GameState::for_scenario(&scenario);

        let prompt = PromptBuilder::narrative(&scenario, "Ye Fan", "Eve", &state, "look around");

        assert!(prompt.contains("courage 50/100"));
        assert!(!prompt.contains("bond:"));
    }

    #[test]
    fn reconciliation_prompt_quotes_the_beat_and_names_the_keys() {
        let prompt = PromptBuilder::reconciliation("The shelf collapses.");
        assert!(prompt.contains("'''The shelf collapses.'''"));
        for key in ["hp_change", "bond_change", "attribute_changes", "new_item", "image_prompt"] {
            assert!(prompt.contains(key), "missing key {key}");
        }
    }
}
