use crate::model::game_state::GameState;
use crate::model::notification::Notification;
use crate::model::report::{Ending, FinalReport};
use crate::model::world::ScenarioDef;

/// What the presentation layer may ask of the engine. One command is
/// processed at a time, so there is never more than one turn in flight.
pub enum EngineCommand {
    /// Begin a playthrough. Character names are fixed from here on.
    StartSession {
        scenario: String,
        protagonist: String,
        companion: String,
    },

    /// The player's free-text instruction; empty text is a valid command.
    SubmitInstruction(String),

    /// Author a custom world (name -> description), quota permitting.
    DefineWorld { name: String, description: String },

    /// List playable worlds.
    ListWorlds,

    /// Discard the current playthrough and restart the same scenario.
    Reset,

    Shutdown,
}

pub enum EngineResponse {
    SessionStarted {
        scenario: ScenarioDef,
        snapshot: GameState,
    },

    TurnResolved {
        snapshot: GameState,
        narrative: String,
        notifications: Vec<Notification>,
        ending: Option<Ending>,
        report: Option<FinalReport>,
    },

    /// The turn aborted with no state change; the player may resubmit.
    TurnFailed { message: String },

    WorldDefined { remaining_quota: u32 },

    WorldRejected { message: String },

    WorldList {
        builtin: Vec<ScenarioDef>,
        custom: Vec<String>,
        remaining_quota: u32,
    },

    SessionReset { snapshot: GameState },

    UnknownScenario { key: String },

    NoSession,
}
