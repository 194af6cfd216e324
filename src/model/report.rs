use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Terminal classification for a session. Selected once, by the first
/// matching predicate in `engine::ending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// Health reached zero.
    Death,
    /// Bond collapsed to zero.
    Estrangement,
    /// Bond maxed out at one hundred.
    Bonded,
    /// The scenario's turn cap was reached with nothing else triggering.
    Survival,
}

impl Ending {
    pub fn title(&self) -> &'static str {
        match self {
            Ending::Death => "BAD END — fallen in the flow",
            Ending::Estrangement => "COLD END — paths diverge",
            Ending::Bonded => "TRUE END — bound beyond the trial",
            Ending::Survival => "CLEAR — the trial runs its course",
        }
    }
}

/// Produced exactly once, when the session transitions to ended. The
/// epitaph comes from one extra oracle call and is best-effort: an ended
/// game with `epitaph: None` is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalReport {
    pub ending: Ending,
    pub title: String,
    pub epitaph: Option<String>,

    pub health: i32,
    pub bond: Option<i32>,
    pub attributes: BTreeMap<String, i32>,
    pub inventory: Vec<String>,
    pub turns_survived: u32,
}
