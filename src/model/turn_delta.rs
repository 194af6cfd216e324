use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The canonical delta schema every payload encoding is adapted into.
/// All fields are optional on the wire; a missing field means "no change",
/// never a parse failure.
///
/// Values are accepted as-is here. Range enforcement happens when the
/// delta is applied, so a wildly out-of-range `hp_change` is legal input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDelta {
    #[serde(default)]
    pub hp_change: i32,

    #[serde(default)]
    pub bond_change: i32,

    /// Per-attribute shifts, keyed by trait name (e.g. "courage").
    #[serde(default)]
    pub attribute_changes: BTreeMap<String, i32>,

    /// Item gained this turn, verbatim. `None`, or a sentinel string the
    /// applicator filters out, means no item.
    #[serde(default)]
    pub new_item: Option<String>,

    /// One-line illustration prompt derived from the narrative.
    #[serde(default)]
    pub image_prompt: Option<String>,
}

impl TurnDelta {
    pub fn is_empty(&self) -> bool {
        self.hp_change == 0
            && self.bond_change == 0
            && self.attribute_changes.is_empty()
            && self.new_item.is_none()
            && self.image_prompt.is_none()
    }
}
