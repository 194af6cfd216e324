use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How many custom worlds a session may define (free tier).
pub const CUSTOM_WORLD_QUOTA: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub start: i32,
}

/// A playable world. Built-in scenarios and user-authored ones share this
/// shape; the flags decide which tracks the session maintains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDef {
    pub key: String,
    pub title: String,
    pub description: String,

    /// Whether the companion bond meter exists in this world. Bond
    /// extremes end the session, so bond-less worlds only end by death
    /// or by the turn cap.
    pub tracks_bond: bool,

    /// Trait meters seeded at session start, each clamped to [0,100].
    pub attributes: Vec<AttributeDef>,

    /// Forced ending fires once this many turns have resolved.
    pub turn_cap: u32,
}

impl ScenarioDef {
    fn custom(key: &str, description: &str) -> Self {
        Self {
            key: key.to_string(),
            title: key.to_string(),
            description: description.to_string(),
            tracks_bond: true,
            attributes: Vec::new(),
            turn_cap: 15,
        }
    }
}

pub fn builtin_scenarios() -> Vec<ScenarioDef> {
    vec![
        ScenarioDef {
            key: "supermarket".into(),
            title: "Zombie-besieged Supermarket".into(),
            description: "A suburban supermarket at dusk, shelves half looted, \
                          the dead pressing against the glass doors."
                .into(),
            tracks_bond: true,
            attributes: Vec::new(),
            turn_cap: 15,
        },
        ScenarioDef {
            key: "titanic".into(),
            title: "Midnight on the Titanic".into(),
            description: "The great liner two hours from the ice, ballrooms \
                          blazing, the sea black and patient below."
                .into(),
            tracks_bond: true,
            attributes: Vec::new(),
            turn_cap: 15,
        },
        ScenarioDef {
            key: "beast_tide".into(),
            title: "Beast Tide of the Cultivation World".into(),
            description: "A mountain sect's outer wall, horizon dark with \
                          spirit beasts, talismans running low."
                .into(),
            tracks_bond: true,
            attributes: Vec::new(),
            turn_cap: 15,
        },
        ScenarioDef {
            key: "neon_city".into(),
            title: "Cyberpunk Sleepless City".into(),
            description: "Rain-slick arcology streets, corporate hit squads, \
                          and a debt that comes due at dawn."
                .into(),
            tracks_bond: true,
            attributes: Vec::new(),
            turn_cap: 15,
        },
        ScenarioDef {
            key: "soul_trial".into(),
            title: "Trial of the Soul".into(),
            description: "A mirrored void that weighs what you are, not what \
                          you carry. Every choice tilts the scales."
                .into(),
            tracks_bond: false,
            attributes: vec![
                AttributeDef { name: "courage".into(), start: 50 },
                AttributeDef { name: "wisdom".into(), start: 50 },
                AttributeDef { name: "coldness".into(), start: 50 },
            ],
            turn_cap: 10,
        },
    ]
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("custom world quota exhausted ({limit} per session)")]
    QuotaExhausted { limit: u32 },

    #[error("world name must not be empty")]
    EmptyName,

    #[error("world description must not be empty")]
    EmptyDescription,
}

/// Built-in scenario table plus the session's user-authored worlds.
#[derive(Debug, Clone)]
pub struct WorldLibrary {
    builtin: Vec<ScenarioDef>,
    custom: BTreeMap<String, String>,
    quota: u32,
}

impl Default for WorldLibrary {
    fn default() -> Self {
        Self {
            builtin: builtin_scenarios(),
            custom: BTreeMap::new(),
            quota: CUSTOM_WORLD_QUOTA,
        }
    }
}

impl WorldLibrary {
    /// Register a user-authored world. Quota is only spent on success;
    /// redefining an existing name overwrites it without spending quota.
    pub fn define(&mut self, name: &str, description: &str) -> Result<(), WorldError> {
        let name = name.trim();
        let description = description.trim();
        if name.is_empty() {
            return Err(WorldError::EmptyName);
        }
        if description.is_empty() {
            return Err(WorldError::EmptyDescription);
        }
        if !self.custom.contains_key(name) {
            if self.quota == 0 {
                return Err(WorldError::QuotaExhausted {
                    limit: CUSTOM_WORLD_QUOTA,
                });
            }
            self.quota -= 1;
        }
        self.custom.insert(name.to_string(), description.to_string());
        Ok(())
    }

    pub fn resolve(&self, key: &str) -> Option<ScenarioDef> {
        if let Some(builtin) = self.builtin.iter().find(|s| s.key == key) {
            return Some(builtin.clone());
        }
        self.custom
            .get(key)
            .map(|description| ScenarioDef::custom(key, description))
    }

    pub fn remaining_quota(&self) -> u32 {
        self.quota
    }

    pub fn builtin(&self) -> &[ScenarioDef] {
        &self.builtin
    }

    pub fn custom_names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }
}
