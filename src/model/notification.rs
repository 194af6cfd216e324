use std::fmt;

use serde::{Deserialize, Serialize};

/// Transient per-delta notifications for the presentation layer. Purely
/// informational; they are not part of game state and are not replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    HealthChanged { delta: i32 },
    BondChanged { delta: i32 },
    AttributeChanged { name: String, delta: i32 },
    ItemAcquired { item: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::HealthChanged { delta } if *delta < 0 => {
                write!(f, "Health lost: {}", -delta)
            }
            Notification::HealthChanged { delta } => write!(f, "Health gained: {delta}"),
            Notification::BondChanged { delta } if *delta < 0 => {
                write!(f, "Bond weakened: {}", -delta)
            }
            Notification::BondChanged { delta } => write!(f, "Bond deepened: {delta}"),
            Notification::AttributeChanged { name, delta } => {
                write!(f, "{name} {delta:+}")
            }
            Notification::ItemAcquired { item } => write!(f, "Item acquired: {item}"),
        }
    }
}
