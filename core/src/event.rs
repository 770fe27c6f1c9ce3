//! Messages the simulation feed emits to its consumer.

use crate::entity::Entity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    /// The first full population after activation. Exactly one per activation.
    Snapshot,
    /// The full population after one tick of motion.
    Update,
}

impl FeedKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Snapshot => "snapshot",
            Self::Update => "update",
        }
    }
}

/// `{ "kind": "snapshot" | "update", "population": [...] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedMessage {
    pub kind: FeedKind,
    pub population: Vec<Entity>,
}
