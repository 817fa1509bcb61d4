//! Persistent bot state: who has been answered and where the schedule stands.

pub mod cursor;
pub mod history;
pub mod store;

use serde::{Deserialize, Serialize};

pub use cursor::CycleCursor;
pub use history::InteractionHistory;
pub use store::{JsonFileStore, MemoryStore, StateError, StateStore};

/// Everything that survives a restart. Owned by the runtime, flushed once per cycle.
///
/// On disk: `{"interactionsHistory": {...}, "lastMentionId": n, "lastCycleAt": ms}`.
/// Every key is optional, so `{}` is a valid empty state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotState {
    #[serde(default, rename = "interactionsHistory")]
    pub history: InteractionHistory,
    #[serde(flatten)]
    pub cursor: CycleCursor,
}
