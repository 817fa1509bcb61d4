use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookmark for resumable scheduling: last mention handled and when the last cycle ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleCursor {
    /// 0 means no mention has been processed yet.
    #[serde(default)]
    pub last_mention_id: u64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl CycleCursor {
    /// Exclusive lower bound for the next mentions fetch.
    pub fn since_id(&self) -> Option<u64> {
        (self.last_mention_id > 0).then_some(self.last_mention_id)
    }

    /// Record a mention as handled. Keeps the id of the last mention iterated,
    /// not the largest one seen.
    pub fn advance_to(&mut self, mention_id: u64) {
        self.last_mention_id = mention_id;
    }

    pub fn mark_cycle(&mut self, now: DateTime<Utc>) {
        self.last_cycle_at = Some(now);
    }
}
