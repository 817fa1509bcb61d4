use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replies sent per author handle, mention path only. Counts never decrease.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InteractionHistory {
    counts: BTreeMap<String, u32>,
}

impl InteractionHistory {
    pub fn count(&self, handle: &str) -> u32 {
        self.counts.get(handle).copied().unwrap_or(0)
    }

    /// One-reply-per-author policy. Returns true and records the reply when the
    /// author has never been answered; returns false and leaves counts alone otherwise.
    pub fn admit(&mut self, handle: &str) -> bool {
        if self.count(handle) >= 1 {
            return false;
        }
        *self.counts.entry(handle.to_owned()).or_insert(0) += 1;
        true
    }

    /// Number of authors ever answered.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_contact_admitted_once() {
        let mut h = InteractionHistory::default();
        assert!(h.admit("sam"));
        assert!(!h.admit("sam"));
        assert!(!h.admit("sam"));
        assert_eq!(h.count("sam"), 1);
    }

    #[test]
    fn authors_are_independent() {
        let mut h = InteractionHistory::default();
        assert!(h.admit("sam"));
        assert!(h.admit("alex"));
        assert_eq!(h.len(), 2);
        assert_eq!(h.count("nobody"), 0);
    }

    #[test]
    fn legacy_counts_above_one_stay_blocked() {
        let mut h: InteractionHistory = serde_json::from_str(r#"{"sam": 3}"#).unwrap();
        assert!(!h.admit("sam"));
        assert_eq!(h.count("sam"), 3);
    }

    #[test]
    fn serializes_as_plain_map() {
        let mut h = InteractionHistory::default();
        h.admit("sam");
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"{"sam":1}"#);
    }
}
