use serde::{Deserialize, Serialize};
use std::fmt;

pub use pedant_platform::client::{Author, Post};

// ── Word types ──────────────────────────────────────────────────

/// Surface forms the bot hunts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetWord {
    /// `your`
    Your,
    /// `youre`
    Youre,
    /// `you're`
    YouRe,
}

impl TargetWord {
    /// Order used to build the search query.
    pub const SEARCH_ORDER: [TargetWord; 3] = [Self::Your, Self::Youre, Self::YouRe];

    /// Detection priority: the first form found wins.
    /// `youre` contains `your`, so the longer forms must be tried first.
    pub const DETECT_ORDER: [TargetWord; 3] = [Self::YouRe, Self::Youre, Self::Your];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Your => "your",
            Self::Youre => "youre",
            Self::YouRe => "you're",
        }
    }

    /// Platform search query: every target form, space separated.
    pub fn search_query() -> String {
        Self::SEARCH_ORDER
            .iter()
            .map(|w| w.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for TargetWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A target word located in a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub word: TargetWord,
    /// Byte offset of the first occurrence.
    pub offset: usize,
}

/// Correction vocabulary. Variant order is the iteration order used for the
/// cumulative troll buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Correction {
    Your,
    YouRe,
    Yore,
    Yer,
}

impl Correction {
    pub const ALL: [Correction; 4] = [Self::Your, Self::YouRe, Self::Yore, Self::Yer];

    /// Share of the troll draw space owned by this word.
    pub fn weight(self) -> u32 {
        match self {
            Self::Your | Self::YouRe => 99,
            Self::Yore | Self::Yer => 1,
        }
    }

    /// Size of the troll draw space: `[0, 201)`.
    pub fn draw_space() -> u32 {
        Self::ALL.iter().map(|c| c.weight()).sum::<u32>() + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Your => "your",
            Self::YouRe => "you're",
            Self::Yore => "yore",
            Self::Yer => "yer",
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Decision types ──────────────────────────────────────────────

/// Which fetch a post came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Search,
    Mentions,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Search => write!(f, "search"),
            Phase::Mentions => write!(f, "mentions"),
        }
    }
}

/// Why a post was dropped without a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Retweet,
    NoTargetWord,
    Sensitive,
    Blacklisted { field: &'static str, term: String },
    AlreadyContacted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Retweet => write!(f, "retweet"),
            SkipReason::NoTargetWord => write!(f, "no target word"),
            SkipReason::Sensitive => write!(f, "flagged sensitive"),
            SkipReason::Blacklisted { field, term } => {
                write!(f, "blacklisted term {term:?} in {field}")
            }
            SkipReason::AlreadyContacted => write!(f, "author already contacted"),
        }
    }
}

/// A reply the bot decided to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyAction {
    pub in_reply_to: u64,
    pub handle: String,
    pub correction: Correction,
}

impl ReplyAction {
    /// Reply body: `@<handle> *<correction>`.
    pub fn status(&self) -> String {
        format!("@{} *{}", self.handle, self.correction)
    }
}

/// Per-phase tallies for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub fetched: usize,
    pub skipped: usize,
    pub replied: usize,
    pub reply_failures: usize,
    pub fetch_failed: bool,
}

/// Outcome of one full cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub search: PhaseReport,
    pub mentions: PhaseReport,
    pub persisted: bool,
}

impl CycleReport {
    pub fn replies_sent(&self) -> usize {
        self.search.replied + self.mentions.replied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_query_joins_forms() {
        assert_eq!(TargetWord::search_query(), "your youre you're");
    }

    #[test]
    fn draw_space_is_201() {
        assert_eq!(Correction::draw_space(), 201);
    }

    #[test]
    fn reply_status_format() {
        let action = ReplyAction {
            in_reply_to: 3,
            handle: "sam".into(),
            correction: Correction::YouRe,
        };
        assert_eq!(action.status(), "@sam *you're");
    }
}
