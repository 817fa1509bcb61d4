//! Per-post decision pipeline shared by the search and mention phases:
//! detection → inference → selection → appropriateness.

pub mod detector;
pub mod filter;
pub mod inferrer;
pub mod selector;

use crate::types::{Correction, Post, SkipReason};
use filter::Blacklist;
use selector::CorrectionSelector;

/// Text prefix that marks a retweet.
pub const RETWEET_MARKER: &str = "RT";

pub fn is_retweet(post: &Post) -> bool {
    post.retweet || post.text.starts_with(RETWEET_MARKER)
}

#[derive(Debug)]
pub struct Pipeline {
    selector: CorrectionSelector,
    blacklist: Blacklist,
}

impl Pipeline {
    pub fn new(selector: CorrectionSelector, blacklist: Blacklist) -> Self {
        Self {
            selector,
            blacklist,
        }
    }

    /// Decide which correction `post` gets, or why it gets none.
    /// Has no side effects beyond advancing the selector's random source.
    pub fn decide(&mut self, post: &Post) -> Result<Correction, SkipReason> {
        let detection = detector::detect(&post.text).ok_or(SkipReason::NoTargetWord)?;
        let inferred = inferrer::infer(detection, &post.text);
        let correction = self.selector.select(inferred);
        tracing::debug!(
            post_id = post.id,
            word = %detection.word,
            inferred = ?inferred,
            %correction,
            "correction selected"
        );
        filter::check(post, &self.blacklist)?;
        Ok(correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selector::ScriptedDice;

    fn pipeline(units: &[f64], draws: &[u32]) -> Pipeline {
        let dice = ScriptedDice::new(units.to_vec(), draws.to_vec());
        Pipeline::new(
            CorrectionSelector::new(0.8, Box::new(dice)),
            Blacklist::new(["spoiler"]),
        )
    }

    #[test]
    fn confirms_inferred_contraction() {
        let mut p = pipeline(&[0.1], &[]);
        let post = Post::new(1, "sam", "your a legend");
        assert_eq!(p.decide(&post), Ok(Correction::YouRe));
    }

    #[test]
    fn trolls_when_unknown() {
        let mut p = pipeline(&[], &[199]);
        let post = Post::new(1, "sam", "mind your own business");
        assert_eq!(p.decide(&post), Ok(Correction::Yore));
    }

    #[test]
    fn no_word_short_circuits() {
        let mut p = pipeline(&[], &[]);
        let post = Post::new(1, "sam", "nothing here");
        assert_eq!(p.decide(&post), Err(SkipReason::NoTargetWord));
    }

    #[test]
    fn blacklisted_post_never_yields_correction() {
        let mut p = pipeline(&[0.1], &[]);
        let post = Post::new(1, "sam", "youre spoiler");
        assert!(matches!(p.decide(&post), Err(SkipReason::Blacklisted { .. })));
    }

    #[test]
    fn retweet_detection() {
        assert!(is_retweet(&Post::new(1, "a", "RT @b: your a star")));
        assert!(!is_retweet(&Post::new(1, "a", "your a star RT")));
        let mut flagged = Post::new(1, "a", "your a star");
        flagged.retweet = true;
        assert!(is_retweet(&flagged));
    }
}
