use crate::types::{Detection, TargetWord};

/// Find the highest-priority target form in `text`.
///
/// Literal, case-sensitive substring search with no word-boundary check, so
/// "yourself" counts as `your`.
pub fn detect(text: &str) -> Option<Detection> {
    TargetWord::DETECT_ORDER.iter().find_map(|&word| {
        text.find(word.as_str())
            .map(|offset| Detection { word, offset })
    })
}
