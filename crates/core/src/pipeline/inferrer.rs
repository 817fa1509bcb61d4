use crate::types::{Correction, Detection, TargetWord};

/// Text that, right after a possessive `your`, means the writer wanted `you're`.
const CONTRACTION_CUES: [&str; 4] = [" a ", " an ", " my ", " the "];

/// Infer what the writer meant, or `None` when the heuristics can't tell.
pub fn infer(detection: Detection, text: &str) -> Option<Correction> {
    match detection.word {
        TargetWord::Your => {
            let rest = text.get(detection.offset + detection.word.as_str().len()..)?;
            CONTRACTION_CUES
                .iter()
                .any(|cue| rest.starts_with(cue))
                .then_some(Correction::YouRe)
        }
        // plain misspelling
        TargetWord::Youre => Some(Correction::YouRe),
        TargetWord::YouRe => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::detector::detect;

    fn run(text: &str) -> Option<Correction> {
        infer(detect(text).unwrap(), text)
    }

    #[test]
    fn your_followed_by_cue_is_contraction() {
        assert_eq!(run("lol your a widget"), Some(Correction::YouRe));
        assert_eq!(run("your an idiot"), Some(Correction::YouRe));
        assert_eq!(run("your my hero"), Some(Correction::YouRe));
        assert_eq!(run("honestly your the best"), Some(Correction::YouRe));
    }

    #[test]
    fn your_without_cue_is_unknown() {
        assert_eq!(run("mind your own business"), None);
        assert_eq!(run("your"), None);
        // cue must include the trailing space
        assert_eq!(run("your a"), None);
        assert_eq!(run("your another one"), None);
    }

    #[test]
    fn youre_always_contraction() {
        assert_eq!(run("youre"), Some(Correction::YouRe));
        assert_eq!(run("youre own thing"), Some(Correction::YouRe));
    }

    #[test]
    fn contraction_is_unknown() {
        assert_eq!(run("you're a star"), None);
    }

    #[test]
    fn uses_given_offset() {
        let text = "your own your a thing";
        let at = |offset| Detection {
            word: TargetWord::Your,
            offset,
        };
        assert_eq!(infer(at(0), text), None);
        assert_eq!(infer(at(9), text), Some(Correction::YouRe));
    }

    #[test]
    fn out_of_range_offset_is_unknown() {
        let d = Detection {
            word: TargetWord::Your,
            offset: 40,
        };
        assert_eq!(infer(d, "short"), None);
    }
}
