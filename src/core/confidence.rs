use crate::core::config::ParserConfig;
use crate::core::model::{Choices, Confidence};

/// Reliability label for an extracted question. Rules are checked in order and
/// the first one that fires decides the label.
pub fn score_confidence(stem: &str, choices: &Choices, has_images: bool, config: &ParserConfig) -> Confidence {
    let stem_len = stem.chars().count();

    if has_images {
        return Confidence::Medium;
    }
    if choices.len() != 4 {
        return Confidence::Low;
    }
    if stem_len < config.stem_min_chars {
        return Confidence::Low;
    }
    if choices.iter().any(|(_, text)| text.is_empty()) {
        return Confidence::Low;
    }
    if stem_len > config.stem_max_chars {
        return Confidence::Medium;
    }
    Confidence::High
}
