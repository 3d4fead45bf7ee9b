use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::model::{AnswerKey, ChoiceLetter};

static ANSWER_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([0-9]+)\.\s+([A-D])").unwrap_or_else(|e| panic!("Invalid answer key regex: {e}")));

/// Read every `N. X` pair off the answer-key page. Tabular keys put several
/// pairs on one line; a number seen twice keeps its last letter.
pub fn extract_answer_key(text: &str) -> AnswerKey {
    let mut key = AnswerKey::new();
    for line in text.lines() {
        for caps in ANSWER_ENTRY.captures_iter(line) {
            let Ok(number) = caps[1].parse::<u32>() else {
                continue;
            };
            if let Some(letter) = caps[2].chars().next().and_then(ChoiceLetter::from_char) {
                key.insert(number, letter);
            }
        }
    }
    key
}
