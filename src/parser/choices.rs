use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::model::{ChoiceLetter, Choices};
use crate::parser::normalize::superscript_rate_law_exponents;

static CHOICE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([A-D])\)").unwrap_or_else(|e| panic!("Invalid choice marker regex: {e}")));

static LINE_CHOICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(([A-D])\)\s*(.+)").unwrap_or_else(|e| panic!("Invalid choice line regex: {e}")));

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedChoices {
    pub stem: String,
    pub choices: Choices,
}

/// Separate a question body into its stem and lettered choices.
///
/// Every line before the first `(A)`..`(D)` marker is stem. From that line on,
/// every non-blank line belongs to the choices, so a choice that wraps onto a
/// second line keeps its continuation.
pub fn extract_choices(body: &str) -> ExtractedChoices {
    let mut stem_lines = Vec::new();
    let mut choice_lines = Vec::new();
    let mut in_choices = false;

    for line in body.split('\n') {
        if CHOICE_MARKER.is_match(line) {
            in_choices = true;
            choice_lines.push(line);
        } else if !in_choices {
            stem_lines.push(line);
        } else if !line.trim().is_empty() {
            choice_lines.push(line);
        }
    }

    let stem = stem_lines.join("\n").trim().to_string();
    let choice_text = superscript_rate_law_exponents(&choice_lines.join("\n"));

    let mut choices = split_on_markers(&choice_text);
    if choices.is_empty() {
        choices = per_line_choices(&choice_lines);
    }

    ExtractedChoices { stem, choices }
}

/// Each marker owns the text up to the next marker or the end of the text.
fn split_on_markers(text: &str) -> Choices {
    let markers: Vec<(ChoiceLetter, usize, usize)> = CHOICE_MARKER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let letter = caps[1].chars().next().and_then(ChoiceLetter::from_char)?;
            Some((letter, whole.start(), whole.end()))
        })
        .collect();

    let mut choices = Choices::new();
    for (idx, &(letter, _, content_start)) in markers.iter().enumerate() {
        let content_end = markers.get(idx + 1).map_or(text.len(), |&(_, start, _)| start);
        let content = text[content_start..content_end]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        choices.set(letter, content);
    }
    choices
}

fn per_line_choices(lines: &[&str]) -> Choices {
    let mut choices = Choices::new();
    for line in lines {
        let Some(caps) = LINE_CHOICE.captures(line) else {
            continue;
        };
        if let Some(letter) = caps[1].chars().next().and_then(ChoiceLetter::from_char) {
            choices.set(letter, caps[2].trim());
        }
    }
    choices
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_stem_and_four_choices() {
        let body = "Which gas is the most dense at STP?\n(A) He (B) Ne\n(C) Ar (D) Kr";
        let extracted = extract_choices(body);
        assert_eq!(extracted.stem, "Which gas is the most dense at STP?");
        assert_eq!(extracted.choices.len(), 4);
        assert_eq!(extracted.choices.get(ChoiceLetter::A), Some("He"));
        assert_eq!(extracted.choices.get(ChoiceLetter::D), Some("Kr"));
    }

    #[test]
    fn wrapped_choice_keeps_continuation_line() {
        let body = "Stem line one\nstem line two\n(A) a long answer that\nwraps onto the next line\n(B) b\n(C) c\n(D) d";
        let extracted = extract_choices(body);
        assert_eq!(extracted.stem, "Stem line one\nstem line two");
        assert_eq!(
            extracted.choices.get(ChoiceLetter::A),
            Some("a long answer that wraps onto the next line")
        );
    }

    #[test]
    fn choices_may_contain_parentheses() {
        let body = "Which is a strong acid?\n(A) HCl(aq) (B) HF(aq)\n(C) CH3COOH(aq) (D) H2O(l)";
        let extracted = extract_choices(body);
        assert_eq!(extracted.choices.get(ChoiceLetter::A), Some("HCl(aq)"));
        assert_eq!(extracted.choices.get(ChoiceLetter::D), Some("H2O(l)"));
    }

    #[test]
    fn rate_law_exponents_in_choices() {
        let body = "What is the rate law?\n(A) k[A] (B) k[A]2\n(C) k[A][B] (D) k[B]2";
        let extracted = extract_choices(body);
        assert_eq!(extracted.choices.get(ChoiceLetter::B), Some("k[A]²"));
        assert_eq!(extracted.choices.get(ChoiceLetter::D), Some("k[B]²"));
    }

    #[test]
    fn missing_markers_leave_choices_empty() {
        let extracted = extract_choices("A question whose choices are a figure");
        assert!(extracted.choices.is_empty());
        assert_eq!(extracted.stem, "A question whose choices are a figure");
    }

    #[test]
    fn blank_marker_content_is_kept_as_empty() {
        let extracted = extract_choices("Pick one\n(A) (B) two (C) three (D) four");
        assert_eq!(extracted.choices.len(), 4);
        assert_eq!(extracted.choices.get(ChoiceLetter::A), Some(""));
    }

    #[test]
    fn per_line_fallback_reads_marker_lines() {
        let choices = per_line_choices(&["(A) first", "(B)  second ", "not a choice"]);
        assert_eq!(choices.len(), 2);
        assert_eq!(choices.get(ChoiceLetter::B), Some("second"));
    }
}
