//! Text rewrites applied to column text before it is cut into questions.
//!
//! Exam PDFs typeset exponents and chemical subscripts as raised or lowered
//! glyphs. Once flattened to text those glyphs either run into the mantissa
//! (`1.5 × 10-5`) or fall onto a line of their own beneath the formula
//! (`H O` followed by `2`). The functions here put them back.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::core::config::ParserConfig;

/// Glyph the exam font uses for the multiplication sign.
const PRIVATE_USE_TIMES: char = '\u{f0b4}';

static SCI_POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+\.?[0-9]*)\s*×\s*10([0-9]{2,})")
        .unwrap_or_else(|e| panic!("Invalid scientific notation regex: {e}"))
});

static SCI_NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]+\.?[0-9]*)\s*×\s*10[–\-]([0-9]+)")
        .unwrap_or_else(|e| panic!("Invalid negative exponent regex: {e}"))
});

static RATE_LAW_EXPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\]([1-9])").unwrap_or_else(|e| panic!("Invalid rate law regex: {e}")));

static FORMULA_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z][a-z]?)\s").unwrap_or_else(|e| panic!("Invalid element regex: {e}")));

static BRACKETED_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([A-Z][a-z]?)\s*\]").unwrap_or_else(|e| panic!("Invalid bracketed element regex: {e}"))
});

static PAREN_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^)]*[A-Z][a-z]?\s*\)").unwrap_or_else(|e| panic!("Invalid parenthesised group regex: {e}"))
});

pub fn superscript(c: char) -> char {
    match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '-' => '⁻',
        other => other,
    }
}

pub fn subscript(c: char) -> char {
    match c {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        other => other,
    }
}

fn to_superscript(s: &str) -> String {
    s.chars().map(superscript).collect()
}

fn to_subscript(s: &str) -> String {
    s.chars().map(subscript).collect()
}

/// Rewrite `a × 10NN` and `a × 10-N` so the exponent is set in superscript
/// digits.
pub fn clean_scientific_notation(text: &str) -> String {
    let text = text.replace(PRIVATE_USE_TIMES, "×");

    let text = SCI_POSITIVE.replace_all(&text, |caps: &Captures| {
        let exponent = &caps[2];
        // "10" repeated in front of the exponent is a doubled token.
        let exponent = if exponent.len() >= 3 && exponent.starts_with("10") {
            &exponent[2..]
        } else {
            &exponent[exponent.len() - 2..]
        };
        format!("{} × 10{}", &caps[1], to_superscript(exponent))
    });

    SCI_NEGATIVE
        .replace_all(&text, |caps: &Captures| {
            format!("{} × 10⁻{}", &caps[1], to_superscript(&caps[2]))
        })
        .into_owned()
}

/// `[A]2` becomes `[A]²` in rate-law expressions.
pub fn superscript_rate_law_exponents(text: &str) -> String {
    RATE_LAW_EXPONENT
        .replace_all(text, |caps: &Captures| format!("]{}", to_superscript(&caps[1])))
        .into_owned()
}

/// Fold digit-only lines back into the formula line above them.
pub fn merge_subscript_lines(text: &str, config: &ParserConfig) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut merged: Vec<String> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if let Some(next) = lines.get(i + 1) {
            let current = line.trim_end();
            let next = next.trim();
            if is_subscript_line(next, current, config) {
                merged.push(merge_with_subscripts(current, next, config));
                i += 2;
                continue;
            }
        }
        merged.push(line.trim_end().to_string());
        i += 1;
    }

    merged.join("\n")
}

fn is_subscript_line(line: &str, prev_line: &str, config: &ParserConfig) -> bool {
    if line.is_empty() || line.chars().count() >= config.subscript_max_len {
        return false;
    }
    if !line.chars().all(|c| c.is_ascii_digit() || c.is_whitespace()) {
        return false;
    }
    prev_line
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == ')' || c == ']')
}

fn merge_with_subscripts(line: &str, subscript_line: &str, config: &ParserConfig) -> String {
    let tokens: Vec<&str> = subscript_line.split_whitespace().collect();
    if tokens.is_empty() {
        return line.to_string();
    }

    let points = find_insertion_points(line, config);
    if points.len() != tokens.len() {
        let digits: String = subscript_line
            .chars()
            .filter(char::is_ascii_digit)
            .map(subscript)
            .collect();
        return format!("{line}{digits}");
    }

    let mut result = line.to_string();
    let mut offset = 0;
    for (pos, token) in points.into_iter().zip(tokens) {
        let sub = to_subscript(token);
        let at = pos + offset;
        if result.as_bytes().get(at) == Some(&b' ') {
            result.replace_range(at..at + 1, &sub);
            offset += sub.len() - 1;
        } else {
            result.insert_str(at, &sub);
            offset += sub.len();
        }
    }
    result
}

/// Byte offsets in `line` where a subscript belongs, ascending and unique.
fn find_insertion_points(line: &str, config: &ParserConfig) -> Vec<usize> {
    let bytes = line.as_bytes();

    // (start, end) of each element symbol followed by whitespace.
    let mut elements: Vec<(usize, usize)> = Vec::new();
    for caps in FORMULA_ELEMENT.captures_iter(line) {
        let Some(element) = caps.get(1) else {
            continue;
        };
        // "(A " is a choice label, not an element.
        if element.len() == 1 && element.start() > 0 && bytes[element.start() - 1] == b'(' {
            continue;
        }
        elements.push((element.start(), element.end()));
    }

    // Symbols split by the PDF ("N a Cl") sit close together; within such a
    // run only the last symbol goes without a point. The gap is in characters.
    let gap = config.element_run_gap;
    let close = |end: usize, next_start: usize| {
        line.get(end..next_start).map_or(0, |between| between.chars().count()) <= gap
    };
    let mut points = Vec::new();
    for (i, &(start, end)) in elements.iter().enumerate() {
        if elements.get(i + 1).is_some_and(|&(next_start, _)| close(end, next_start)) {
            points.push(end);
            continue;
        }
        if i > 0 && close(elements[i - 1].1, start) {
            continue;
        }
        points.push(end);
    }

    for caps in BRACKETED_ELEMENT.captures_iter(line) {
        if let Some(element) = caps.get(1) {
            points.push(element.end());
        }
    }

    for group in PAREN_GROUP.find_iter(line) {
        if is_choice_label(group.as_str()) {
            continue;
        }
        let followed_by_letter = line[group.end()..].chars().next().map(char::is_alphabetic);
        if followed_by_letter == Some(false) {
            points.push(group.end());
        }
    }

    points.sort_unstable();
    points.dedup();
    points
}

fn is_choice_label(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 3 && b[0] == b'(' && b[1].is_ascii_uppercase() && b[2] == b')'
}
