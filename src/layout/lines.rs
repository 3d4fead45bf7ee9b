use crate::layout::Word;

/// Rebuild plain text from positioned words: words whose tops lie within
/// `y_tolerance` of the previous word's top share a line, lines run top to
/// bottom and words left to right.
pub fn words_to_text<'a>(words: impl IntoIterator<Item = &'a Word>, y_tolerance: f32) -> String {
    cluster_lines(words, y_tolerance)
        .iter()
        .map(|line| {
            line.iter()
                .map(|word| word.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn cluster_lines<'a>(words: impl IntoIterator<Item = &'a Word>, y_tolerance: f32) -> Vec<Vec<&'a Word>> {
    let mut sorted: Vec<&Word> = words.into_iter().collect();
    sorted.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));

    let mut lines: Vec<Vec<&Word>> = Vec::new();
    let mut last_top: Option<f32> = None;
    for word in sorted {
        let continues = last_top.is_some_and(|top| word.bbox.y0 - top <= y_tolerance);
        last_top = Some(word.bbox.y0);
        if continues {
            if let Some(line) = lines.last_mut() {
                line.push(word);
                continue;
            }
        }
        lines.push(vec![word]);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lowered_subscripts_form_their_own_line() {
        let words = vec![
            Word::new("O", 70.0, 100.0, 78.0, 110.0),
            Word::new("H", 60.0, 100.0, 67.0, 110.0),
            Word::new("2", 67.0, 104.5, 71.0, 112.0),
            Word::new("Next", 60.0, 120.0, 90.0, 130.0),
        ];
        assert_eq!(words_to_text(&words, 3.0), "H O\n2\nNext");
    }

    #[test]
    fn jittered_baseline_stays_on_one_line() {
        let words = vec![
            Word::new("b", 20.0, 101.5, 28.0, 111.0),
            Word::new("a", 10.0, 100.0, 18.0, 110.0),
            Word::new("c", 30.0, 103.0, 38.0, 113.0),
        ];
        assert_eq!(words_to_text(&words, 3.0), "a b c");
    }

    #[test]
    fn no_words_no_text() {
        assert_eq!(words_to_text(&Vec::<Word>::new(), 3.0), "");
    }
}
