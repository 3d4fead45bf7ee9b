use once_cell::sync::Lazy;
use regex::Regex;

static QUESTION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([0-9]+)\.\s+").unwrap_or_else(|e| panic!("Invalid question marker regex: {e}"))
});

/// Raw text of one question, marker already removed.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBlock {
    pub number: u32,
    pub body: String,
    pub page_number: usize,
    pub has_images: bool,
}

/// Cut column text into one block per `N.` marker line. Text before the
/// first marker belongs to no question and is dropped.
pub fn split_question_blocks(text: &str, page_number: usize, has_images: bool) -> Vec<QuestionBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(u32, Vec<&str>)> = None;

    for line in text.split('\n') {
        let marker = QUESTION_MARKER
            .captures(line)
            .and_then(|caps| Some((caps.get(0)?.end(), caps[1].parse::<u32>().ok()?)));

        if let Some((marker_end, number)) = marker {
            if let Some((prev, lines)) = current.take() {
                blocks.push(make_block(prev, &lines, page_number, has_images));
            }
            current = Some((number, vec![&line[marker_end..]]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }

    if let Some((number, lines)) = current {
        blocks.push(make_block(number, &lines, page_number, has_images));
    }
    blocks
}

fn make_block(number: u32, lines: &[&str], page_number: usize, has_images: bool) -> QuestionBlock {
    QuestionBlock {
        number,
        body: lines.join("\n"),
        page_number,
        has_images,
    }
}
