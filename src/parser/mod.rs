//! Text pass: positioned words in, numbered questions and review issues out.
//!
//! Each page is handled on its own by [`ExamParser::parse_page`]; the
//! document-level [`ExamParser::parse`] only adds the answer key, ordering,
//! duplicate detection and the answer cross-check on top.

pub mod answer_key;
pub mod blocks;
pub mod choices;
pub mod columns;
pub mod matcher;
pub mod normalize;

pub use answer_key::extract_answer_key;
pub use blocks::{split_question_blocks, QuestionBlock};
pub use choices::{extract_choices, ExtractedChoices};
pub use columns::{segment_columns, ColumnText, FooterFilter};
pub use matcher::match_answers;

use tracing::{debug, info, warn};

use crate::core::confidence::score_confidence;
use crate::core::config::ParserConfig;
use crate::core::error::{ConfigError, LayoutError};
use crate::core::model::{ExamResult, ExamType, IssueKind, ParsingIssue, Question};
use crate::layout::{LayoutSource, PageLayout};

/// Questions and issues found on a single page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageParse {
    pub questions: Vec<Question>,
    pub issues: Vec<ParsingIssue>,
}

#[derive(Debug)]
pub struct ExamParser {
    config: ParserConfig,
    exam_year: u32,
    exam_type: ExamType,
    footers: FooterFilter,
}

impl ExamParser {
    pub fn new(config: &ParserConfig, exam_year: u32, exam_type: ExamType) -> Result<Self, ConfigError> {
        let footers = FooterFilter::new(&config.footer_patterns, exam_year)?;
        Ok(Self {
            config: config.clone(),
            exam_year,
            exam_type,
            footers,
        })
    }

    pub fn parse(&self, layout: &dyn LayoutSource) -> Result<ExamResult, LayoutError> {
        let page_count = layout.page_count();
        if page_count < 2 {
            warn!("{} {} exam has {page_count} page(s), nothing to parse", self.exam_year, self.exam_type);
            let issue = ParsingIssue::review(
                IssueKind::Document,
                None,
                format!("Document has {page_count} page(s); expected question pages and an answer key page"),
            );
            return Ok(ExamResult::new(self.exam_year, self.exam_type, Vec::new(), vec![issue]));
        }

        let key_text = layout.page(page_count)?.text(self.config.line_y_tolerance);
        let key = extract_answer_key(&key_text);
        info!("found {} answers in key", key.len());
        if key.is_empty() {
            warn!("answer key page {page_count} yielded no entries");
        }

        let mut questions = Vec::new();
        let mut issues = Vec::new();
        for page_number in (self.config.skip_leading_pages + 1)..page_count {
            let page = layout.page(page_number)?;
            let parsed = self.parse_page(page);
            debug!("page {page_number}: {} questions", parsed.questions.len());
            questions.extend(parsed.questions);
            issues.extend(parsed.issues);
        }

        let (questions, duplicate_issues) = dedupe_questions(questions);
        issues.extend(duplicate_issues);

        let (questions, match_issues) = match_answers(questions, &key);
        issues.extend(match_issues);

        info!(
            "parsed {} questions with {} issues from {} {} exam",
            questions.len(),
            issues.len(),
            self.exam_year,
            self.exam_type
        );
        Ok(ExamResult::new(self.exam_year, self.exam_type, questions, issues))
    }

    pub fn parse_page(&self, page: &PageLayout) -> PageParse {
        let mut out = PageParse::default();

        for column in segment_columns(page, &self.footers, self.config.line_y_tolerance) {
            let text = normalize::clean_scientific_notation(&column.text);
            let text = normalize::merge_subscript_lines(&text, &self.config);

            for block in split_question_blocks(&text, page.page_number, column.has_images) {
                let (question, issue) = self.build_question(block);
                out.questions.push(question);
                out.issues.extend(issue);
            }
        }

        out
    }

    fn build_question(&self, block: QuestionBlock) -> (Question, Option<ParsingIssue>) {
        let ExtractedChoices { stem, choices } = extract_choices(&block.body);
        let confidence = score_confidence(&stem, &choices, block.has_images, &self.config);
        debug!(
            "Q{} on page {}: {} choices, {confidence}",
            block.number,
            block.page_number,
            choices.len()
        );

        let issue = match choices.len() {
            4 => None,
            0 => Some(ParsingIssue::review(
                IssueKind::NoChoices,
                Some(block.number),
                "No choices could be extracted",
            )),
            n => Some(ParsingIssue::review(
                IssueKind::ChoiceCount,
                Some(block.number),
                format!("Found {n} choices instead of 4"),
            )),
        };

        let question = Question {
            number: block.number,
            text: stem,
            choices,
            correct_answer: String::new(),
            page_number: block.page_number,
            has_images: block.has_images,
            parsing_confidence: confidence,
            image_path: None,
        };
        (question, issue)
    }
}

/// Sort by number and keep the first occurrence of each.
fn dedupe_questions(mut questions: Vec<Question>) -> (Vec<Question>, Vec<ParsingIssue>) {
    questions.sort_by_key(|q| q.number);

    let mut kept: Vec<Question> = Vec::with_capacity(questions.len());
    let mut issues = Vec::new();
    for question in questions {
        let kept_page = kept
            .last()
            .filter(|prev| prev.number == question.number)
            .map(|prev| prev.page_number);
        match kept_page {
            Some(kept_page) => issues.push(ParsingIssue::review(
                IssueKind::Duplicate,
                Some(question.number),
                format!(
                    "Question {} appears more than once; kept the copy from page {kept_page}, dropped the one from page {}",
                    question.number, question.page_number
                ),
            )),
            None => kept.push(question),
        }
    }
    (kept, issues)
}
