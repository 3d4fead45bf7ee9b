use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::category::Category;
use crate::core::model::{Confidence, ExamResult};
use crate::export::Exporter;

/// Markdown review sheet for a parsed exam.
#[derive(Debug, Clone)]
pub struct ReportExporter {
    path: PathBuf,
}

impl ReportExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Exporter for ReportExporter {
    fn export(&self, result: &ExamResult) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = self.path.clone();
        fs::write(&path, render_report(result)?).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

pub fn render_report(result: &ExamResult) -> Result<String> {
    let mut md = String::new();
    let questions = &result.questions;
    let answered = questions.iter().filter(|q| !q.correct_answer.is_empty()).count();
    let with_images = questions.iter().filter(|q| q.has_images).count();
    let review = result.parsing_issues.iter().filter(|i| i.needs_manual_review).count();

    writeln!(md, "# {} {} Exam Parsing Report", result.exam_year, title_case(result.exam_type.as_str()))?;
    writeln!(md)?;
    writeln!(md, "## Summary")?;
    writeln!(md)?;
    writeln!(md, "- Total questions: {}", result.total_questions)?;
    writeln!(md, "- Answered: {answered}")?;
    writeln!(md, "- Unanswered: {}", questions.len() - answered)?;
    writeln!(md, "- With embedded images: {with_images}")?;
    writeln!(
        md,
        "- Issues: {} ({review} need manual review)",
        result.parsing_issues.len()
    )?;
    writeln!(md)?;

    writeln!(md, "## Confidence")?;
    writeln!(md)?;
    writeln!(md, "| Level | Questions |")?;
    writeln!(md, "| --- | --- |")?;
    for level in [Confidence::High, Confidence::Medium, Confidence::Low] {
        let count = questions.iter().filter(|q| q.parsing_confidence == level).count();
        writeln!(md, "| {level} | {count} |")?;
    }
    writeln!(md)?;

    writeln!(md, "## Questions by Category")?;
    writeln!(md)?;
    writeln!(md, "| Category | Range | Questions |")?;
    writeln!(md, "| --- | --- | --- |")?;
    for category in Category::ALL {
        let (first, last) = category.range();
        let count = questions
            .iter()
            .filter(|q| Category::for_question(q.number) == Some(category))
            .count();
        writeln!(md, "| {} | {first}-{last} | {count} |", category.title())?;
    }
    let uncategorized = questions
        .iter()
        .filter(|q| Category::for_question(q.number).is_none())
        .count();
    if uncategorized > 0 {
        writeln!(md, "| Uncategorized | - | {uncategorized} |")?;
    }
    writeln!(md)?;

    writeln!(md, "## Issues")?;
    writeln!(md)?;
    if result.parsing_issues.is_empty() {
        writeln!(md, "No issues detected")?;
    }
    for issue in &result.parsing_issues {
        let number = issue
            .question_number
            .map_or_else(|| "N/A".to_string(), |n| format!("Q{n}"));
        let flag = if issue.needs_manual_review { " (review)" } else { "" };
        writeln!(md, "- {number}: {}{flag}", issue.issue)?;
    }

    Ok(md)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
