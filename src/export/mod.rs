pub mod answer_key_export;
pub mod json_export;
pub mod report_export;

use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::ExamResult;

pub use answer_key_export::AnswerKeyExporter;
pub use json_export::{read_exam_result, JsonExporter};
pub use report_export::ReportExporter;

/// Writes one view of a parsed exam and returns the path written.
pub trait Exporter {
    fn export(&self, result: &ExamResult) -> Result<PathBuf>;
}
