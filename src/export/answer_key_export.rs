use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::{AnswerKeyEntry, ExamResult};
use crate::export::Exporter;

/// Answer key list, one entry per question in number order.
#[derive(Debug, Clone)]
pub struct AnswerKeyExporter {
    path: PathBuf,
}

impl AnswerKeyExporter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Exporter for AnswerKeyExporter {
    fn export(&self, result: &ExamResult) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = self.path.clone();
        let entries: Vec<AnswerKeyEntry> = result
            .questions
            .iter()
            .map(|question| AnswerKeyEntry::from_question(result, question))
            .collect();
        let data = serde_json::to_string_pretty(&entries)?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Choices, Confidence, ExamType, Question};
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_one_entry_per_question() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let question = |number: u32, answer: &str, image: Option<&str>| Question {
            number,
            text: String::new(),
            choices: Choices::new(),
            correct_answer: answer.to_string(),
            page_number: 3,
            has_images: false,
            parsing_confidence: Confidence::High,
            image_path: image.map(String::from),
        };
        let result = ExamResult::new(
            2019,
            ExamType::National,
            vec![
                question(1, "C", Some("question_images/2019/national/q01.png")),
                question(2, "", None),
            ],
            vec![],
        );

        let path = AnswerKeyExporter::new(dir.path().join("national_answer_key.json")).export(&result)?;
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        assert_eq!(
            value,
            serde_json::json!([
                {
                    "exam_year": 2019,
                    "exam_type": "national",
                    "question_number": 1,
                    "answer": "C",
                    "image_path": "question_images/2019/national/q01.png"
                },
                {
                    "exam_year": 2019,
                    "exam_type": "national",
                    "question_number": 2,
                    "answer": "",
                    "image_path": ""
                }
            ])
        );
        Ok(())
    }
}
