use std::collections::BTreeSet;

use crate::core::model::{AnswerKey, IssueKind, ParsingIssue, Question};

/// Fill in correct answers from the key and report mismatches in both
/// directions: questions the key does not cover, and key entries with no
/// parsed question.
pub fn match_answers(questions: Vec<Question>, key: &AnswerKey) -> (Vec<Question>, Vec<ParsingIssue>) {
    let mut issues = Vec::new();
    let parsed: BTreeSet<u32> = questions.iter().map(|q| q.number).collect();

    let questions = questions
        .into_iter()
        .map(|mut question| {
            match key.get(question.number) {
                Some(letter) => question.correct_answer = letter.to_string(),
                None => issues.push(ParsingIssue::review(
                    IssueKind::MissingAnswer,
                    Some(question.number),
                    "No answer found in answer key",
                )),
            }
            question
        })
        .collect();

    for number in key.numbers().filter(|n| !parsed.contains(n)) {
        issues.push(ParsingIssue::review(
            IssueKind::OrphanAnswer,
            Some(number),
            format!("Answer key has entry for Q{number} but question not parsed"),
        ));
    }

    (questions, issues)
}
