use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Local,
    National,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Local => "local",
            ExamType::National => "national",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChoiceLetter {
    A,
    B,
    C,
    D,
}

impl ChoiceLetter {
    pub const ALL: [ChoiceLetter; 4] = [ChoiceLetter::A, ChoiceLetter::B, ChoiceLetter::C, ChoiceLetter::D];

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'A' => Some(ChoiceLetter::A),
            'B' => Some(ChoiceLetter::B),
            'C' => Some(ChoiceLetter::C),
            'D' => Some(ChoiceLetter::D),
            _ => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            ChoiceLetter::A => 'A',
            ChoiceLetter::B => 'B',
            ChoiceLetter::C => 'C',
            ChoiceLetter::D => 'D',
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ChoiceLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// The four lettered answer slots of a question. A slot is `None` when the
/// extractor never saw its marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, String>",
    try_from = "BTreeMap<String, String>"
)]
pub struct Choices {
    slots: [Option<String>; 4],
}

impl Choices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later writes to the same letter replace earlier ones.
    pub fn set(&mut self, letter: ChoiceLetter, text: impl Into<String>) {
        self.slots[letter.index()] = Some(text.into());
    }

    pub fn get(&self, letter: ChoiceLetter) -> Option<&str> {
        self.slots[letter.index()].as_deref()
    }

    pub fn contains(&self, letter: ChoiceLetter) -> bool {
        self.slots[letter.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChoiceLetter, &str)> {
        ChoiceLetter::ALL
            .into_iter()
            .filter_map(|letter| self.get(letter).map(|text| (letter, text)))
    }
}

impl From<Choices> for BTreeMap<String, String> {
    fn from(choices: Choices) -> Self {
        choices
            .iter()
            .map(|(letter, text)| (letter.to_string(), text.to_string()))
            .collect()
    }
}

impl TryFrom<BTreeMap<String, String>> for Choices {
    type Error = String;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        let mut choices = Choices::new();
        for (key, text) in map {
            let letter = ChoiceLetter::parse(&key).ok_or_else(|| format!("invalid choice letter: {key}"))?;
            choices.set(letter, text);
        }
        Ok(choices)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub number: u32,
    pub text: String,
    pub choices: Choices,
    pub correct_answer: String,
    pub page_number: usize,
    pub has_images: bool,
    pub parsing_confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    ChoiceCount,
    NoChoices,
    MissingAnswer,
    OrphanAnswer,
    Duplicate,
    AnchorNotFound,
    Document,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsingIssue {
    pub question_number: Option<u32>,
    pub issue: String,
    pub needs_manual_review: bool,
    pub kind: IssueKind,
}

impl ParsingIssue {
    pub fn review(kind: IssueKind, question_number: Option<u32>, issue: impl Into<String>) -> Self {
        Self {
            question_number,
            issue: issue.into(),
            needs_manual_review: true,
            kind,
        }
    }
}

/// Question number to correct letter, as printed on the answer-key page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerKey {
    answers: BTreeMap<u32, ChoiceLetter>,
}

impl AnswerKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, number: u32, letter: ChoiceLetter) {
        self.answers.insert(number, letter);
    }

    pub fn get(&self, number: u32) -> Option<ChoiceLetter> {
        self.answers.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.answers.keys().copied()
    }
}

impl FromIterator<(u32, ChoiceLetter)> for AnswerKey {
    fn from_iter<T: IntoIterator<Item = (u32, ChoiceLetter)>>(iter: T) -> Self {
        let mut key = AnswerKey::new();
        for (number, letter) in iter {
            key.insert(number, letter);
        }
        key
    }
}

/// Per-exam parse output, the `<type>_parsed.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    pub exam_year: u32,
    pub exam_type: ExamType,
    pub total_questions: usize,
    pub questions: Vec<Question>,
    pub parsing_issues: Vec<ParsingIssue>,
}

impl ExamResult {
    pub fn new(exam_year: u32, exam_type: ExamType, questions: Vec<Question>, parsing_issues: Vec<ParsingIssue>) -> Self {
        Self {
            exam_year,
            exam_type,
            total_questions: questions.len(),
            questions,
            parsing_issues,
        }
    }
}

/// One row of `<type>_answer_key.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub exam_year: u32,
    pub exam_type: ExamType,
    pub question_number: u32,
    pub answer: String,
    pub image_path: String,
}

impl AnswerKeyEntry {
    pub fn from_question(result: &ExamResult, question: &Question) -> Self {
        Self {
            exam_year: result.exam_year,
            exam_type: result.exam_type,
            question_number: question.number,
            answer: question.correct_answer.clone(),
            image_path: question.image_path.clone().unwrap_or_default(),
        }
    }
}
