pub mod core;
pub mod crop;
pub mod export;
pub mod layout;
pub mod parser;
pub mod pipeline;

pub use core::model::{ExamResult, ExamType, ParsingIssue, Question};
