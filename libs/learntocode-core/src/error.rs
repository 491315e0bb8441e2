//! Error types for learntocode-core.

use thiserror::Error;

use crate::types::QuestionKind;

/// Result type alias using QuestionError.
pub type Result<T> = std::result::Result<T, QuestionError>;

/// Errors raised when stored curriculum content cannot form a valid question.
#[derive(Debug, Error)]
pub enum QuestionError {
    #[error("{} question is missing {field}", kind.as_str())]
    MissingField {
        kind: QuestionKind,
        field: &'static str,
    },

    #[error("solution index {index} out of range for {len} entries")]
    SolutionOutOfRange { index: i32, len: usize },
}
