use thiserror::Error;

use crate::survey::QuestionId;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pinned column references unknown question {0}")]
    UnknownQuestion(QuestionId),
    #[error("invalid column reference: {0}")]
    InvalidColumnRef(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;
