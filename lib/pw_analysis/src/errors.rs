//! Analysis errors definition.

use pw_ir::errors::IrError;
use regex::Error as RegexError;
use thiserror::Error;

pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("internal error: {0}")]
    Internal(String),

    #[error("ir error: {0}")]
    Ir(#[from] IrError),

    #[error("regex error: {0}")]
    Regex(#[from] RegexError),

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// The analysis cannot start without an entry method with a body.
    #[error("no entry method: {0}")]
    NoEntry(String),

    /// A class inherits from itself, directly or not.
    #[error("cyclic class hierarchy through {0}")]
    CyclicHierarchy(String),

    #[error("invalid analysis option: {0}")]
    BadOption(String),
}
