//! IR errors definitions.

use std::io;
use thiserror::Error;

/// An alias for result that can be a [`IrError`].
pub type IrResult<T> = Result<T, IrError>;

/// The IR error type.
#[derive(Debug, Error)]
pub enum IrError {
    /// Error that can be returned when doing [std::io](I/O) operations.
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// Error that can be returned at parsing, with the remaining input.
    #[error("parsing error near '{0}' ({1:?})")]
    Parsing(String, nom::error::ErrorKind),

    /// Parsing error located in the source text.
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<IrError>,
    },

    /// The program text is well formed line by line but its blocks are not.
    #[error("program structure is invalid: {0}")]
    Structure(String),

    #[error("invalid type descriptor: {0}")]
    InvalidType(String),

    /// Custom internal error type.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IrError {
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            err @ Self::AtLine { .. } => err,
            err => Self::AtLine {
                line,
                source: Box::new(err),
            },
        }
    }
}

impl nom::error::ParseError<&str> for IrError {
    fn from_error_kind(input: &str, kind: nom::error::ErrorKind) -> Self {
        Self::Parsing(input.to_string(), kind)
    }

    fn append(_: &str, _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}
