//! Global error handling.
//!
//! Each sub-crate of the project defines its own type error.
//! Their types can be unified, for example in a main function,
//! when winding results at the top-level.
//!
//! ```rust
//! use ptaworks::prelude::*;
//!
//! fn main() -> PwResult<()> { // can return a PwError
//!    let _program = ir::parse("class A\nend\n")?; // can return an IrError
//!    Ok(())
//! }
//! ```

use pw_analysis::errors::AnalysisError;
use pw_ir::errors::IrError;
use std::io;
use thiserror::Error;

/// An alias for result that can be a [`PwError`].
pub type PwResult<T> = Result<T, PwError>;

/// The main error type for error winding at the top-level.
/// It mainly consists of transparent wrapper over error types that
/// are defined in dependencies.
#[derive(Debug, Error)]
pub enum PwError {
    /// Custom error for reporting bad command line arguments usage.
    #[error("bad arguments: {0}")]
    BadArguments(String),

    /// Error that can be returned from [I/O operations](std::io).
    #[error(transparent)]
    IO(#[from] io::Error),

    /// Error that can be returned from regex compilation.
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// Error that can be returned from JSON serialization.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Error that can be returned from [`pw_ir`] functions.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// Error that can be returned from [`pw_analysis`] functions.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}
