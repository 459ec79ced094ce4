//! Method local variables.
//!
//! Locals are named by the textual IR and scoped to their method. The
//! implicit receiver of instance methods is the local named [`THIS`].

use serde::Serialize;
use std::fmt;

/// Name of the implicit receiver variable of instance methods.
pub const THIS: &str = "this";

/// A local variable name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Local(String);

impl fmt::Display for Local {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Local {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl Local {
    /// Returns the variable name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Checks if this is the implicit receiver variable.
    #[inline]
    #[must_use]
    pub fn is_this(&self) -> bool {
        self.0 == THIS
    }
}
