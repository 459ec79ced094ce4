//! Context-sensitive, inclusion-based pointer analysis with on-the-fly call
//! graph construction.
//!
//! Starting from the entry method, the solver discovers reachable methods,
//! generates inclusion constraints between pointers and propagates abstract
//! objects along them until a fixpoint is reached. Instance calls are
//! resolved on the receiver objects found so far, so the call graph grows
//! along with the points-to sets.
//!
//! ```
//! use pw_analysis::pta::{self, Options};
//! use pw_analysis::repo::Repo;
//!
//! let program = pw_ir::parse(
//!     "class A\n  static method main()\n    new-instance x, A\n    move y, x\n    return-void\n  end\nend\nentry A->main\n",
//! )
//! .unwrap();
//! let repo = Repo::from_program(&program).unwrap();
//! let result = pta::analyze(&repo, &Options::default()).unwrap();
//! let x = repo.find_var("A", "main", "x").unwrap();
//! let y = repo.find_var("A", "main", "y").unwrap();
//! assert!(result.may_alias(x, y));
//! ```

mod arena;
mod solver;
mod worklist;

pub mod context;
pub mod cs_callgraph;
pub mod element;
pub mod heap;
pub mod pfg;
pub mod pts;
pub mod result;
pub mod selector;

pub use arena::Idx;
pub use result::{PointerAnalysisResult, Report, Stats};
pub use solver::Solver;

use crate::errors::{AnalysisError, AnalysisResult};
use crate::repo::Repo;
use selector::{ContextSelector, Insensitive, KCallSite, KObject, KType};
use std::fmt;
use std::str::FromStr;

/// The context sensitivity variant, with its context depth `k` and heap
/// context depth `hk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextSensitivity {
    #[default]
    Insensitive,
    CallSite { k: usize, hk: usize },
    Object { k: usize, hk: usize },
    Type { k: usize, hk: usize },
}

impl ContextSensitivity {
    pub fn selector(&self) -> Box<dyn ContextSelector> {
        match *self {
            Self::Insensitive => Box::new(Insensitive),
            Self::CallSite { k, hk } => Box::new(KCallSite { k, hk }),
            Self::Object { k, hk } => Box::new(KObject { k, hk }),
            Self::Type { k, hk } => Box::new(KType { k, hk }),
        }
    }

    fn default_hk(&self) -> usize {
        match *self {
            Self::Insensitive => 0,
            Self::CallSite { k, .. } => k,
            Self::Object { k, .. } | Self::Type { k, .. } => k - 1,
        }
    }
}

impl FromStr for ContextSensitivity {
    type Err = AnalysisError;

    /// Parses `ci`, `<k>-call`, `<k>-obj` or `<k>-type`, optionally
    /// followed by `:<hk>`.
    fn from_str(s: &str) -> AnalysisResult<Self> {
        let bad = || AnalysisError::BadOption(format!("invalid context sensitivity '{s}'"));
        if s == "ci" {
            return Ok(Self::Insensitive);
        }
        let (variant, hk) = match s.split_once(':') {
            Some((variant, hk)) => (variant, Some(hk.parse::<usize>().map_err(|_| bad())?)),
            None => (s, None),
        };
        let (k, kind) = variant.split_once('-').ok_or_else(bad)?;
        let k = k.parse::<usize>().map_err(|_| bad())?;
        if k == 0 {
            return Err(bad());
        }
        let make: fn(usize, usize) -> Self = match kind {
            "call" => |k, hk| Self::CallSite { k, hk },
            "obj" => |k, hk| Self::Object { k, hk },
            "type" => |k, hk| Self::Type { k, hk },
            _ => return Err(bad()),
        };
        let hk = hk.unwrap_or_else(|| make(k, 0).default_hk());
        if hk > k {
            return Err(AnalysisError::BadOption(format!(
                "heap context depth of '{s}' exceeds its context depth"
            )));
        }
        Ok(make(k, hk))
    }
}

impl fmt::Display for ContextSensitivity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (k, hk, kind) = match *self {
            Self::Insensitive => return write!(f, "ci"),
            Self::CallSite { k, hk } => (k, hk, "call"),
            Self::Object { k, hk } => (k, hk, "obj"),
            Self::Type { k, hk } => (k, hk, "type"),
        };
        write!(f, "{k}-{kind}")?;
        if hk != self.default_hk() {
            write!(f, ":{hk}")?;
        }
        Ok(())
    }
}

/// Pointer analysis options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub cs: ContextSensitivity,
    /// One string object per literal instead of one per `const-string`
    /// statement.
    pub merge_string_objects: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cs: ContextSensitivity::Insensitive,
            merge_string_objects: true,
        }
    }
}

/// Runs the pointer analysis from the entry method of a closed repository.
pub fn analyze<'r>(repo: &'r Repo, options: &Options) -> AnalysisResult<PointerAnalysisResult<'r>> {
    log::info!("running {} pointer analysis", options.cs);
    let mut solver = Solver::new(repo, options);
    solver.initialize()?;
    solver.analyze();
    let result = solver.finish();
    let stats = result.stats();
    log::info!(
        "{} reachable methods ({} in context), {} objects ({} in context), {} call edges, {} iterations",
        stats.nb_reachable_methods,
        stats.nb_cs_methods,
        stats.nb_objs,
        stats.nb_cs_objs,
        stats.nb_cs_call_edges,
        stats.nb_iterations
    );
    Ok(result)
}
