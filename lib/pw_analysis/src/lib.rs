//! This crate provides the class hierarchy, call graph and pointer analysis
//! algorithms of the `PtaWorks` project.
//!
//! Programs parsed by [`pw_ir`] are registered into a [`repo::Repo`], which
//! resolves names into identifiers and lowers method bodies into the
//! statements the analyses work on.

pub mod callgraph;
pub mod dispatch;
pub mod errors;
pub mod hierarchy;
pub mod pta;
pub mod repo;

use crate::errors::AnalysisResult;

/// Runs a pointer analysis on a closed repository.
pub fn points_to<'r>(
    repo: &'r repo::Repo,
    options: &pta::Options,
) -> AnalysisResult<pta::PointerAnalysisResult<'r>> {
    pta::analyze(repo, options)
}

/// Builds the call graph of a closed repository with class hierarchy
/// analysis.
pub fn cha_callgraph(repo: &repo::Repo) -> AnalysisResult<callgraph::CallGraph> {
    callgraph::CallGraph::build_cha(repo)
}
