//! Context-sensitive call graph and method reachability.

use crate::pta::element::{CSCallSite, CSMethodId};
use crate::repo::CallKind;
use std::collections::{BTreeMap, BTreeSet};

/// A call edge, from a call site under a context to a method under a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSEdge {
    pub kind: CallKind,
    pub call_site: CSCallSite,
    pub callee: CSMethodId,
}

#[derive(Debug, Default)]
pub struct CSCallGraph {
    entries: Vec<CSMethodId>,
    reachable: BTreeSet<CSMethodId>,
    edges: BTreeSet<CSEdge>,
    callees: BTreeMap<CSCallSite, BTreeSet<CSMethodId>>,
    callers: BTreeMap<CSMethodId, BTreeSet<CSCallSite>>,
}

impl CSCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry_method(&mut self, method: CSMethodId) {
        if !self.entries.contains(&method) {
            self.entries.push(method);
        }
    }

    /// Marks a method reachable, returns `true` if it was not yet.
    pub fn add_reachable_method(&mut self, method: CSMethodId) -> bool {
        self.reachable.insert(method)
    }

    /// Adds a call edge, returns `true` if it was not already in the graph.
    pub fn add_edge(&mut self, kind: CallKind, call_site: CSCallSite, callee: CSMethodId) -> bool {
        let is_new = self.edges.insert(CSEdge {
            kind,
            call_site,
            callee,
        });
        if is_new {
            self.callees.entry(call_site).or_default().insert(callee);
            self.callers.entry(callee).or_default().insert(call_site);
        }
        is_new
    }

    pub fn contains(&self, method: CSMethodId) -> bool {
        self.reachable.contains(&method)
    }

    pub fn entry_methods(&self) -> impl Iterator<Item = CSMethodId> + '_ {
        self.entries.iter().copied()
    }

    pub fn reachable_methods(&self) -> impl Iterator<Item = CSMethodId> + '_ {
        self.reachable.iter().copied()
    }

    pub fn callees_of_site(&self, call_site: &CSCallSite) -> impl Iterator<Item = CSMethodId> + '_ {
        self.callees
            .get(call_site)
            .into_iter()
            .flat_map(|callees| callees.iter().copied())
    }

    pub fn callers_of(&self, method: CSMethodId) -> impl Iterator<Item = CSCallSite> + '_ {
        self.callers
            .get(&method)
            .into_iter()
            .flat_map(|callers| callers.iter().copied())
    }

    pub fn edges(&self) -> impl Iterator<Item = &CSEdge> {
        self.edges.iter()
    }

    pub fn nb_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn nb_reachable_methods(&self) -> usize {
        self.reachable.len()
    }
}
