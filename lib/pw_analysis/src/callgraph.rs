//! Context-insensitive graph representation of the calls between the
//! program methods.
//!
//! It is either built by class hierarchy analysis ([`CallGraph::build_cha`])
//! or projected from the points-to analysis call graph.

use crate::dispatch::cha_targets;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::repo::{self, CallKind, MethodDescr, MethodUid, Stmt};
use petgraph::dot::{Config, Dot};
use petgraph::prelude::*;
use petgraph::visit::{NodeRef, Reversed};
use pw_ir::Addr;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Write};

#[derive(Debug, Clone)]
pub struct Method {
    uid: MethodUid,
    descriptor: MethodDescr,
    is_entry: bool,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

impl Method {
    #[inline]
    pub fn uid(&self) -> MethodUid {
        self.uid
    }

    pub fn class_name(&self) -> &str {
        self.descriptor.class_name()
    }

    pub fn name(&self) -> &str {
        self.descriptor.subsig().name()
    }

    #[inline]
    pub fn is_entry(&self) -> bool {
        self.is_entry
    }
}

/// The call sites of a caller that may call a callee.
#[derive(Debug, Clone, Default)]
pub struct Call {
    call_addrs: BTreeSet<Addr>,
    kinds: BTreeSet<CallKind>,
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, addr) in self.call_addrs.iter().enumerate() {
            write!(f, "{addr}")?;
            if i < self.call_addrs.len() - 1 {
                write!(f, ", ")?;
            }
        }
        Ok(())
    }
}

impl Call {
    pub fn call_addrs(&self) -> impl Iterator<Item = Addr> + '_ {
        self.call_addrs.iter().copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = CallKind> + '_ {
        self.kinds.iter().copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    inner: DiGraph<Method, Call>,
    node_ids: BTreeMap<MethodUid, NodeIndex>,
}

impl CallGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_method(&mut self, repo: &repo::Repo, muid: MethodUid) -> NodeIndex {
        if let Some(id) = self.node_ids.get(&muid) {
            return *id;
        }
        let id = self.inner.add_node(Method {
            uid: muid,
            descriptor: repo[muid].descriptor().clone(),
            is_entry: false,
        });
        self.node_ids.insert(muid, id);
        id
    }

    pub(crate) fn add_entry(&mut self, repo: &repo::Repo, muid: MethodUid) {
        let id = self.add_method(repo, muid);
        self.inner[id].is_entry = true;
    }

    /// Adds a call, returns `true` if the callee was not yet in the graph.
    pub(crate) fn add_call(
        &mut self,
        repo: &repo::Repo,
        caller: MethodUid,
        addr: Addr,
        kind: CallKind,
        callee: MethodUid,
    ) -> bool {
        let is_new = !self.node_ids.contains_key(&callee);
        let src = self.add_method(repo, caller);
        let dst = self.add_method(repo, callee);
        let edge = match self.inner.find_edge(src, dst) {
            Some(edge) => edge,
            None => self.inner.add_edge(src, dst, Call::default()),
        };
        self.inner[edge].call_addrs.insert(addr);
        self.inner[edge].kinds.insert(kind);
        is_new
    }

    /// Builds the call graph of the methods reachable from the repository
    /// entry method, resolving calls with class hierarchy analysis.
    pub fn build_cha(repo: &repo::Repo) -> AnalysisResult<Self> {
        let entry = repo
            .entry()
            .ok_or_else(|| AnalysisError::NoEntry("no entry method declared".to_string()))?;

        let mut cg = Self::new();
        cg.add_entry(repo, entry.uid());
        let mut worklist = VecDeque::from([entry.uid()]);
        while let Some(caller) = worklist.pop_front() {
            for stmt in repo[caller].stmts() {
                let Stmt::Invoke(invoke) = stmt else {
                    continue;
                };
                let targets = cha_targets(repo, invoke);
                if targets.is_empty() {
                    log::debug!("{}: no CHA target for {}", repo[caller], invoke);
                }
                for callee in targets {
                    if cg.add_call(repo, caller, invoke.addr(), invoke.kind(), callee) {
                        worklist.push_back(callee);
                    }
                }
            }
        }

        log::debug!(
            "CHA call graph: {} methods, {} calls",
            cg.nb_methods(),
            cg.nb_calls()
        );
        Ok(cg)
    }

    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut res = String::new();
        res.push_str("digraph {\n");
        res.push_str("  rankdir=LR;\n");
        write!(
            res,
            "{}",
            Dot::with_attr_getters(
                &self.inner,
                &[Config::GraphContentOnly],
                &|_, edge| {
                    if edge.weight().kinds.contains(&CallKind::Special)
                        || edge.weight().kinds.contains(&CallKind::Static)
                    {
                        "style=solid".to_string()
                    } else {
                        "style=dashed".to_string()
                    }
                },
                &|_, node| {
                    let m = node.weight();
                    let color = if m.is_entry { "blue" } else { "black" };
                    format!("color={color},shape=box")
                }
            )
        )
        .expect("writing to a String cannot fail");
        res.push('}');
        res
    }

    /// Keeps the methods from which a method matching the predicate can be
    /// reached, and the calls between them.
    pub fn filter<P>(&self, predicate: P) -> Self
    where
        P: Fn(&Method) -> bool,
    {
        // Since we remove nodes while keeping ids collection,
        // we need to switch to the stable graph representation so
        // that ids are preserved.
        let mut stable_graph: StableDiGraph<_, _> = self.inner.clone().into();

        // collect all callgraph nodes
        let mut to_remove: BTreeSet<NodeIndex> = stable_graph.node_indices().collect();

        // remove from the collection all nodes from paths,
        // by doing a backward traversale from targets.
        let reversed = Reversed(&stable_graph);
        let mut dfs = Dfs::empty(reversed);
        for id in stable_graph.node_indices() {
            if predicate(&stable_graph[id]) {
                dfs.move_to(id);
                while let Some(keep_id) = dfs.next(reversed) {
                    to_remove.remove(&keep_id);
                }
            }
        }

        // remove from callgraph all remainings nodes.
        stable_graph.retain_nodes(|_, id| !to_remove.contains(&id));

        let inner: DiGraph<Method, Call> = stable_graph.into();
        let node_ids = inner
            .node_indices()
            .map(|id| (inner[id].uid, id))
            .collect();
        Self { inner, node_ids }
    }

    pub fn iter_methods(&self) -> impl Iterator<Item = &Method> {
        self.inner.node_weights()
    }

    pub fn contains_method(&self, muid: MethodUid) -> bool {
        self.node_ids.contains_key(&muid)
    }

    pub fn callees_of(&self, muid: MethodUid) -> BTreeSet<MethodUid> {
        self.node_ids
            .get(&muid)
            .map(|id| {
                self.inner
                    .neighbors_directed(*id, Outgoing)
                    .map(|callee| self.inner[callee].uid)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains_edge(&self, caller: MethodUid, callee: MethodUid) -> bool {
        match (self.node_ids.get(&caller), self.node_ids.get(&callee)) {
            (Some(src), Some(dst)) => self.inner.contains_edge(*src, *dst),
            _ => false,
        }
    }

    pub fn nb_methods(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of caller/callee pairs.
    pub fn nb_calls(&self) -> usize {
        self.inner.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Repo;

    const PROGRAM: &str = r#"
        class A
          method m()
            return-void
          end
        end
        class B extends A
          method m()
            invoke-static {}, Main->leaf
            return-void
          end
        end
        class Unused
          method m()
            return-void
          end
        end
        class Main
          static method main()
            new-instance a, A
            invoke-virtual {a}, A->m
            invoke-virtual {a}, A->m
            return-void
          end
          static method leaf()
            return-void
          end
        end
        entry Main->main
    "#;

    #[test]
    fn cha_callgraph() {
        let repo = Repo::from_program(&pw_ir::parse(PROGRAM).unwrap()).unwrap();
        let cg = CallGraph::build_cha(&repo).unwrap();
        let uid = |c, m| repo.find_method(c, m).unwrap().uid();

        assert_eq!(cg.nb_methods(), 4);
        assert_eq!(cg.nb_calls(), 3);
        assert!(cg.contains_edge(uid("Main", "main"), uid("A", "m")));
        assert!(cg.contains_edge(uid("Main", "main"), uid("B", "m")));
        assert!(cg.contains_edge(uid("B", "m"), uid("Main", "leaf")));
        assert!(!cg.contains_method(uid("Unused", "m")));
        assert_eq!(
            cg.callees_of(uid("Main", "main")),
            BTreeSet::from([uid("A", "m"), uid("B", "m")])
        );

        let dot = cg.to_dot();
        assert!(dot.starts_with("digraph {\n  rankdir=LR;"));
        assert!(dot.contains("0001, 0002"));
    }

    #[test]
    fn filtering_keeps_callers() {
        let repo = Repo::from_program(&pw_ir::parse(PROGRAM).unwrap()).unwrap();
        let cg = CallGraph::build_cha(&repo)
            .unwrap()
            .filter(|m| m.name() == "leaf");
        let uid = |c, m| repo.find_method(c, m).unwrap().uid();

        assert_eq!(cg.nb_methods(), 3);
        assert!(cg.contains_edge(uid("B", "m"), uid("Main", "leaf")));
        assert!(!cg.contains_method(uid("A", "m")));
    }

    #[test]
    fn no_entry() {
        let repo = Repo::from_program(&pw_ir::parse("class A\nend\n").unwrap()).unwrap();
        assert!(matches!(
            CallGraph::build_cha(&repo),
            Err(AnalysisError::NoEntry(_))
        ));
    }
}
