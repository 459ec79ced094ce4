//! Read-only snapshot of a finished pointer analysis.

use crate::callgraph::CallGraph;
use crate::pta::context::{ContextId, Contexts};
use crate::pta::cs_callgraph::CSCallGraph;
use crate::pta::element::{CSManager, CSMethod, CSMethodId, CSObj, CSObjId, CSVar, Pointer};
use crate::pta::heap::{HeapModel, Obj, ObjId};
use crate::pta::pts::PointsToSet;
use crate::repo::{CallKind, FieldUid, MethodUid, Repo, VarUid};
use pw_ir::Addr;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Analysis counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub context_sensitivity: String,
    pub nb_iterations: usize,
    pub nb_contexts: usize,
    pub nb_objs: usize,
    pub nb_cs_objs: usize,
    pub nb_cs_methods: usize,
    pub nb_reachable_methods: usize,
    pub nb_pointers: usize,
    pub nb_pfg_edges: usize,
    pub nb_cs_call_edges: usize,
}

#[derive(Debug, Serialize)]
pub struct CallReport {
    pub caller: String,
    pub addr: Addr,
    pub kind: CallKind,
    pub callee: String,
}

/// Context-insensitive view of the results, with everything named.
#[derive(Debug, Serialize)]
pub struct Report {
    pub stats: Stats,
    pub reachable_methods: Vec<String>,
    pub calls: Vec<CallReport>,
    /// Objects each variable may point to, keyed by `method:var`.
    pub points_to: BTreeMap<String, Vec<String>>,
}

pub struct PointerAnalysisResult<'r> {
    repo: &'r Repo,
    heap: HeapModel,
    contexts: Contexts,
    csm: CSManager,
    cg: CSCallGraph,
    stats: Stats,
    // Variable pointers of every variable, in all contexts
    var_ptrs: BTreeMap<VarUid, Vec<CSVar>>,
}

impl<'r> PointerAnalysisResult<'r> {
    pub(crate) fn new(
        repo: &'r Repo,
        heap: HeapModel,
        contexts: Contexts,
        csm: CSManager,
        cg: CSCallGraph,
        stats: Stats,
    ) -> Self {
        let mut var_ptrs: BTreeMap<VarUid, Vec<CSVar>> = BTreeMap::new();
        for (_, ptr) in csm.iter_pointers() {
            if let Pointer::Var(cs_var) = ptr {
                var_ptrs.entry(cs_var.var).or_default().push(*cs_var);
            }
        }
        Self {
            repo,
            heap,
            contexts,
            csm,
            cg,
            stats,
            var_ptrs,
        }
    }

    #[inline]
    pub fn repo(&self) -> &'r Repo {
        self.repo
    }

    #[inline]
    pub fn contexts(&self) -> &Contexts {
        &self.contexts
    }

    #[inline]
    pub fn heap(&self) -> &HeapModel {
        &self.heap
    }

    #[inline]
    pub fn obj(&self, obj: ObjId) -> &Obj {
        &self.heap[obj]
    }

    #[inline]
    pub fn cs_obj(&self, obj: CSObjId) -> &CSObj {
        &self.csm[obj]
    }

    #[inline]
    pub fn cs_method(&self, method: CSMethodId) -> &CSMethod {
        &self.csm[method]
    }

    #[inline]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    fn pts_of(&self, ptr: &Pointer) -> PointsToSet {
        self.csm
            .lookup(ptr)
            .map(|id| self.csm.points_to(id).clone())
            .unwrap_or_default()
    }

    /// The objects a variable may point to under a context.
    pub fn points_to(&self, cs_var: CSVar) -> PointsToSet {
        self.pts_of(&Pointer::Var(cs_var))
    }

    /// The objects a variable may point to in any context, heap contexts
    /// dropped.
    pub fn points_to_var(&self, var: VarUid) -> BTreeSet<ObjId> {
        let pts = self.cs_points_to_var(var);
        pts.iter().map(|obj| self.csm[obj].obj).collect()
    }

    fn cs_points_to_var(&self, var: VarUid) -> PointsToSet {
        let mut pts = PointsToSet::new();
        for cs_var in self.var_ptrs.get(&var).into_iter().flatten() {
            pts.add_all(&self.points_to(*cs_var));
        }
        pts
    }

    /// Alias query: the objects `cs_var` points to, or with a field the
    /// objects stored in that field of any of them.
    pub fn points_to_field(&self, cs_var: CSVar, field: Option<FieldUid>) -> PointsToSet {
        let base = self.points_to(cs_var);
        match field {
            None => base,
            Some(field) => {
                let mut pts = PointsToSet::new();
                for obj in base.iter() {
                    pts.add_all(&self.instance_field(obj, field));
                }
                pts
            }
        }
    }

    pub fn instance_field(&self, obj: CSObjId, field: FieldUid) -> PointsToSet {
        self.pts_of(&Pointer::InstanceField(obj, field))
    }

    pub fn static_field(&self, field: FieldUid) -> PointsToSet {
        self.pts_of(&Pointer::StaticField(field))
    }

    pub fn array_index(&self, obj: CSObjId) -> PointsToSet {
        self.pts_of(&Pointer::ArrayIndex(obj))
    }

    /// Checks if two variables may point to a same object, whatever their
    /// contexts.
    pub fn may_alias(&self, var1: VarUid, var2: VarUid) -> bool {
        let pts2 = self.cs_points_to_var(var2);
        self.cs_points_to_var(var1)
            .iter()
            .any(|obj| pts2.contains(obj))
    }

    #[inline]
    pub fn call_graph(&self) -> &CSCallGraph {
        &self.cg
    }

    /// The call graph with contexts dropped.
    pub fn ci_call_graph(&self) -> CallGraph {
        let mut cg = CallGraph::new();
        for entry in self.cg.entry_methods() {
            cg.add_entry(self.repo, self.csm[entry].method);
        }
        for method in self.cg.reachable_methods() {
            cg.add_method(self.repo, self.csm[method].method);
        }
        for edge in self.cg.edges() {
            cg.add_call(
                self.repo,
                edge.call_site.site.method,
                edge.call_site.site.addr,
                edge.kind,
                self.csm[edge.callee].method,
            );
        }
        cg
    }

    pub fn reachable_methods(&self) -> BTreeSet<MethodUid> {
        self.cg
            .reachable_methods()
            .map(|method| self.csm[method].method)
            .collect()
    }

    pub fn describe_context(&self, ctx: ContextId) -> String {
        self.contexts.describe(ctx, self.repo, &self.heap)
    }

    pub fn describe_obj(&self, obj: CSObjId) -> String {
        let cs_obj = &self.csm[obj];
        let obj = self.heap[cs_obj.obj].describe(self.repo);
        if self.contexts[cs_obj.context].is_empty() {
            obj
        } else {
            format!("{}:{obj}", self.describe_context(cs_obj.context))
        }
    }

    /// Renders the context-sensitive call graph, one node per method and
    /// context.
    #[must_use]
    pub fn cs_call_graph_dot(&self) -> String {
        let mut res = String::new();
        res.push_str("digraph {\n");
        res.push_str("  rankdir=LR;\n");
        let entries: BTreeSet<CSMethodId> = self.cg.entry_methods().collect();
        for method in self.cg.reachable_methods() {
            let cs_method = &self.csm[method];
            let color = if entries.contains(&method) {
                "blue"
            } else {
                "black"
            };
            writeln!(
                res,
                "  {} [ label = <{}<BR/><I>{}</I>> color={color},shape=box ]",
                method.index(),
                html_escape::encode_text(&self.repo[cs_method.method].to_string()),
                html_escape::encode_text(&self.describe_context(cs_method.context)),
            )
            .expect("writing to a String cannot fail");
        }
        for edge in self.cg.edges() {
            let caller = edge.call_site.caller();
            let Some(caller) = self.csm.lookup_cs_method(caller.context, caller.method) else {
                log::error!("call edge from an unknown method {:?}", caller);
                continue;
            };
            let style = match edge.kind {
                CallKind::Static | CallKind::Special => "solid",
                CallKind::Virtual | CallKind::Interface => "dashed",
            };
            writeln!(
                res,
                "  {} -> {} [ label = \"{}\" style={style} ]",
                caller.index(),
                edge.callee.index(),
                edge.call_site.site.addr,
            )
            .expect("writing to a String cannot fail");
        }
        res.push('}');
        res
    }

    /// Builds the context-insensitive report of the analysis.
    pub fn report(&self) -> Report {
        let repo = self.repo;
        let reachable = self.reachable_methods();

        let mut calls: BTreeSet<(MethodUid, Addr, CallKind, MethodUid)> = BTreeSet::new();
        for edge in self.cg.edges() {
            calls.insert((
                edge.call_site.site.method,
                edge.call_site.site.addr,
                edge.kind,
                self.csm[edge.callee].method,
            ));
        }

        let mut points_to = BTreeMap::new();
        for var in self.var_ptrs.keys() {
            let objs = self.points_to_var(*var);
            if objs.is_empty() {
                continue;
            }
            let var = &repo[*var];
            points_to.insert(
                format!("{}:{}", repo[var.method()], var.name()),
                objs.into_iter()
                    .map(|obj| self.heap[obj].describe(repo))
                    .collect(),
            );
        }

        Report {
            stats: self.stats.clone(),
            reachable_methods: reachable
                .into_iter()
                .map(|method| repo[method].to_string())
                .collect(),
            calls: calls
                .into_iter()
                .map(|(caller, addr, kind, callee)| CallReport {
                    caller: repo[caller].to_string(),
                    addr,
                    kind,
                    callee: repo[callee].to_string(),
                })
                .collect(),
            points_to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pta::{analyze, Options};

    const PROGRAM: &str = r#"
        class Node
          field next
          static field head
          method link(n)
            iput n, this, Node->next
            return-void
          end
        end
        class Main
          static method main()
            new-instance a, Node
            new-instance b, Node
            invoke-virtual {a, b}, Node->link
            sput a, Node->head
            new-array arr, Node
            aput b, arr
            return-void
          end
        end
        entry Main->main
    "#;

    #[test]
    fn queries() {
        let repo = Repo::from_program(&pw_ir::parse(PROGRAM).unwrap()).unwrap();
        let res = analyze(&repo, &Options::default()).unwrap();
        let node = repo.get_class_by_name("Node").unwrap();
        let next = node.get_field("next", &repo).unwrap().uid();
        let head = node.get_field("head", &repo).unwrap().uid();
        let a = CSVar {
            context: res.contexts().empty(),
            var: repo.find_var("Main", "main", "a").unwrap(),
        };
        let b = repo.find_var("Main", "main", "b").unwrap();
        let arr = repo.find_var("Main", "main", "arr").unwrap();

        let a_next = res.points_to_field(a, Some(next));
        assert_eq!(a_next.len(), 1);
        let b_objs: Vec<ObjId> = res.points_to_var(b).into_iter().collect();
        let a_next_objs: Vec<ObjId> = a_next.iter().map(|obj| res.cs_obj(obj).obj).collect();
        assert_eq!(a_next_objs, b_objs);
        assert_eq!(res.points_to_field(a, None), res.points_to(a));
        assert_eq!(res.static_field(head), res.points_to(a));

        let arr_obj = res.points_to(CSVar {
            context: res.contexts().empty(),
            var: arr,
        });
        let arr_obj = arr_obj.iter().next().unwrap();
        assert_eq!(res.array_index(arr_obj), a_next);
        assert!(res.may_alias(b, repo.find_var("Node", "link", "n").unwrap()));
        assert!(!res.may_alias(b, a.var));

        let cg = res.ci_call_graph();
        assert_eq!(cg.nb_methods(), 2);
        assert_eq!(cg.nb_calls(), 1);
        assert_eq!(res.describe_obj(arr_obj), "new Node[] @ Main->main/0:0004");

        let dot = res.cs_call_graph_dot();
        assert!(dot.contains("label = <Node-&gt;link/1<BR/><I>[]</I>>"));
        assert!(dot.contains("color=blue"));
        assert!(dot.contains("[ label = \"0002\" style=dashed ]"));
    }

    #[test]
    fn report() {
        let repo = Repo::from_program(&pw_ir::parse(PROGRAM).unwrap()).unwrap();
        let res = analyze(&repo, &Options::default()).unwrap();
        let report = res.report();
        assert_eq!(
            report.reachable_methods,
            vec!["Node->link/1".to_string(), "Main->main/0".to_string()]
        );
        assert_eq!(report.calls.len(), 1);
        assert_eq!(report.calls[0].callee, "Node->link/1");
        assert_eq!(report.calls[0].kind, CallKind::Virtual);
        assert_eq!(
            report.points_to["Node->link/1:this"],
            vec!["new Node @ Main->main/0:0000".to_string()]
        );
        assert_eq!(report.stats.context_sensitivity, "ci");
        assert_eq!(report.stats.nb_reachable_methods, 2);
    }
}
