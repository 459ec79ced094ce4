//! The propagation engine: differential worklist propagation over the
//! pointer flow graph, with on-the-fly call graph construction.

use crate::dispatch::resolve_callee;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::pta::context::{CallSite, ContextId, Contexts};
use crate::pta::cs_callgraph::CSCallGraph;
use crate::pta::element::{
    CSCallSite, CSManager, CSMethod, CSMethodId, CSObjId, CSVar, Pointer, PointerId,
};
use crate::pta::heap::{AllocSite, HeapModel};
use crate::pta::pfg::PointerFlowGraph;
use crate::pta::pts::PointsToSet;
use crate::pta::result::{PointerAnalysisResult, Stats};
use crate::pta::selector::ContextSelector;
use crate::pta::worklist::WorkList;
use crate::pta::Options;
use crate::repo::{CallKind, Invoke, MethodUid, Repo, Stmt, VarUid};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A statement of a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct StmtRef {
    method: MethodUid,
    index: usize,
}

pub struct Solver<'r> {
    repo: &'r Repo,
    options: Options,
    selector: Box<dyn ContextSelector>,
    heap: HeapModel,
    contexts: Contexts,
    csm: CSManager,
    pfg: PointerFlowGraph,
    cg: CSCallGraph,
    worklist: WorkList,
    // Statements to re-evaluate when the points-to set of their base
    // variable grows, registered once per method
    rules: BTreeMap<VarUid, Vec<StmtRef>>,
    processed: BTreeSet<MethodUid>,
    // Newly reachable methods whose statements are not processed yet
    pending: VecDeque<CSMethodId>,
    iterations: usize,
}

impl<'r> Solver<'r> {
    pub fn new(repo: &'r Repo, options: &Options) -> Self {
        Self {
            repo,
            options: options.clone(),
            selector: options.cs.selector(),
            heap: HeapModel::new(),
            contexts: Contexts::new(),
            csm: CSManager::new(),
            pfg: PointerFlowGraph::new(),
            cg: CSCallGraph::new(),
            worklist: WorkList::new(),
            rules: BTreeMap::new(),
            processed: BTreeSet::new(),
            pending: VecDeque::new(),
            iterations: 0,
        }
    }

    /// Makes the entry method reachable under the empty context and gives
    /// mock objects to its receiver and typed parameters.
    pub fn initialize(&mut self) -> AnalysisResult<()> {
        let repo = self.repo;
        if !repo.is_closed() {
            return Err(AnalysisError::Internal(
                "pointer analysis needs a closed repository".to_string(),
            ));
        }
        let entry = repo
            .entry()
            .ok_or_else(|| AnalysisError::NoEntry("no entry method declared".to_string()))?;
        if !entry.has_body() {
            return Err(AnalysisError::NoEntry(format!(
                "entry method {entry} has no body"
            )));
        }
        log::debug!("entry method: {}", entry);

        let context = self.selector.empty_context(&mut self.contexts);
        let cs_entry = self.csm.cs_method(context, entry.uid());
        self.cg.add_entry_method(cs_entry);

        let heap_ctx = self.contexts.empty();
        if let Some(this) = entry.this_var() {
            let obj = self.heap.entry_receiver(repo, entry.uid());
            let cs_obj = self.csm.cs_obj(heap_ctx, obj);
            let ptr = self.csm.var_ptr(context, this);
            self.worklist.push(ptr, PointsToSet::singleton(cs_obj));
        }
        for (index, (param, typ)) in entry
            .params()
            .iter()
            .zip(entry.param_types())
            .enumerate()
        {
            if let Some(typ) = typ {
                let obj = self.heap.entry_argument(repo, entry.uid(), index, typ);
                let cs_obj = self.csm.cs_obj(heap_ctx, obj);
                let ptr = self.csm.var_ptr(context, *param);
                self.worklist.push(ptr, PointsToSet::singleton(cs_obj));
            }
        }

        self.add_reachable(cs_entry);
        Ok(())
    }

    /// Runs the propagation until the worklist is empty.
    pub fn analyze(&mut self) {
        loop {
            if let Some(method) = self.pending.pop_front() {
                self.process_new_method(method);
                continue;
            }
            let Some((ptr, delta)) = self.worklist.pop() else {
                break;
            };
            self.iterations += 1;
            let diff = self.propagate(ptr, &delta);
            if diff.is_empty() {
                continue;
            }
            if let Pointer::Var(cs_var) = self.csm[ptr] {
                self.apply_rules(cs_var, &diff);
            }
        }
        log::debug!("fixpoint reached after {} iterations", self.iterations);
    }

    /// Hands the final state over to a read-only result.
    pub fn finish(self) -> PointerAnalysisResult<'r> {
        let stats = Stats {
            context_sensitivity: self.options.cs.to_string(),
            nb_iterations: self.iterations,
            nb_contexts: self.contexts.nb_contexts(),
            nb_objs: self.heap.nb_objs(),
            nb_cs_objs: self.csm.nb_cs_objs(),
            nb_cs_methods: self.cg.nb_reachable_methods(),
            nb_reachable_methods: self.processed.len(),
            nb_pointers: self.csm.nb_pointers(),
            nb_pfg_edges: self.pfg.nb_edges(),
            nb_cs_call_edges: self.cg.nb_edges(),
        };
        PointerAnalysisResult::new(self.repo, self.heap, self.contexts, self.csm, self.cg, stats)
    }

    fn add_reachable(&mut self, method: CSMethodId) {
        if self.cg.add_reachable_method(method) {
            self.pending.push_back(method);
        }
    }

    fn add_pfg_edge(&mut self, source: PointerId, target: PointerId) {
        if self.pfg.add_edge(source, target) {
            log::trace!("new edge {:?} -> {:?}", self.csm[source], self.csm[target]);
            let pts = self.csm.points_to(source);
            if !pts.is_empty() {
                self.worklist.push(target, pts.clone());
            }
        }
    }

    fn propagate(&mut self, ptr: PointerId, delta: &PointsToSet) -> PointsToSet {
        let diff = self.csm.add_points_to(ptr, delta);
        if !diff.is_empty() {
            log::trace!("{} new objects for {:?}", diff.len(), self.csm[ptr]);
            for succ in self.pfg.succs_of(ptr) {
                self.worklist.push(succ, diff.clone());
            }
        }
        diff
    }

    fn process_new_method(&mut self, cs_method: CSMethodId) {
        let repo = self.repo;
        let CSMethod { context, method } = self.csm[cs_method];
        let m = &repo[method];
        log::debug!(
            "new reachable method {} in context {}",
            m,
            self.contexts.describe(context, repo, &self.heap)
        );

        if self.processed.insert(method) {
            for (index, stmt) in m.stmts().iter().enumerate() {
                if let Some(base) = stmt.base_var() {
                    self.rules
                        .entry(base)
                        .or_default()
                        .push(StmtRef { method, index });
                }
            }
        }

        let current = CSMethod { context, method };
        for stmt in m.stmts() {
            match stmt {
                Stmt::New { addr, dst, typ } | Stmt::NewArray { addr, dst, typ } => {
                    let site = AllocSite {
                        method,
                        addr: *addr,
                    };
                    let obj = self.heap.obj_for_site(repo, site, typ);
                    let heap_ctx =
                        self.selector
                            .select_heap_context(&mut self.contexts, &current, &self.heap[obj]);
                    let cs_obj = self.csm.cs_obj(heap_ctx, obj);
                    let ptr = self.csm.var_ptr(context, *dst);
                    self.worklist.push(ptr, PointsToSet::singleton(cs_obj));
                }
                Stmt::ConstString { addr, dst, lit } => {
                    let site = (!self.options.merge_string_objects).then_some(AllocSite {
                        method,
                        addr: *addr,
                    });
                    let obj = self.heap.string_constant(repo, lit, site);
                    let cs_obj = self.csm.cs_obj(self.contexts.empty(), obj);
                    let ptr = self.csm.var_ptr(context, *dst);
                    self.worklist.push(ptr, PointsToSet::singleton(cs_obj));
                }
                Stmt::Copy { dst, src } => {
                    let source = self.csm.var_ptr(context, *src);
                    let target = self.csm.var_ptr(context, *dst);
                    self.add_pfg_edge(source, target);
                }
                Stmt::LoadStatic { dst, field } => {
                    let source = self.csm.static_field_ptr(*field);
                    let target = self.csm.var_ptr(context, *dst);
                    self.add_pfg_edge(source, target);
                }
                Stmt::StoreStatic { field, src } => {
                    let source = self.csm.var_ptr(context, *src);
                    let target = self.csm.static_field_ptr(*field);
                    self.add_pfg_edge(source, target);
                }
                Stmt::Invoke(invoke) if invoke.kind() == CallKind::Static => {
                    self.process_static_call(context, method, invoke);
                }
                // depends on the points-to set of a base variable
                Stmt::LoadField { .. }
                | Stmt::StoreField { .. }
                | Stmt::LoadArray { .. }
                | Stmt::StoreArray { .. }
                | Stmt::Invoke(_)
                | Stmt::Return(_) => (),
            }
        }
    }

    fn apply_rules(&mut self, cs_var: CSVar, diff: &PointsToSet) {
        let Some(rules) = self.rules.get(&cs_var.var) else {
            return;
        };
        let repo = self.repo;
        let context = cs_var.context;
        for sref in rules.clone() {
            match &repo[sref.method].stmts()[sref.index] {
                Stmt::LoadField { dst, field, .. } => {
                    let target = self.csm.var_ptr(context, *dst);
                    for obj in diff.iter() {
                        let source = self.csm.instance_field_ptr(obj, *field);
                        self.add_pfg_edge(source, target);
                    }
                }
                Stmt::StoreField { field, src, .. } => {
                    let source = self.csm.var_ptr(context, *src);
                    for obj in diff.iter() {
                        let target = self.csm.instance_field_ptr(obj, *field);
                        self.add_pfg_edge(source, target);
                    }
                }
                Stmt::LoadArray { dst, .. } => {
                    let target = self.csm.var_ptr(context, *dst);
                    for obj in diff.iter() {
                        let source = self.csm.array_index_ptr(obj);
                        self.add_pfg_edge(source, target);
                    }
                }
                Stmt::StoreArray { src, .. } => {
                    let source = self.csm.var_ptr(context, *src);
                    for obj in diff.iter() {
                        let target = self.csm.array_index_ptr(obj);
                        self.add_pfg_edge(source, target);
                    }
                }
                Stmt::Invoke(invoke) => {
                    for recv in diff.iter() {
                        self.process_instance_call(context, sref.method, invoke, recv);
                    }
                }
                stmt => log::error!("no reactive rule for {:?}", stmt),
            }
        }
    }

    fn process_static_call(&mut self, context: ContextId, caller: MethodUid, invoke: &Invoke) {
        let Some(callee) = resolve_callee(self.repo, None, invoke) else {
            return;
        };
        let call_site = CSCallSite {
            context,
            site: CallSite {
                method: caller,
                addr: invoke.addr(),
            },
        };
        let callee_ctx = self
            .selector
            .select_context(&mut self.contexts, &call_site, callee);
        let cs_callee = self.csm.cs_method(callee_ctx, callee);
        self.process_call(call_site, invoke, cs_callee);
    }

    fn process_instance_call(
        &mut self,
        context: ContextId,
        caller: MethodUid,
        invoke: &Invoke,
        recv: CSObjId,
    ) {
        let repo = self.repo;
        let recv_obj = self.csm[recv];
        let Some(callee) = resolve_callee(repo, self.heap[recv_obj.obj].class(), invoke) else {
            return;
        };
        let call_site = CSCallSite {
            context,
            site: CallSite {
                method: caller,
                addr: invoke.addr(),
            },
        };
        let callee_ctx = self.selector.select_instance_context(
            &mut self.contexts,
            &call_site,
            &recv_obj,
            &self.heap[recv_obj.obj],
            callee,
        );
        let cs_callee = self.csm.cs_method(callee_ctx, callee);

        // several receivers may share one call edge
        match repo[callee].this_var() {
            Some(this) => {
                let ptr = self.csm.var_ptr(callee_ctx, this);
                self.worklist.push(ptr, PointsToSet::singleton(recv));
            }
            None => log::warn!("instance call {} resolved to static {}", invoke, repo[callee]),
        }
        self.process_call(call_site, invoke, cs_callee);
    }

    fn process_call(&mut self, call_site: CSCallSite, invoke: &Invoke, cs_callee: CSMethodId) {
        if !self.cg.add_edge(invoke.kind(), call_site, cs_callee) {
            return;
        }
        let repo = self.repo;
        let CSMethod {
            context: callee_ctx,
            method: callee,
        } = self.csm[cs_callee];
        let m = &repo[callee];
        log::trace!("new call edge {} -> {}", invoke, m);

        let params = m.params();
        if params.len() != invoke.args().len() {
            log::warn!(
                "{} has {} parameters, called with {} arguments by {}",
                m,
                params.len(),
                invoke.args().len(),
                invoke
            );
        }
        for (arg, param) in invoke.args().iter().zip(params) {
            let source = self.csm.var_ptr(call_site.context, *arg);
            let target = self.csm.var_ptr(callee_ctx, *param);
            self.add_pfg_edge(source, target);
        }
        if let Some(result) = invoke.result() {
            let target = self.csm.var_ptr(call_site.context, result);
            for ret in m.ret_vars() {
                let source = self.csm.var_ptr(callee_ctx, *ret);
                self.add_pfg_edge(source, target);
            }
        }

        self.add_reachable(cs_callee);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pta::context::ContextElem;
    use crate::pta::ContextSensitivity;

    fn setup(text: &str) -> Repo {
        Repo::from_program(&pw_ir::parse(text).unwrap()).unwrap()
    }

    fn solve<'r>(repo: &'r Repo, cs: &str) -> PointerAnalysisResult<'r> {
        let options = Options {
            cs: cs.parse::<ContextSensitivity>().unwrap(),
            ..Options::default()
        };
        let mut solver = Solver::new(repo, &options);
        solver.initialize().unwrap();
        solver.analyze();
        solver.finish()
    }

    // Names of the objects a variable may point to, in any context.
    fn pts(res: &PointerAnalysisResult, repo: &Repo, class: &str, method: &str, var: &str) -> Vec<String> {
        let var = repo.find_var(class, method, var).unwrap();
        res.points_to_var(var)
            .into_iter()
            .map(|obj| res.obj(obj).describe(repo))
            .collect()
    }

    fn site(class: &str, method: &str, addr: usize, typ: &str) -> String {
        format!("new {typ} @ {class}->{method}:{addr:04}")
    }

    #[test]
    fn straight_line_code() {
        let repo = setup(
            "class A\n  static method main()\n    new-instance x, A\n    move y, x\n    return-void\n  end\nend\nentry A->main\n",
        );
        let res = solve(&repo, "ci");
        let x = pts(&res, &repo, "A", "main", "x");
        assert_eq!(x, vec![site("A", "main/0", 0, "A")]);
        assert_eq!(pts(&res, &repo, "A", "main", "y"), x);
    }

    #[test]
    fn copy_cycles_converge() {
        let repo = setup(
            r#"
            class A
              static method main()
                new-instance x, A
                move y, x
                move x, y
                new-instance z, A
                move y, z
                return-void
              end
            end
            entry A->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(pts(&res, &repo, "A", "main", "x").len(), 2);
        assert_eq!(
            pts(&res, &repo, "A", "main", "x"),
            pts(&res, &repo, "A", "main", "y")
        );
    }

    #[test]
    fn field_aliasing() {
        let repo = setup(
            r#"
            class A
              field f
              static method main()
                new-instance x, A
                move y, x
                new-instance b, B
                iput b, x, A->f
                iget read, y, A->f
                new-instance other, A
                iget nothing, other, A->f
                return-void
              end
            end
            class B
            end
            entry A->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(
            pts(&res, &repo, "A", "main", "read"),
            vec![site("A", "main/0", 2, "B")]
        );
        assert!(pts(&res, &repo, "A", "main", "nothing").is_empty());
    }

    #[test]
    fn late_edges_receive_known_objects() {
        // the load is processed before the store fills the field
        let repo = setup(
            r#"
            class A
              field f
              static method main()
                new-instance x, A
                iget early, x, A->f
                new-instance b, A
                iput b, x, A->f
                return-void
              end
            end
            entry A->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(
            pts(&res, &repo, "A", "main", "early"),
            vec![site("A", "main/0", 2, "A")]
        );
    }

    const DISPATCH: &str = r#"
        class C
          method m()
            return-void
          end
        end
        class D1 extends C
          method m()
            return-void
          end
        end
        class D2 extends C
          method m()
            return-void
          end
        end
        class Main
          static method main()
            new-instance c, D1
            new-instance d, D2
            move c, d
            invoke-virtual {c}, C->m
            return-void
          end
        end
        entry Main->main
    "#;

    #[test]
    fn dynamic_dispatch() {
        let repo = setup(DISPATCH);
        let res = solve(&repo, "ci");
        let cg = res.ci_call_graph();
        let main = repo.find_method("Main", "main").unwrap().uid();
        let callee = |class| repo.find_method(class, "m").unwrap().uid();
        assert!(cg.contains_edge(main, callee("D1")));
        assert!(cg.contains_edge(main, callee("D2")));
        assert!(!cg.contains_edge(main, callee("C")));
        assert!(!res.reachable_methods().contains(&callee("C")));

        // each receiver reaches its own `this`
        let this_d1 = pts(&res, &repo, "D1", "m", "this");
        assert_eq!(this_d1, vec![site("Main", "main/0", 0, "D1")]);
        let this_d2 = pts(&res, &repo, "D2", "m", "this");
        assert_eq!(this_d2, vec![site("Main", "main/0", 1, "D2")]);
    }

    #[test]
    fn receivers_sharing_a_call_edge() {
        let repo = setup(
            r#"
            class A
              method get()
                return this
              end
            end
            class Main
              static method main()
                new-instance a1, A
                new-instance a2, A
                move a, a1
                move a, a2
                invoke-virtual {a}, A->get
                move-result r
                return-void
              end
            end
            entry Main->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(pts(&res, &repo, "A", "get", "this").len(), 2);
        assert_eq!(pts(&res, &repo, "Main", "main", "r").len(), 2);
        assert_eq!(res.call_graph().nb_edges(), 1);
    }

    const FACTORY: &str = r#"
        class A
          static method create()
            new-instance o, A
            return o
          end
        end
        class Main
          static method main()
            invoke-static {}, A->create
            move-result x
            invoke-static {}, A->create
            move-result y
            return-void
          end
        end
        entry Main->main
    "#;

    #[test]
    fn call_site_contexts_separate_objects() {
        let repo = setup(FACTORY);
        let x = repo.find_var("Main", "main", "x").unwrap();
        let y = repo.find_var("Main", "main", "y").unwrap();

        let res = solve(&repo, "1-call");
        let empty = res.contexts().empty();
        let x_objs = res.points_to(CSVar {
            context: empty,
            var: x,
        });
        let y_objs = res.points_to(CSVar {
            context: empty,
            var: y,
        });
        assert_eq!(x_objs.len(), 1);
        assert_eq!(y_objs.len(), 1);
        assert_ne!(x_objs, y_objs);
        // same allocation site, two heap contexts
        assert_eq!(res.points_to_var(x), res.points_to_var(y));
        assert!(!res.may_alias(x, y));
        assert_eq!(res.stats().nb_cs_methods, 3);

        let ci = solve(&repo, "ci");
        assert_eq!(
            ci.points_to(CSVar {
                context: ci.contexts().empty(),
                var: x
            })
            .len(),
            1
        );
        assert!(ci.may_alias(x, y));
    }

    #[test]
    fn static_fields_are_context_free() {
        let repo = setup(
            r#"
            class G
              static field shared
              static method put(v)
                sput v, G->shared
                return-void
              end
              static method get()
                sget r, G->shared
                return r
              end
            end
            class Main
              static method main()
                new-instance a, Main
                invoke-static {a}, G->put
                new-instance b, G
                invoke-static {b}, G->put
                invoke-static {}, G->get
                move-result x
                return-void
              end
            end
            entry Main->main
            "#,
        );
        let res = solve(&repo, "2-call");
        let shared = repo
            .get_class_by_name("G")
            .unwrap()
            .get_field("shared", &repo)
            .unwrap()
            .uid();
        assert_eq!(res.static_field(shared).len(), 2);
        assert_eq!(pts(&res, &repo, "Main", "main", "x").len(), 2);
        // `put` is analyzed under two contexts
        let put = repo.find_method("G", "put").unwrap().uid();
        let contexts: Vec<_> = res
            .call_graph()
            .reachable_methods()
            .map(|m| res.cs_method(m))
            .filter(|m| m.method == put)
            .collect();
        assert_eq!(contexts.len(), 2);
    }

    #[test]
    fn arrays_collapse_indices() {
        let repo = setup(
            r#"
            class A
              static method main()
                new-array arr, A
                new-instance a, A
                aput a, arr
                new-instance b, B
                aput b, arr
                aget r, arr
                return-void
              end
            end
            class B
            end
            entry A->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(
            pts(&res, &repo, "A", "main", "r"),
            vec![site("A", "main/0", 1, "A"), site("A", "main/0", 3, "B")]
        );
        assert_eq!(
            pts(&res, &repo, "A", "main", "arr"),
            vec![site("A", "main/0", 0, "A[]")]
        );
    }

    #[test]
    fn string_constants() {
        let text = r#"
            class A
              static method main()
                const-string s1, "a"
                const-string s2, "a"
                const-string s3, "b"
                return-void
              end
            end
            entry A->main
        "#;
        let repo = setup(text);
        let s1 = repo.find_var("A", "main", "s1").unwrap();
        let s2 = repo.find_var("A", "main", "s2").unwrap();
        let s3 = repo.find_var("A", "main", "s3").unwrap();

        let res = solve(&repo, "ci");
        assert!(res.may_alias(s1, s2));
        assert!(!res.may_alias(s1, s3));

        let options = Options {
            merge_string_objects: false,
            ..Options::default()
        };
        let mut solver = Solver::new(&repo, &options);
        solver.initialize().unwrap();
        solver.analyze();
        let res = solver.finish();
        assert!(!res.may_alias(s1, s2));
    }

    #[test]
    fn entry_arguments_are_mocked() {
        let repo = setup(
            r#"
            class A
              method run()
                return-void
              end
            end
            class Main
              method main(args: java/lang/String[], a: A, untyped)
                invoke-virtual {a}, A->run
                return-void
              end
            end
            entry Main->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(
            pts(&res, &repo, "Main", "main", "args"),
            vec!["java/lang/String[] argument #0 of Main->main/3".to_string()]
        );
        assert_eq!(
            pts(&res, &repo, "Main", "main", "this"),
            vec!["Main receiver of Main->main/3".to_string()]
        );
        assert!(pts(&res, &repo, "Main", "main", "untyped").is_empty());
        let run = repo.find_method("A", "run").unwrap().uid();
        assert!(res.reachable_methods().contains(&run));
    }

    #[test]
    fn unresolvable_calls_have_no_target() {
        let repo = setup(
            r#"
            class A
            end
            class Main
              static method main()
                new-instance a, A
                invoke-virtual {a}, A->missing
                move-result r
                invoke-static {}, Nowhere->f
                return-void
              end
            end
            entry Main->main
            "#,
        );
        let res = solve(&repo, "ci");
        assert_eq!(res.call_graph().nb_edges(), 0);
        assert!(pts(&res, &repo, "Main", "main", "r").is_empty());
        assert_eq!(res.reachable_methods().len(), 1);
    }

    #[test]
    fn recursion_terminates() {
        let repo = setup(
            r#"
            class A
              field next
              method loop(p)
                new-instance n, A
                iput p, n, A->next
                invoke-virtual {n, n}, A->loop
                return this
              end
            end
            class Main
              static method main()
                new-instance a, A
                invoke-virtual {a, a}, A->loop
                return-void
              end
            end
            entry Main->main
            "#,
        );
        for cs in ["ci", "2-call", "2-obj", "2-type:1"] {
            let res = solve(&repo, cs);
            assert_eq!(res.reachable_methods().len(), 2, "{cs}");
        }
    }

    #[test]
    fn object_sensitivity_separates_receivers() {
        let repo = setup(
            r#"
            class Box
              field item
              method set(v)
                iput v, this, Box->item
                return-void
              end
              method get()
                iget r, this, Box->item
                return r
              end
            end
            class Main
              static method main()
                new-instance b1, Box
                new-instance b2, Box
                new-instance a, Main
                new-instance c, Box
                invoke-virtual {b1, a}, Box->set
                invoke-virtual {b2, c}, Box->set
                invoke-virtual {b1}, Box->get
                move-result x
                return-void
              end
            end
            entry Main->main
            "#,
        );
        let ci = solve(&repo, "ci");
        assert_eq!(pts(&ci, &repo, "Main", "main", "x").len(), 2);

        let obj = solve(&repo, "1-obj");
        assert_eq!(
            pts(&obj, &repo, "Main", "main", "x"),
            vec![site("Main", "main/0", 2, "Main")]
        );
        let set = repo.find_method("Box", "set").unwrap().uid();
        for m in obj.call_graph().reachable_methods() {
            let cs_method = obj.cs_method(m);
            if cs_method.method == set {
                let elems = obj.contexts()[cs_method.context].elems();
                assert!(matches!(elems, [ContextElem::Obj(_)]));
            }
        }

        // both boxes are allocated in Main: one type context
        let typ = solve(&repo, "1-type");
        assert_eq!(pts(&typ, &repo, "Main", "main", "x").len(), 2);
    }

    #[test]
    fn constructor_and_interface_calls() {
        let repo = setup(
            r#"
            interface I
              abstract method get()
            end
            class Base
              method <init>()
                return-void
              end
            end
            class Box extends Base implements I
              field item
              method <init>(v)
                invoke-super {this}, Base-><init>
                iput v, this, Box->item
                return-void
              end
              method get()
                iget r, this, Box->item
                return r
              end
            end
            class Main
              static method main()
                new-instance b, Box
                new-instance a, Main
                invoke-direct {b, a}, Box-><init>
                invoke-interface {b}, I->get
                move-result x
                return-void
              end
            end
            entry Main->main
            "#,
        );
        let box_init = repo.find_method("Box", "<init>").unwrap().uid();
        for cs in ["ci", "1-obj"] {
            let res = solve(&repo, cs);
            let the_box = vec![site("Main", "main/0", 0, "Box")];
            assert_eq!(pts(&res, &repo, "Box", "<init>", "this"), the_box, "{cs}");
            assert_eq!(pts(&res, &repo, "Base", "<init>", "this"), the_box, "{cs}");
            assert_eq!(pts(&res, &repo, "Box", "get", "this"), the_box, "{cs}");
            assert_eq!(
                pts(&res, &repo, "Main", "main", "x"),
                vec![site("Main", "main/0", 1, "Main")],
                "{cs}"
            );
            // main -> Box.<init>, main -> Box.get, Box.<init> -> Base.<init>
            assert_eq!(res.call_graph().nb_edges(), 3, "{cs}");
        }

        // exact calls still get object contexts
        let res = solve(&repo, "1-obj");
        let init_contexts: Vec<_> = res
            .call_graph()
            .reachable_methods()
            .map(|m| res.cs_method(m))
            .filter(|cs_method| cs_method.method == box_init)
            .map(|cs_method| res.contexts()[cs_method.context].elems().to_vec())
            .collect();
        assert_eq!(init_contexts.len(), 1);
        assert!(matches!(init_contexts[0].as_slice(), [ContextElem::Obj(_)]));
    }

    #[test]
    fn monotone_and_idempotent_propagation() {
        let repo = setup(DISPATCH);
        let options = Options::default();
        let mut solver = Solver::new(&repo, &options);
        solver.initialize().unwrap();

        let mut snapshots: BTreeMap<PointerId, usize> = BTreeMap::new();
        while !solver.pending.is_empty() || !solver.worklist.is_empty() {
            if let Some(method) = solver.pending.pop_front() {
                solver.process_new_method(method);
                continue;
            }
            let (ptr, delta) = solver.worklist.pop().unwrap();
            let diff = solver.propagate(ptr, &delta);
            // a second application changes nothing
            assert!(solver.propagate(ptr, &delta).is_empty());
            if let Pointer::Var(cs_var) = solver.csm[ptr] {
                solver.apply_rules(cs_var, &diff);
            }
            for (ptr, _) in solver.csm.iter_pointers() {
                let len = solver.csm.points_to(ptr).len();
                let before = snapshots.insert(ptr, len).unwrap_or(0);
                assert!(before <= len);
            }
        }
        assert_eq!(solver.finish().reachable_methods().len(), 3);
    }

    #[test]
    fn missing_entry() {
        let repo = setup("class A\n  static method main()\n    return-void\n  end\nend\n");
        let mut solver = Solver::new(&repo, &Options::default());
        assert!(matches!(solver.initialize(), Err(AnalysisError::NoEntry(_))));

        let repo = setup("class A\n  native static method main()\nend\nentry A->main\n");
        let mut solver = Solver::new(&repo, &Options::default());
        assert!(matches!(solver.initialize(), Err(AnalysisError::NoEntry(_))));
    }
}
