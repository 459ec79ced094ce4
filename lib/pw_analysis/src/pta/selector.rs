//! Context sensitivity policies.
//!
//! A selector decides under which context a callee is analyzed and under
//! which heap context a new object is created. Every policy keeps contexts
//! at a bounded length, which is what makes the analysis terminate on
//! recursive programs.

use crate::pta::context::{ContextElem, ContextId, Contexts};
use crate::pta::element::{CSCallSite, CSMethod, CSObj};
use crate::pta::heap::Obj;
use crate::repo::MethodUid;
use std::fmt;

pub trait ContextSelector: fmt::Debug + Send + Sync {
    /// The context of the entry method.
    fn empty_context(&self, contexts: &mut Contexts) -> ContextId {
        contexts.empty()
    }

    /// The callee context of a static call.
    fn select_context(
        &self,
        contexts: &mut Contexts,
        call_site: &CSCallSite,
        callee: MethodUid,
    ) -> ContextId;

    /// The callee context of an instance call on `recv`.
    fn select_instance_context(
        &self,
        contexts: &mut Contexts,
        call_site: &CSCallSite,
        recv: &CSObj,
        recv_obj: &Obj,
        callee: MethodUid,
    ) -> ContextId;

    /// The heap context of an object allocated by `method`.
    fn select_heap_context(
        &self,
        contexts: &mut Contexts,
        method: &CSMethod,
        obj: &Obj,
    ) -> ContextId;
}

/// Context insensitive analysis: one context for everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Insensitive;

impl ContextSelector for Insensitive {
    fn select_context(&self, contexts: &mut Contexts, _: &CSCallSite, _: MethodUid) -> ContextId {
        contexts.empty()
    }

    fn select_instance_context(
        &self,
        contexts: &mut Contexts,
        _: &CSCallSite,
        _: &CSObj,
        _: &Obj,
        _: MethodUid,
    ) -> ContextId {
        contexts.empty()
    }

    fn select_heap_context(&self, contexts: &mut Contexts, _: &CSMethod, _: &Obj) -> ContextId {
        contexts.empty()
    }
}

/// k-limited call-site sensitivity.
#[derive(Debug, Clone, Copy)]
pub struct KCallSite {
    pub k: usize,
    pub hk: usize,
}

impl ContextSelector for KCallSite {
    fn select_context(
        &self,
        contexts: &mut Contexts,
        call_site: &CSCallSite,
        _: MethodUid,
    ) -> ContextId {
        contexts.append(
            call_site.context,
            ContextElem::CallSite(call_site.site),
            self.k,
        )
    }

    fn select_instance_context(
        &self,
        contexts: &mut Contexts,
        call_site: &CSCallSite,
        _: &CSObj,
        _: &Obj,
        callee: MethodUid,
    ) -> ContextId {
        self.select_context(contexts, call_site, callee)
    }

    fn select_heap_context(&self, contexts: &mut Contexts, method: &CSMethod, _: &Obj) -> ContextId {
        contexts.truncate(method.context, self.hk)
    }
}

/// k-limited object sensitivity: instance methods are analyzed under the
/// allocation sites of their receivers.
#[derive(Debug, Clone, Copy)]
pub struct KObject {
    pub k: usize,
    pub hk: usize,
}

impl ContextSelector for KObject {
    fn select_context(&self, _: &mut Contexts, call_site: &CSCallSite, _: MethodUid) -> ContextId {
        call_site.context
    }

    fn select_instance_context(
        &self,
        contexts: &mut Contexts,
        _: &CSCallSite,
        recv: &CSObj,
        _: &Obj,
        _: MethodUid,
    ) -> ContextId {
        contexts.append(recv.context, ContextElem::Obj(recv.obj), self.k)
    }

    fn select_heap_context(&self, contexts: &mut Contexts, method: &CSMethod, _: &Obj) -> ContextId {
        contexts.truncate(method.context, self.hk)
    }
}

/// k-limited type sensitivity: like object sensitivity, with the class
/// declaring the allocating method in place of the allocation site.
#[derive(Debug, Clone, Copy)]
pub struct KType {
    pub k: usize,
    pub hk: usize,
}

impl ContextSelector for KType {
    fn select_context(&self, _: &mut Contexts, call_site: &CSCallSite, _: MethodUid) -> ContextId {
        call_site.context
    }

    fn select_instance_context(
        &self,
        contexts: &mut Contexts,
        _: &CSCallSite,
        recv: &CSObj,
        recv_obj: &Obj,
        _: MethodUid,
    ) -> ContextId {
        match recv_obj.container() {
            Some(class) => contexts.append(recv.context, ContextElem::Type(class), self.k),
            None => contexts.truncate(recv.context, self.k),
        }
    }

    fn select_heap_context(&self, contexts: &mut Contexts, method: &CSMethod, _: &Obj) -> ContextId {
        contexts.truncate(method.context, self.hk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pta::arena::Idx;
    use crate::pta::context::CallSite;
    use crate::pta::heap::{AllocSite, HeapModel};
    use crate::repo::Repo;
    use pw_ir::types::Type;
    use pw_ir::Addr;

    struct Fixture {
        repo: Repo,
        heap: HeapModel,
        contexts: Contexts,
    }

    fn fixture() -> Fixture {
        let program = pw_ir::parse(
            "class A\n  static method m()\n    new-instance x, A\n    return-void\n  end\nend\n",
        )
        .unwrap();
        Fixture {
            repo: Repo::from_program(&program).unwrap(),
            heap: HeapModel::new(),
            contexts: Contexts::new(),
        }
    }

    fn site(fx: &Fixture, context: ContextId, addr: usize) -> CSCallSite {
        CSCallSite {
            context,
            site: CallSite {
                method: fx.repo.find_method("A", "m").unwrap().uid(),
                addr: Addr(addr),
            },
        }
    }

    fn obj(fx: &mut Fixture) -> Idx<Obj> {
        let method = fx.repo.find_method("A", "m").unwrap().uid();
        let alloc = AllocSite {
            method,
            addr: Addr(0),
        };
        fx.heap.obj_for_site(&fx.repo, alloc, &Type::class("A"))
    }

    #[test]
    fn insensitive() {
        let mut fx = fixture();
        let o = obj(&mut fx);
        let empty = fx.contexts.empty();
        let cs = site(&fx, empty, 1);
        let callee = cs.site.method;
        let recv = CSObj {
            context: empty,
            obj: o,
        };
        let selector = Insensitive;
        assert_eq!(selector.empty_context(&mut fx.contexts), empty);
        assert_eq!(selector.select_context(&mut fx.contexts, &cs, callee), empty);
        assert_eq!(
            selector.select_instance_context(&mut fx.contexts, &cs, &recv, &fx.heap[o], callee),
            empty
        );
        assert_eq!(fx.contexts.nb_contexts(), 1);
    }

    #[test]
    fn call_site_sensitivity() {
        let mut fx = fixture();
        let o = obj(&mut fx);
        let selector = KCallSite { k: 2, hk: 1 };
        let empty = selector.empty_context(&mut fx.contexts);
        let cs1 = site(&fx, empty, 1);
        let callee = cs1.site.method;

        let c1 = selector.select_context(&mut fx.contexts, &cs1, callee);
        assert_eq!(fx.contexts[c1].elems(), &[ContextElem::CallSite(cs1.site)]);
        // same inputs, same context
        assert_eq!(selector.select_context(&mut fx.contexts, &cs1, callee), c1);

        let cs2 = site(&fx, c1, 2);
        let c2 = selector.select_context(&mut fx.contexts, &cs2, callee);
        let cs3 = site(&fx, c2, 3);
        let c3 = selector.select_context(&mut fx.contexts, &cs3, callee);
        assert_eq!(
            fx.contexts[c3].elems(),
            &[
                ContextElem::CallSite(cs2.site),
                ContextElem::CallSite(cs3.site)
            ]
        );

        let method = CSMethod {
            context: c3,
            method: callee,
        };
        let heap_ctx = selector.select_heap_context(&mut fx.contexts, &method, &fx.heap[o]);
        assert_eq!(
            fx.contexts[heap_ctx].elems(),
            &[ContextElem::CallSite(cs3.site)]
        );
    }

    #[test]
    fn object_sensitivity() {
        let mut fx = fixture();
        let o = obj(&mut fx);
        let selector = KObject { k: 1, hk: 0 };
        let empty = fx.contexts.empty();
        let cs = site(&fx, empty, 1);
        let callee = cs.site.method;
        let recv = CSObj {
            context: empty,
            obj: o,
        };

        let ctx = selector.select_instance_context(&mut fx.contexts, &cs, &recv, &fx.heap[o], callee);
        assert_eq!(fx.contexts[ctx].elems(), &[ContextElem::Obj(o)]);
        // static calls keep the caller context
        let inner = site(&fx, ctx, 2);
        assert_eq!(selector.select_context(&mut fx.contexts, &inner, callee), ctx);
        let method = CSMethod {
            context: ctx,
            method: callee,
        };
        assert_eq!(
            selector.select_heap_context(&mut fx.contexts, &method, &fx.heap[o]),
            empty
        );
    }

    #[test]
    fn type_sensitivity() {
        let mut fx = fixture();
        let o = obj(&mut fx);
        let selector = KType { k: 1, hk: 0 };
        let empty = fx.contexts.empty();
        let cs = site(&fx, empty, 1);
        let callee = cs.site.method;
        let recv = CSObj {
            context: empty,
            obj: o,
        };
        let a = fx.repo.get_class_by_name("A").unwrap().uid();

        let ctx = selector.select_instance_context(&mut fx.contexts, &cs, &recv, &fx.heap[o], callee);
        assert_eq!(fx.contexts[ctx].elems(), &[ContextElem::Type(a)]);

        // no allocating class: the receiver context is kept
        let lit = fx.heap.string_constant(&fx.repo, "s", None);
        let recv = CSObj {
            context: empty,
            obj: lit,
        };
        assert_eq!(
            selector.select_instance_context(&mut fx.contexts, &cs, &recv, &fx.heap[lit], callee),
            empty
        );
    }
}
