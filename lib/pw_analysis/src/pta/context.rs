//! Calling contexts: bounded sequences of context elements, interned so that
//! equal contexts share one handle.

use crate::pta::arena::{Arena, Idx};
use crate::pta::heap::{HeapModel, ObjId};
use crate::repo::{ClassUid, MethodUid, Repo};
use pw_ir::Addr;
use std::fmt::Write;
use std::ops;

pub type ContextId = Idx<Context>;

/// A call statement position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallSite {
    pub method: MethodUid,
    pub addr: Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextElem {
    CallSite(CallSite),
    Obj(ObjId),
    Type(ClassUid),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Context(Vec<ContextElem>);

impl Context {
    #[inline]
    pub fn elems(&self) -> &[ContextElem] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Keeps the `k` most recent elements.
    fn last(&self, k: usize) -> Self {
        let skip = self.0.len().saturating_sub(k);
        Self(self.0[skip..].to_vec())
    }
}

/// The context store, the empty context being always present.
#[derive(Debug)]
pub struct Contexts {
    arena: Arena<Context>,
    empty: ContextId,
}

impl Default for Contexts {
    fn default() -> Self {
        let mut arena = Arena::new();
        let empty = arena.intern(Context::default());
        Self { arena, empty }
    }
}

impl ops::Index<ContextId> for Contexts {
    type Output = Context;

    fn index(&self, ctx: ContextId) -> &Context {
        &self.arena[ctx]
    }
}

impl Contexts {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn empty(&self) -> ContextId {
        self.empty
    }

    /// Appends `elem` to `ctx` and keeps the `k` most recent elements.
    pub fn append(&mut self, ctx: ContextId, elem: ContextElem, k: usize) -> ContextId {
        if k == 0 {
            return self.empty;
        }
        let mut elems = self.arena[ctx].0.clone();
        elems.push(elem);
        let context = Context(elems).last(k);
        self.arena.intern(context)
    }

    /// Keeps the `k` most recent elements of `ctx`.
    pub fn truncate(&mut self, ctx: ContextId, k: usize) -> ContextId {
        if self.arena[ctx].len() <= k {
            return ctx;
        }
        let context = self.arena[ctx].last(k);
        self.arena.intern(context)
    }

    pub fn nb_contexts(&self) -> usize {
        self.arena.len()
    }

    pub fn describe(&self, ctx: ContextId, repo: &Repo, heap: &HeapModel) -> String {
        let mut res = String::from("[");
        for (i, elem) in self.arena[ctx].elems().iter().enumerate() {
            if i > 0 {
                res.push_str(", ");
            }
            match elem {
                ContextElem::CallSite(site) => write!(res, "{}:{}", repo[site.method], site.addr),
                ContextElem::Obj(obj) => write!(res, "{}", heap[*obj].describe(repo)),
                ContextElem::Type(class) => write!(res, "{}", repo[*class].name()),
            }
            .expect("writing to a String cannot fail");
        }
        res.push(']');
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RepoCounters;

    fn site(counters: &mut RepoCounters, addr: usize) -> ContextElem {
        ContextElem::CallSite(CallSite {
            method: counters.new_method_uid(),
            addr: Addr(addr),
        })
    }

    #[test]
    fn k_limiting() {
        let mut counters = RepoCounters::new();
        let (s1, s2, s3) = (site(&mut counters, 1), site(&mut counters, 2), site(&mut counters, 3));
        let mut contexts = Contexts::new();
        let empty = contexts.empty();
        assert!(contexts[empty].is_empty());

        let c1 = contexts.append(empty, s1, 2);
        let c12 = contexts.append(c1, s2, 2);
        let c23 = contexts.append(c12, s3, 2);
        assert_eq!(contexts[c12].elems(), &[s1, s2]);
        assert_eq!(contexts[c23].elems(), &[s2, s3]);

        // equal content, equal handle
        let c2 = contexts.append(empty, s2, 2);
        assert_eq!(contexts.append(c2, s3, 2), c23);
        assert_eq!(contexts.truncate(c23, 1), contexts.append(empty, s3, 1));
        assert_eq!(contexts.truncate(c23, 2), c23);
        assert_eq!(contexts.truncate(c23, 0), empty);
        assert_eq!(contexts.append(c23, s1, 0), empty);
    }

    #[test]
    fn descriptions() {
        use crate::pta::heap::AllocSite;
        use pw_ir::types::Type;

        let program = pw_ir::parse(
            "class A\n  static method m()\n    new-instance x, A\n    return-void\n  end\nend\n",
        )
        .unwrap();
        let repo = Repo::from_program(&program).unwrap();
        let m = repo.find_method("A", "m").unwrap().uid();
        let a = repo.get_class_by_name("A").unwrap().uid();
        let mut heap = HeapModel::new();
        let obj = heap.obj_for_site(
            &repo,
            AllocSite {
                method: m,
                addr: Addr(0),
            },
            &Type::class("A"),
        );

        let mut contexts = Contexts::new();
        let empty = contexts.empty();
        assert_eq!(contexts.describe(empty, &repo, &heap), "[]");
        let call = ContextElem::CallSite(CallSite {
            method: m,
            addr: Addr(1),
        });
        let ctx = contexts.append(empty, call, 3);
        let ctx = contexts.append(ctx, ContextElem::Obj(obj), 3);
        let ctx = contexts.append(ctx, ContextElem::Type(a), 3);
        assert_eq!(
            contexts.describe(ctx, &repo, &heap),
            "[A->m/0:0001, new A @ A->m/0:0000, A]"
        );
    }
}
