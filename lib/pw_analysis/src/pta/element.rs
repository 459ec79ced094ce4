//! Context-sensitive elements and pointers, with the points-to set of every
//! pointer.

use crate::pta::arena::{Arena, Idx};
use crate::pta::context::{CallSite, ContextId};
use crate::pta::heap::ObjId;
use crate::pta::pts::PointsToSet;
use crate::repo::{FieldUid, MethodUid, VarUid};
use std::ops;

pub type CSObjId = Idx<CSObj>;
pub type CSMethodId = Idx<CSMethod>;
pub type PointerId = Idx<Pointer>;

/// A variable under a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSVar {
    pub context: ContextId,
    pub var: VarUid,
}

/// An object under its heap context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSObj {
    pub context: ContextId,
    pub obj: ObjId,
}

/// A method under a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSMethod {
    pub context: ContextId,
    pub method: MethodUid,
}

/// A call site under the context of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CSCallSite {
    pub context: ContextId,
    pub site: CallSite,
}

impl CSCallSite {
    /// The calling method under its context.
    pub fn caller(&self) -> CSMethod {
        CSMethod {
            context: self.context,
            method: self.site.method,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pointer {
    Var(CSVar),
    InstanceField(CSObjId, FieldUid),
    /// Static fields have no context.
    StaticField(FieldUid),
    /// Every element of an array object.
    ArrayIndex(CSObjId),
}

/// Canonical store of the context-sensitive elements and pointers.
#[derive(Debug, Default)]
pub struct CSManager {
    cs_objs: Arena<CSObj>,
    cs_methods: Arena<CSMethod>,
    pointers: Arena<Pointer>,
    pts: Vec<PointsToSet>,
}

impl ops::Index<CSObjId> for CSManager {
    type Output = CSObj;

    fn index(&self, obj: CSObjId) -> &CSObj {
        &self.cs_objs[obj]
    }
}

impl ops::Index<CSMethodId> for CSManager {
    type Output = CSMethod;

    fn index(&self, method: CSMethodId) -> &CSMethod {
        &self.cs_methods[method]
    }
}

impl ops::Index<PointerId> for CSManager {
    type Output = Pointer;

    fn index(&self, ptr: PointerId) -> &Pointer {
        &self.pointers[ptr]
    }
}

impl CSManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cs_obj(&mut self, context: ContextId, obj: ObjId) -> CSObjId {
        self.cs_objs.intern(CSObj { context, obj })
    }

    pub fn cs_method(&mut self, context: ContextId, method: MethodUid) -> CSMethodId {
        self.cs_methods.intern(CSMethod { context, method })
    }

    fn pointer(&mut self, ptr: Pointer) -> PointerId {
        let id = self.pointers.intern(ptr);
        if id.index() == self.pts.len() {
            self.pts.push(PointsToSet::new());
        }
        id
    }

    pub fn var_ptr(&mut self, context: ContextId, var: VarUid) -> PointerId {
        self.pointer(Pointer::Var(CSVar { context, var }))
    }

    pub fn instance_field_ptr(&mut self, obj: CSObjId, field: FieldUid) -> PointerId {
        self.pointer(Pointer::InstanceField(obj, field))
    }

    pub fn static_field_ptr(&mut self, field: FieldUid) -> PointerId {
        self.pointer(Pointer::StaticField(field))
    }

    pub fn array_index_ptr(&mut self, obj: CSObjId) -> PointerId {
        self.pointer(Pointer::ArrayIndex(obj))
    }

    /// Finds a pointer without creating it.
    pub fn lookup(&self, ptr: &Pointer) -> Option<PointerId> {
        self.pointers.lookup(ptr)
    }

    pub fn lookup_cs_method(&self, context: ContextId, method: MethodUid) -> Option<CSMethodId> {
        self.cs_methods.lookup(&CSMethod { context, method })
    }

    #[inline]
    pub fn points_to(&self, ptr: PointerId) -> &PointsToSet {
        &self.pts[ptr.index()]
    }

    /// Adds objects to the points-to set of a pointer, returns the objects
    /// that were not already in it.
    pub fn add_points_to(&mut self, ptr: PointerId, delta: &PointsToSet) -> PointsToSet {
        self.pts[ptr.index()].add_all(delta)
    }

    pub fn iter_pointers(&self) -> impl Iterator<Item = (PointerId, &Pointer)> {
        self.pointers.iter()
    }

    pub fn nb_pointers(&self) -> usize {
        self.pointers.len()
    }

    pub fn nb_cs_objs(&self) -> usize {
        self.cs_objs.len()
    }

    pub fn nb_cs_methods(&self) -> usize {
        self.cs_methods.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pta::context::Contexts;
    use crate::repo::RepoCounters;

    #[test]
    fn pointers_are_canonical() {
        let mut counters = RepoCounters::new();
        let var = counters.new_var_uid();
        let field = counters.new_field_uid();
        let contexts = Contexts::new();
        let mut csm = CSManager::new();

        let p = csm.var_ptr(contexts.empty(), var);
        assert_eq!(csm.var_ptr(contexts.empty(), var), p);
        let o = csm.cs_obj(contexts.empty(), Idx::new(0));
        let f = csm.instance_field_ptr(o, field);
        let s = csm.static_field_ptr(field);
        let a = csm.array_index_ptr(o);
        assert_eq!(csm.nb_pointers(), 4);
        assert_ne!(f, s);
        assert_eq!(csm[a], Pointer::ArrayIndex(o));
        assert_eq!(csm.lookup(&Pointer::StaticField(field)), Some(s));
        assert!(csm.points_to(f).is_empty());
    }

    #[test]
    fn points_to_sets_only_grow() {
        let mut counters = RepoCounters::new();
        let var = counters.new_var_uid();
        let contexts = Contexts::new();
        let mut csm = CSManager::new();
        let p = csm.var_ptr(contexts.empty(), var);
        let o1 = csm.cs_obj(contexts.empty(), Idx::new(0));
        let o2 = csm.cs_obj(contexts.empty(), Idx::new(1));

        let diff = csm.add_points_to(p, &PointsToSet::singleton(o1));
        assert_eq!(diff, PointsToSet::singleton(o1));
        let diff = csm.add_points_to(p, &[o1, o2].into_iter().collect());
        assert_eq!(diff, PointsToSet::singleton(o2));
        assert!(csm.add_points_to(p, &PointsToSet::singleton(o2)).is_empty());
        assert_eq!(csm.points_to(p).len(), 2);
    }
}
