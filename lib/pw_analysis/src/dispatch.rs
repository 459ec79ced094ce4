//! Method dispatch over the class hierarchy.

use crate::hierarchy::ClassHierarchy;
use crate::repo::{CallKind, ClassUid, Invoke, MethodUid, Repo, Subsig};
use std::collections::{BTreeSet, VecDeque};

/// Looks up the method that an object of class `class` runs for `subsig`:
/// the first non-abstract declaration up the superclass chain, or failing
/// that a default method of a superinterface (breadth-first).
pub fn dispatch<H>(h: &H, class: ClassUid, subsig: &Subsig) -> Option<MethodUid>
where
    H: ClassHierarchy + ?Sized,
{
    let mut chain = Vec::new();
    let mut current = Some(class);
    while let Some(cuid) = current {
        if let Some(muid) = h.resolve_declared_method(cuid, subsig) {
            if !h.is_abstract(muid) {
                return Some(muid);
            }
        }
        chain.push(cuid);
        current = h.superclass_of(cuid);
    }

    let mut visited = BTreeSet::new();
    let mut queue: VecDeque<ClassUid> = chain
        .iter()
        .flat_map(|cuid| h.superinterfaces_of(*cuid))
        .collect();
    while let Some(iuid) = queue.pop_front() {
        if !visited.insert(iuid) {
            continue;
        }
        if let Some(muid) = h.resolve_declared_method(iuid, subsig) {
            if !h.is_abstract(muid) {
                return Some(muid);
            }
        }
        queue.extend(h.superinterfaces_of(iuid));
    }

    None
}

/// Resolves the callee of a call site. Static and special calls are
/// resolved from the class named at the call site, virtual and interface
/// calls from the runtime class of the receiver object.
pub fn resolve_callee(repo: &Repo, recv_class: Option<ClassUid>, invoke: &Invoke) -> Option<MethodUid> {
    let class = match invoke.kind() {
        CallKind::Static | CallKind::Special => {
            repo.get_class_by_name(invoke.class_name())?.uid()
        }
        CallKind::Virtual | CallKind::Interface => recv_class?,
    };
    let callee = dispatch(repo, class, invoke.subsig());
    if callee.is_none() {
        log::debug!(
            "no target for {} on class {}",
            invoke,
            repo[class].name()
        );
    }
    callee
}

/// Resolves the possible callees of a call site with class hierarchy
/// analysis: virtual and interface calls are dispatched on every subclass
/// and implementor of the class named at the call site.
pub fn cha_targets(repo: &Repo, invoke: &Invoke) -> BTreeSet<MethodUid> {
    let mut targets = BTreeSet::new();
    let Some(declared) = repo.get_class_by_name(invoke.class_name()) else {
        log::debug!("unknown class for {}", invoke);
        return targets;
    };

    match invoke.kind() {
        CallKind::Static | CallKind::Special => {
            targets.extend(dispatch(repo, declared.uid(), invoke.subsig()));
        }
        CallKind::Virtual | CallKind::Interface => {
            let mut visited = BTreeSet::new();
            let mut queue = VecDeque::from([declared.uid()]);
            while let Some(cuid) = queue.pop_front() {
                if !visited.insert(cuid) {
                    continue;
                }
                if repo.is_interface(cuid) {
                    queue.extend(repo.direct_implementors_of(cuid));
                    queue.extend(repo.direct_subinterfaces_of(cuid));
                } else {
                    targets.extend(dispatch(repo, cuid, invoke.subsig()));
                    queue.extend(repo.direct_subclasses_of(cuid));
                }
            }
        }
    }
    targets
}
