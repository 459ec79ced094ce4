//! Abstract objects: one per allocation site, string literal or entry
//! argument.

use crate::pta::arena::{Arena, Idx};
use crate::repo::{ClassUid, MethodUid, Repo};
use pw_ir::types::{Type, JAVA_LANG_OBJECT, JAVA_LANG_STRING};
use pw_ir::Addr;
use std::ops;

pub type ObjId = Idx<Obj>;

/// A statement position in a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AllocSite {
    pub method: MethodUid,
    pub addr: Addr,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjKind {
    NewInstance(AllocSite),
    NewArray(AllocSite),
    /// A string pool entry, with its site when string objects are not
    /// merged per literal.
    StringConstant {
        lit: String,
        site: Option<AllocSite>,
    },
    /// Mock object given to a typed parameter of the entry method.
    EntryArgument { method: MethodUid, index: usize },
    /// Mock receiver of an instance entry method.
    EntryReceiver(MethodUid),
}

/// The abstract object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Obj {
    kind: ObjKind,
    typ: Type,
    // Runtime class used for dispatch, if known
    class: Option<ClassUid>,
    // Class declaring the allocating method
    container: Option<ClassUid>,
}

impl Obj {
    #[inline]
    pub fn kind(&self) -> &ObjKind {
        &self.kind
    }

    #[inline]
    pub fn typ(&self) -> &Type {
        &self.typ
    }

    /// The class an instance call on this object is dispatched from.
    #[inline]
    pub fn class(&self) -> Option<ClassUid> {
        self.class
    }

    /// The class declaring the method that allocated the object.
    #[inline]
    pub fn container(&self) -> Option<ClassUid> {
        self.container
    }

    /// Describes the object with the names found in the repository.
    pub fn describe(&self, repo: &Repo) -> String {
        match &self.kind {
            ObjKind::NewInstance(site) | ObjKind::NewArray(site) => {
                format!("new {} @ {}:{}", self.typ, repo[site.method], site.addr)
            }
            ObjKind::StringConstant { lit, site: None } => format!("{lit:?}"),
            ObjKind::StringConstant {
                lit,
                site: Some(site),
            } => format!("{lit:?} @ {}:{}", repo[site.method], site.addr),
            ObjKind::EntryArgument { method, index } => {
                format!("{} argument #{index} of {}", self.typ, repo[*method])
            }
            ObjKind::EntryReceiver(method) => {
                format!("{} receiver of {}", self.typ, repo[*method])
            }
        }
    }
}

/// The heap model, owner of every abstract object.
#[derive(Debug, Default)]
pub struct HeapModel {
    objs: Arena<Obj>,
}

impl ops::Index<ObjId> for HeapModel {
    type Output = Obj;

    fn index(&self, obj: ObjId) -> &Obj {
        &self.objs[obj]
    }
}

impl HeapModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn runtime_class(repo: &Repo, typ: &Type) -> Option<ClassUid> {
        let name = match typ {
            Type::Class(name) => name.as_str(),
            // arrays only have the methods of java/lang/Object
            Type::Array(_, _) => JAVA_LANG_OBJECT,
        };
        let class = repo.get_class_by_name(name);
        if class.is_none() {
            log::debug!("no class found for objects of type {}", typ);
        }
        class.map(|class| class.uid())
    }

    /// The object allocated by a `new-instance` or `new-array` statement.
    pub fn obj_for_site(&mut self, repo: &Repo, site: AllocSite, typ: &Type) -> ObjId {
        let kind = if typ.is_array() {
            ObjKind::NewArray(site)
        } else {
            ObjKind::NewInstance(site)
        };
        self.objs.intern(Obj {
            kind,
            typ: typ.clone(),
            class: Self::runtime_class(repo, typ),
            container: Some(repo[site.method].class()),
        })
    }

    /// The object of a string literal; with `site` set, one object per site
    /// instead of one per literal.
    pub fn string_constant(&mut self, repo: &Repo, lit: &str, site: Option<AllocSite>) -> ObjId {
        let typ = Type::class(JAVA_LANG_STRING);
        self.objs.intern(Obj {
            kind: ObjKind::StringConstant {
                lit: lit.to_string(),
                site,
            },
            class: Self::runtime_class(repo, &typ),
            container: site.map(|site| repo[site.method].class()),
            typ,
        })
    }

    pub fn entry_argument(
        &mut self,
        repo: &Repo,
        method: MethodUid,
        index: usize,
        typ: &Type,
    ) -> ObjId {
        self.objs.intern(Obj {
            kind: ObjKind::EntryArgument { method, index },
            typ: typ.clone(),
            class: Self::runtime_class(repo, typ),
            container: Some(repo[method].class()),
        })
    }

    pub fn entry_receiver(&mut self, repo: &Repo, method: MethodUid) -> ObjId {
        let class = repo[method].class();
        self.objs.intern(Obj {
            kind: ObjKind::EntryReceiver(method),
            typ: Type::class(repo[class].name()),
            class: Some(class),
            container: Some(class),
        })
    }

    pub fn nb_objs(&self) -> usize {
        self.objs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_object_per_site() {
        let program = pw_ir::parse(
            "class A\n  static method m()\n    new-instance x, A\n    new-array y, A\n    return-void\n  end\nend\n",
        )
        .unwrap();
        let repo = Repo::from_program(&program).unwrap();
        let m = repo.find_method("A", "m").unwrap().uid();
        let a = repo.get_class_by_name("A").unwrap().uid();
        let object = repo.get_class_by_name(JAVA_LANG_OBJECT).unwrap().uid();
        let mut heap = HeapModel::new();

        let site = AllocSite {
            method: m,
            addr: Addr(0),
        };
        let o1 = heap.obj_for_site(&repo, site, &Type::class("A"));
        assert_eq!(heap.obj_for_site(&repo, site, &Type::class("A")), o1);
        assert_eq!(heap[o1].class(), Some(a));
        assert_eq!(heap[o1].container(), Some(a));
        assert_eq!(heap[o1].describe(&repo), "new A @ A->m/0:0000");

        let arr_site = AllocSite {
            method: m,
            addr: Addr(1),
        };
        let o2 = heap.obj_for_site(&repo, arr_site, &Type::class("A").array_of());
        assert_ne!(o1, o2);
        assert!(matches!(heap[o2].kind(), ObjKind::NewArray(_)));
        assert_eq!(heap[o2].class(), Some(object));

        // unknown runtime class
        let o3 = heap.obj_for_site(&repo, arr_site, &Type::class("Z"));
        assert_eq!(heap[o3].class(), None);
        assert_eq!(heap.nb_objs(), 3);
    }

    #[test]
    fn string_constants() {
        let repo = Repo::from_program(&pw_ir::parse("class A\nend\n").unwrap()).unwrap();
        let mut heap = HeapModel::new();
        let s1 = heap.string_constant(&repo, "hello", None);
        assert_eq!(heap.string_constant(&repo, "hello", None), s1);
        assert_ne!(heap.string_constant(&repo, "world", None), s1);
        assert_eq!(heap[s1].describe(&repo), "\"hello\"");
        assert_eq!(heap[s1].typ(), &Type::class(JAVA_LANG_STRING));
    }
}
