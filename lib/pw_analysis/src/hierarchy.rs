//! Classes hierarchy graph representation, and the hierarchy queries the
//! analyses rely on.

use crate::errors::{AnalysisError, AnalysisResult};
use crate::repo::{Class, ClassUid, MethodUid, RepoCounters, Subsig};
use petgraph::algo::toposort;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use pw_ir::types::JAVA_LANG_OBJECT;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use Direction::{Incoming, Outgoing};

/// Class hierarchy oracle: the queries needed to resolve call targets.
pub trait ClassHierarchy {
    /// The method declared by `class` itself with the given subsignature.
    fn resolve_declared_method(&self, class: ClassUid, subsig: &Subsig) -> Option<MethodUid>;

    fn superclass_of(&self, class: ClassUid) -> Option<ClassUid>;

    /// Interfaces directly implemented by a class, or extended by an interface.
    fn superinterfaces_of(&self, class: ClassUid) -> Vec<ClassUid>;

    fn direct_subclasses_of(&self, class: ClassUid) -> Vec<ClassUid>;

    /// Classes (not interfaces) directly implementing `interface`.
    fn direct_implementors_of(&self, interface: ClassUid) -> Vec<ClassUid>;

    fn direct_subinterfaces_of(&self, interface: ClassUid) -> Vec<ClassUid>;

    fn is_interface(&self, class: ClassUid) -> bool;

    fn is_abstract(&self, method: MethodUid) -> bool;
}

#[derive(Debug, PartialEq, Eq)]
pub enum Inheritance {
    Extends,
    Implements,
}

impl fmt::Display for Inheritance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Extends => write!(f, "<extends>"),
            Self::Implements => write!(f, "<implements>"),
        }
    }
}

#[derive(Debug)]
pub struct Hierarchy {
    inner: DiGraph<Class, Inheritance>,
    node_ids: BTreeMap<String, NodeIndex>,
    uid_ids: BTreeMap<ClassUid, NodeIndex>,
}

impl Hierarchy {
    pub(crate) fn new() -> Self {
        Self {
            inner: DiGraph::new(),
            node_ids: BTreeMap::new(),
            uid_ids: BTreeMap::new(),
        }
    }

    pub(crate) fn insert_class(&mut self, class: Class) -> AnalysisResult<()> {
        if self.node_ids.contains_key(class.name()) {
            return Err(AnalysisError::Internal(
                "duplicate object in hierarchy graph".to_string(),
            ));
        }

        let class_name = class.name().to_string();
        let class_uid = class.uid();
        let id = self.inner.add_node(class);
        self.node_ids.insert(class_name, id);
        self.uid_ids.insert(class_uid, id);
        Ok(())
    }

    pub(crate) fn update_class(&mut self, class: Class) -> AnalysisResult<()> {
        if let Some(id) = self.node_ids.get(class.name()) {
            self.inner[*id] = class;
            Ok(())
        } else {
            Err(AnalysisError::ClassNotFound(class.name().to_string()))
        }
    }

    pub(crate) fn contains_class(&self, class_name: &str) -> bool {
        self.node_ids.contains_key(class_name)
    }

    pub fn iter_classes(&self) -> impl Iterator<Item = &Class> {
        self.inner.node_weights()
    }

    pub(crate) fn insert_extends(&mut self, class: &str, superclass: &str) -> AnalysisResult<()> {
        self.insert_link(class, superclass, Inheritance::Extends)
    }

    pub(crate) fn insert_implements(&mut self, class: &str, interface: &str) -> AnalysisResult<()> {
        self.insert_link(class, interface, Inheritance::Implements)
    }

    fn insert_link(&mut self, from: &str, to: &str, link: Inheritance) -> AnalysisResult<()> {
        let src = self
            .node_ids
            .get(from)
            .ok_or_else(|| AnalysisError::ClassNotFound(from.to_string()))?;
        let dst = self
            .node_ids
            .get(to)
            .ok_or_else(|| AnalysisError::ClassNotFound(to.to_string()))?;
        self.inner.add_edge(*src, *dst, link);
        Ok(())
    }

    /// Adds `java/lang/Object` if needed, and makes it the superclass of
    /// every class without one. Fails on inheritance cycles.
    pub(crate) fn close(&mut self, counters: &mut RepoCounters) -> AnalysisResult<()> {
        if let Err(cycle) = toposort(&self.inner, None) {
            let class_name = self.inner[cycle.node_id()].name().to_string();
            log::error!("class {} inherits from itself", class_name);
            return Err(AnalysisError::CyclicHierarchy(class_name));
        }

        if !self.contains_class(JAVA_LANG_OBJECT) {
            self.insert_class(Class::new_no_def(
                counters.new_class_uid(),
                JAVA_LANG_OBJECT,
            ))?;
        }

        let orphans: Vec<String> = self
            .inner
            .node_indices()
            .filter(|id| {
                let class = &self.inner[*id];
                class.name() != JAVA_LANG_OBJECT
                    && !class.is_interface()
                    && self.superclass_node(*id).is_none()
            })
            .map(|id| self.inner[id].name().to_string())
            .collect();

        for class_name in orphans {
            if self.get_class(&class_name).map_or(false, Class::is_defined) {
                log::debug!("add missing java.lang.Object inheritance to {}", class_name);
            } else {
                log::warn!(
                    "add missing java.lang.Object inheritance to undefined class {}",
                    class_name
                );
            }
            self.insert_extends(&class_name, JAVA_LANG_OBJECT)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get_class(&self, class_name: &str) -> Option<&Class> {
        self.node_ids.get(class_name).map(|id| &self.inner[*id])
    }

    #[must_use]
    pub fn get_class_by_uid(&self, class: ClassUid) -> Option<&Class> {
        self.uid_ids.get(&class).map(|id| &self.inner[*id])
    }

    fn superclass_node(&self, id: NodeIndex) -> Option<NodeIndex> {
        self.inner
            .edges_directed(id, Outgoing)
            .find(|edge| *edge.weight() == Inheritance::Extends)
            .map(|edge| edge.target())
    }

    fn neighbors(&self, class: ClassUid, direction: Direction, link: Inheritance) -> Vec<ClassUid> {
        let Some(id) = self.uid_ids.get(&class) else {
            return Vec::new();
        };
        let mut neighbors: Vec<ClassUid> = self
            .inner
            .edges_directed(*id, direction)
            .filter(|edge| *edge.weight() == link)
            .map(|edge| {
                let other = if direction == Outgoing {
                    edge.target()
                } else {
                    edge.source()
                };
                self.inner[other].uid()
            })
            .collect();
        neighbors.sort();
        neighbors.dedup();
        neighbors
    }

    #[must_use]
    pub fn superclass(&self, class: ClassUid) -> Option<ClassUid> {
        let id = self.uid_ids.get(&class)?;
        self.superclass_node(*id).map(|sid| self.inner[sid].uid())
    }

    /// Interfaces directly implemented (or extended, for interfaces).
    #[must_use]
    pub fn interfaces(&self, class: ClassUid) -> Vec<ClassUid> {
        self.neighbors(class, Outgoing, Inheritance::Implements)
    }

    #[must_use]
    pub fn direct_subclasses(&self, class: ClassUid) -> Vec<ClassUid> {
        self.neighbors(class, Incoming, Inheritance::Extends)
    }

    /// Classes and interfaces directly implementing or extending an interface.
    #[must_use]
    pub fn direct_implementers(&self, interface: ClassUid) -> Vec<ClassUid> {
        self.neighbors(interface, Incoming, Inheritance::Implements)
    }

    #[must_use]
    pub fn all_parents(&self, class: &Class) -> BTreeSet<Class> {
        let mut parents = BTreeSet::new();
        let Some(id) = self.node_ids.get(class.name()) else {
            return parents;
        };
        let mut dfs = Dfs::new(&self.inner, *id);
        while let Some(id) = dfs.next(&self.inner) {
            parents.insert(self.inner[id].clone());
        }
        parents
    }

    #[must_use]
    pub fn to_dot(&self) -> String {
        format!(
            "{}",
            Dot::with_attr_getters(
                &self.inner,
                &[Config::EdgeNoLabel],
                &|_, edge| {
                    let style = match edge.weight() {
                        Inheritance::Extends => "solid",
                        Inheritance::Implements => "dashed",
                    };
                    format!("arrowType=empty,style={style}")
                },
                &|_, (_, class)| {
                    let (color, shape) = if !class.is_defined() {
                        ("black", "none")
                    } else if class.is_interface() {
                        ("#00000088", "ellipse")
                    } else {
                        ("black", "box")
                    };
                    format!("color={color},shape={shape}")
                }
            )
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::AnalysisError;
    use crate::repo::Repo;

    #[test]
    fn close_links_orphans_to_object() {
        let program = pw_ir::parse(
            "interface I\nend\nclass A extends Z implements I\nend\nclass B\nend\n",
        )
        .unwrap();
        let repo = Repo::from_program(&program).unwrap();
        let h = repo.hierarchy();
        let object = h.get_class("java/lang/Object").unwrap().uid();
        let z = h.get_class("Z").unwrap();
        assert!(!z.is_defined());
        assert_eq!(h.superclass(z.uid()), Some(object));
        assert_eq!(h.superclass(h.get_class("B").unwrap().uid()), Some(object));
        assert_eq!(h.superclass(h.get_class("I").unwrap().uid()), None);
        assert_eq!(h.superclass(object), None);
        assert_eq!(h.direct_subclasses(object).len(), 2);
    }

    #[test]
    fn inheritance_cycles_are_rejected() {
        for text in [
            "class A extends B\nend\nclass B extends A\nend\n",
            "class A extends A\nend\n",
            "interface I extends J\nend\ninterface J extends I\nend\n",
        ] {
            let program = pw_ir::parse(text).unwrap();
            assert!(
                matches!(
                    Repo::from_program(&program),
                    Err(AnalysisError::CyclicHierarchy(_))
                ),
                "{text}"
            );
        }
    }

    #[test]
    fn dot_output() {
        let program = pw_ir::parse("interface I\nend\nclass A implements I\nend\n").unwrap();
        let repo = Repo::from_program(&program).unwrap();
        let dot = repo.hierarchy().to_dot();
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("style=dashed"));
        assert!(dot.contains("style=solid"));
        assert!(dot.contains("shape=ellipse"));
    }
}
