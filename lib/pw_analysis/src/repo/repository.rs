//! A repository to centralize the program classes.

use crate::callgraph::CallGraph;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::hierarchy::{ClassHierarchy, Hierarchy};
use crate::repo::stmt::lower_code;
use crate::repo::*;
use pw_ir::classes::ClassDef;
use pw_ir::methods::MethodRef;
use pw_ir::types::JAVA_LANG_OBJECT;
use pw_ir::Program;
use regex::Regex;
use std::collections::{BTreeSet, VecDeque};
use std::ops;

pub struct Repo {
    hierarchy: Hierarchy,
    counters: RepoCounters,
    methods: Vec<Method>,
    fields: Vec<Field>,
    vars: Vec<Var>,
    entry: Option<MethodRef>,
    closed: bool,
}

impl Default for Repo {
    fn default() -> Self {
        Self {
            hierarchy: Hierarchy::new(),
            counters: RepoCounters::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            vars: Vec::new(),
            entry: None,
            closed: false,
        }
    }
}

impl ops::Index<ClassUid> for Repo {
    type Output = Class;

    fn index(&self, cuid: ClassUid) -> &Class {
        self.hierarchy
            .get_class_by_uid(cuid)
            .expect("class uids are only issued for hierarchy nodes")
    }
}

impl ops::Index<MethodUid> for Repo {
    type Output = Method;

    fn index(&self, muid: MethodUid) -> &Method {
        &self.methods[muid.idx()]
    }
}

impl ops::Index<FieldUid> for Repo {
    type Output = Field;

    fn index(&self, fuid: FieldUid) -> &Field {
        &self.fields[fuid.idx()]
    }
}

impl ops::Index<VarUid> for Repo {
    type Output = Var;

    fn index(&self, vuid: VarUid) -> &Var {
        &self.vars[vuid.idx()]
    }
}

impl Repo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a closed repository from a single program.
    pub fn from_program(program: &Program) -> AnalysisResult<Self> {
        let mut repo = Self::new();
        repo.register_program(program)?;
        repo.close_hierarchy()?;
        Ok(repo)
    }

    pub fn register_program(&mut self, program: &Program) -> AnalysisResult<()> {
        if self.closed {
            return Err(AnalysisError::Internal(
                "cannot register a program in a closed repository".to_string(),
            ));
        }

        for class_def in program.iter_classes() {
            self.register_class(class_def)?;
        }

        if let Some(entry) = program.entry() {
            if let Some(previous) = &self.entry {
                log::warn!("entry {} replaces previous entry {}", entry, previous);
            }
            self.entry = Some(entry.clone());
        }

        Ok(())
    }

    fn register_class(&mut self, class_def: &ClassDef) -> AnalysisResult<()> {
        let class_name = class_def.class_name();
        log::trace!("pushing '{}' in repository", class_name);

        let mut uid_to_update = None;
        if let Some(class_h) = self.hierarchy.get_class(class_name) {
            if class_h.is_defined() {
                log::warn!("class '{}' has already been pushed in repository", class_name);
                // no change of the hierarchy nor of the repository for this class
                return Ok(());
            }
            uid_to_update = Some(class_h.uid());
        }

        let class = Class::new(
            uid_to_update.unwrap_or_else(|| self.counters.new_class_uid()),
            class_def,
            &mut self.counters,
            &mut self.methods,
            &mut self.fields,
            &mut self.vars,
        );
        if uid_to_update.is_some() {
            self.hierarchy.update_class(class)?;
        } else {
            self.hierarchy.insert_class(class)?;
        }

        // filling in the hierarchy links
        if let Some(superclass_name) = class_def.superclass() {
            if !self.hierarchy.contains_class(superclass_name) {
                self.hierarchy.insert_class(Class::new_no_def(
                    self.counters.new_class_uid(),
                    superclass_name,
                ))?;
            }
            self.hierarchy.insert_extends(class_name, superclass_name)?;
        }
        for interface_name in class_def.interfaces() {
            if !self.hierarchy.contains_class(interface_name) {
                self.hierarchy.insert_class(Class::new_no_def(
                    self.counters.new_class_uid(),
                    interface_name,
                ))?;
            }
            self.hierarchy.insert_implements(class_name, interface_name)?;
        }

        Ok(())
    }

    /// Completes the class hierarchy and lowers every method body. No more
    /// program can be registered afterwards.
    pub fn close_hierarchy(&mut self) -> AnalysisResult<()> {
        if self.closed {
            return Ok(());
        }
        self.hierarchy.close(&mut self.counters)?;

        let lowered: Vec<(MethodUid, Vec<Stmt>)> = self
            .methods
            .iter()
            .filter_map(|method| {
                method
                    .code()
                    .map(|code| (method.uid(), lower_code(method, code, self)))
            })
            .collect();
        for (muid, stmts) in lowered {
            self.methods[muid.idx()].set_stmts(stmts);
        }

        self.closed = true;
        log::debug!(
            "repository closed: {} classes, {} methods, {} fields, {} variables",
            self.nb_classes(),
            self.nb_methods(),
            self.nb_fields(),
            self.nb_vars()
        );
        Ok(())
    }

    /// Checks if the hierarchy is closed and the method bodies are lowered.
    #[inline]
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    #[inline]
    #[must_use]
    pub const fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[inline]
    pub fn iter_classes(&self) -> impl Iterator<Item = &Class> {
        self.hierarchy.iter_classes()
    }

    pub fn iter_missing_classes(&self) -> impl Iterator<Item = &str> {
        self.hierarchy
            .iter_classes()
            .filter_map(|class| (!class.is_defined()).then(|| class.name()))
    }

    #[inline]
    pub fn iter_methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    pub fn get_class_by_name(&self, name: &str) -> Option<&Class> {
        self.hierarchy.get_class(name)
    }

    pub fn find_classes<'a>(&'a self, pattern: &'a Regex) -> impl Iterator<Item = &'a Class> {
        self.hierarchy
            .iter_classes()
            .filter(|class| pattern.is_match(class.name()))
    }

    /// Finds the first method named `name` declared by class `class_name`.
    pub fn find_method(&self, class_name: &str, name: &str) -> Option<&Method> {
        self.get_class_by_name(class_name)?
            .iter_methods(self)
            .find(|method| method.name() == name)
    }

    /// Finds a variable of a method by its name.
    pub fn find_var(&self, class_name: &str, method_name: &str, var_name: &str) -> Option<VarUid> {
        self.find_method(class_name, method_name)?.var(var_name)
    }

    /// The declared entry method, if it can be found.
    pub fn entry(&self) -> Option<&Method> {
        let entry = self.entry.as_ref()?;
        self.find_method(entry.class_name(), entry.name())
    }

    /// Resolves a field reference: the field declared by the named class
    /// or, failing that, by its nearest ancestor.
    pub fn resolve_field(&self, class_name: &str, field_name: &str) -> Option<&Field> {
        let start = self.get_class_by_name(class_name)?.uid();

        let mut superclass = Some(start);
        while let Some(cuid) = superclass {
            if let Some(field) = self[cuid].get_field(field_name, self) {
                return Some(field);
            }
            superclass = self.superclass_of(cuid);
        }

        // static fields may also be declared by interfaces
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(cuid) = queue.pop_front() {
            if !visited.insert(cuid) {
                continue;
            }
            if let Some(field) = self[cuid].get_field(field_name, self) {
                return Some(field);
            }
            queue.extend(self.superclass_of(cuid));
            queue.extend(self.superinterfaces_of(cuid));
        }
        None
    }

    /// Builds the call graph reachable from the entry method with class
    /// hierarchy analysis.
    pub fn build_callgraph(&self) -> AnalysisResult<CallGraph> {
        CallGraph::build_cha(self)
    }

    /// Checks whether an object of class `type_name1` can be used where a
    /// `type_name2` is expected.
    ///
    /// This method returns `true` if one of the following case occurs:
    ///  - `type_name1` and `type_name2` are the same (in this case, there is no check that
    /// they exist in the class hierarchy),
    ///  - `type_name2` is `java/lang/Object`,
    ///  - there exists a inheritance path leading from `type_name1` to `type_name2`.
    pub fn is_typeable_as(&self, type_name1: &str, type_name2: &str) -> AnalysisResult<bool> {
        if type_name1 == type_name2 || type_name2 == JAVA_LANG_OBJECT {
            return Ok(true);
        }

        let class1 = self
            .hierarchy
            .get_class(type_name1)
            .ok_or_else(|| AnalysisError::ClassNotFound(type_name1.to_string()))?;
        let class2 = self
            .hierarchy
            .get_class(type_name2)
            .ok_or_else(|| AnalysisError::ClassNotFound(type_name2.to_string()))?;

        Ok(self
            .hierarchy
            .all_parents(class1)
            .iter()
            .any(|parent| parent == class2))
    }

    pub fn nb_classes(&self) -> usize {
        self.counters.nb_classes()
    }

    pub fn nb_methods(&self) -> usize {
        self.counters.nb_methods()
    }

    pub fn nb_fields(&self) -> usize {
        self.counters.nb_fields()
    }

    pub fn nb_vars(&self) -> usize {
        self.counters.nb_vars()
    }
}

impl ClassHierarchy for Repo {
    fn resolve_declared_method(&self, class: ClassUid, subsig: &Subsig) -> Option<MethodUid> {
        self[class].get_method(subsig, self).map(Method::uid)
    }

    fn superclass_of(&self, class: ClassUid) -> Option<ClassUid> {
        self.hierarchy.superclass(class)
    }

    fn superinterfaces_of(&self, class: ClassUid) -> Vec<ClassUid> {
        self.hierarchy.interfaces(class)
    }

    fn direct_subclasses_of(&self, class: ClassUid) -> Vec<ClassUid> {
        self.hierarchy.direct_subclasses(class)
    }

    fn direct_implementors_of(&self, interface: ClassUid) -> Vec<ClassUid> {
        self.hierarchy
            .direct_implementers(interface)
            .into_iter()
            .filter(|cuid| !self[*cuid].is_interface())
            .collect()
    }

    fn direct_subinterfaces_of(&self, interface: ClassUid) -> Vec<ClassUid> {
        self.hierarchy
            .direct_implementers(interface)
            .into_iter()
            .filter(|cuid| self[*cuid].is_interface())
            .collect()
    }

    fn is_interface(&self, class: ClassUid) -> bool {
        self[class].is_interface()
    }

    fn is_abstract(&self, method: MethodUid) -> bool {
        self[method].is_abstract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> Repo {
        let program = pw_ir::parse(
            r#"
            interface I
              static field K
            end
            class A implements I
              field f
              method m()
                return-void
              end
            end
            class B extends A
              static method main()
                return-void
              end
            end
            class A
            end
            entry B->main
            "#,
        )
        .unwrap();
        Repo::from_program(&program).unwrap()
    }

    #[test]
    fn registration() {
        let repo = repo();
        // I, A, B and the added java/lang/Object
        assert_eq!(repo.nb_classes(), 4);
        assert_eq!(repo.nb_methods(), 2);
        assert_eq!(repo.iter_missing_classes().collect::<Vec<_>>(), vec![JAVA_LANG_OBJECT]);
        assert_eq!(repo.entry().unwrap().name(), "main");

        let a = repo.get_class_by_name("A").unwrap();
        let m = repo.find_method("A", "m").unwrap();
        assert_eq!(m.class(), a.uid());
        assert!(m.this_var().is_some());
        assert_eq!(repo.find_var("A", "m", "this"), m.this_var());
        assert!(repo.find_method("B", "main").unwrap().this_var().is_none());
    }

    #[test]
    fn fields_resolution() {
        let repo = repo();
        let f = repo.resolve_field("B", "f").unwrap();
        assert_eq!(f.descriptor().to_string(), "A->f");
        let k = repo.resolve_field("B", "K").unwrap();
        assert!(k.is_static());
        assert!(repo.resolve_field("B", "g").is_none());
        assert!(repo.resolve_field("Z", "f").is_none());
    }

    #[test]
    fn hierarchy_queries() {
        let repo = repo();
        let object = repo.get_class_by_name(JAVA_LANG_OBJECT).unwrap().uid();
        let i = repo.get_class_by_name("I").unwrap().uid();
        let a = repo.get_class_by_name("A").unwrap().uid();
        let b = repo.get_class_by_name("B").unwrap().uid();

        assert_eq!(repo.superclass_of(b), Some(a));
        assert_eq!(repo.superclass_of(a), Some(object));
        assert_eq!(repo.superclass_of(object), None);
        assert_eq!(repo.superclass_of(i), None);
        assert_eq!(repo.direct_subclasses_of(a), vec![b]);
        assert_eq!(repo.direct_implementors_of(i), vec![a]);
        assert!(repo.direct_subinterfaces_of(i).is_empty());
        assert!(repo.is_typeable_as("B", "I").unwrap());
        assert!(!repo.is_typeable_as("A", "B").unwrap());
    }
}
