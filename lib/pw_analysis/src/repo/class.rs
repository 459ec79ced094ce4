use crate::repo::*;
use pw_ir::classes::{ClassDef, ClassFlags};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// The enriched class definition.
#[derive(Debug, Clone)]
pub struct Class {
    // Unique identifier in the repository
    uid: ClassUid,
    // Class flags, only known for classes defined by the program
    flags: Option<ClassFlags>,
    // Cache of name that identify the class
    name: String,
    // List of contained methods (declaration level)
    methods: Vec<MethodUid>,
    // List of contained fields (declaration level)
    fields: Vec<FieldUid>,
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        self.uid == other.uid
    }
}

impl Eq for Class {}

impl PartialOrd for Class {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Class {
    fn cmp(&self, other: &Self) -> Ordering {
        self.uid.cmp(&other.uid)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Class {
    /// Builds an enriched class definition from a raw program definition,
    /// registering its methods, fields and variables.
    pub(crate) fn new(
        class_uid: ClassUid,
        class_def: &ClassDef,
        counters: &mut RepoCounters,
        methods: &mut Vec<Method>,
        fields: &mut Vec<Field>,
        vars: &mut Vec<Var>,
    ) -> Self {
        let name = class_def.class_name();
        let mut class_methods = Vec::new();
        let mut class_fields = Vec::new();
        for method_def in class_def.iter_methods() {
            let method_uid = counters.new_method_uid();
            let new_method = Method::new(method_uid, class_uid, name, method_def, counters, vars);
            if class_methods
                .iter()
                .any(|muid: &MethodUid| methods[muid.idx()].subsig() == new_method.subsig())
            {
                log::warn!(
                    "method {} is declared twice, only the first declaration is used for dispatch",
                    new_method.descriptor()
                );
            }
            methods.push(new_method);
            class_methods.push(method_uid);
        }
        for field_def in class_def.iter_fields() {
            let field_uid = counters.new_field_uid();
            fields.push(Field::new(field_uid, class_uid, name, field_def));
            class_fields.push(field_uid);
        }

        Self {
            uid: class_uid,
            flags: Some(class_def.flags()),
            name: name.to_string(),
            methods: class_methods,
            fields: class_fields,
        }
    }

    /// Builds a class known only by name, referenced but not defined.
    pub(crate) fn new_no_def(class_uid: ClassUid, name: &str) -> Self {
        Self {
            uid: class_uid,
            flags: None,
            name: name.to_string(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    #[inline]
    pub fn uid(&self) -> ClassUid {
        self.uid
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.flags.is_some()
    }

    /// Returns a iterator over all methods declared in the class.
    pub fn iter_methods<'a>(&'a self, repo: &'a Repo) -> impl Iterator<Item = &'a Method> {
        self.methods.iter().map(|muid| &repo[*muid])
    }

    /// Returns the method declared with the given subsignature, if any.
    pub fn get_method<'a>(&'a self, subsig: &Subsig, repo: &'a Repo) -> Option<&'a Method> {
        self.iter_methods(repo).find(|meth| meth.subsig() == subsig)
    }

    pub fn find_methods<'a>(
        &'a self,
        pattern: &'a Regex,
        repo: &'a Repo,
    ) -> impl Iterator<Item = &'a Method> {
        self.iter_methods(repo)
            .filter(|m| pattern.is_match(m.name()))
    }

    pub fn iter_fields<'a>(&'a self, repo: &'a Repo) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().map(|fuid| &repo[*fuid])
    }

    pub fn get_field<'a>(&'a self, name: &str, repo: &'a Repo) -> Option<&'a Field> {
        self.iter_fields(repo).find(|field| field.name() == name)
    }

    #[inline]
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags
            .map_or(false, |flags| flags.contains(ClassFlags::ACC_INTERFACE))
    }

    #[inline]
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags
            .map_or(false, |flags| flags.contains(ClassFlags::ACC_ABSTRACT))
    }
}
