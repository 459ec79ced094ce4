use crate::repo::stmt::{source_locals, Stmt};
use crate::repo::*;
use pw_ir::locals::THIS;
use pw_ir::methods::{Code, MethodDef, MethodFlags};
use pw_ir::types::Type;
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a method inside its class: its name and its arity (receiver
/// excluded).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subsig {
    name: String,
    arity: usize,
}

impl Subsig {
    #[must_use]
    pub fn new(name: &str, arity: usize) -> Self {
        Self {
            name: name.to_string(),
            arity,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Display for Subsig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.arity)
    }
}

/// A wrapper to cache the identifying names of a method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MethodDescr {
    class: String,
    subsig: Subsig,
}

impl fmt::Display for MethodDescr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.class, self.subsig)
    }
}

impl MethodDescr {
    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn subsig(&self) -> &Subsig {
        &self.subsig
    }
}

/// A method local variable.
#[derive(Debug, Clone)]
pub struct Var {
    uid: VarUid,
    method: MethodUid,
    name: String,
}

impl Var {
    #[inline]
    pub fn uid(&self) -> VarUid {
        self.uid
    }

    /// The method declaring the variable.
    #[inline]
    pub fn method(&self) -> MethodUid {
        self.method
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The enriched method definition.
#[derive(Debug, Clone)]
pub struct Method {
    // Unique identifier in the repository
    uid: MethodUid,
    // Declaring class
    class: ClassUid,
    // Cache of names that identify the method
    descriptor: MethodDescr,
    flags: MethodFlags,
    // Implicit receiver variable, for instance methods
    this: Option<VarUid>,
    params: Vec<VarUid>,
    param_types: Vec<Option<Type>>,
    vars: BTreeMap<String, VarUid>,
    // Source body, if any
    code: Option<Code>,
    // Analysis statements, lowered from the source body when the hierarchy is closed
    stmts: Vec<Stmt>,
    ret_vars: Vec<VarUid>,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.descriptor)
    }
}

impl Method {
    pub(crate) fn new(
        uid: MethodUid,
        class: ClassUid,
        class_name: &str,
        def: &MethodDef,
        counters: &mut RepoCounters,
        vars: &mut Vec<Var>,
    ) -> Self {
        let mut method_vars = BTreeMap::new();
        let mut new_var = |name: &str| -> VarUid {
            *method_vars.entry(name.to_string()).or_insert_with(|| {
                let var_uid = counters.new_var_uid();
                vars.push(Var {
                    uid: var_uid,
                    method: uid,
                    name: name.to_string(),
                });
                var_uid
            })
        };

        let this = (!def.is_static()).then(|| new_var(THIS));
        let params = def
            .params()
            .iter()
            .map(|param| new_var(param.local().name()))
            .collect();
        if let Some(code) = def.code() {
            for lstmt in code.iter_stmts() {
                for local in source_locals(lstmt.stmt()) {
                    new_var(local.name());
                }
            }
        }

        Self {
            uid,
            class,
            descriptor: MethodDescr {
                class: class_name.to_string(),
                subsig: Subsig::new(def.name(), def.params().len()),
            },
            flags: def.flags(),
            this,
            params,
            param_types: def.params().iter().map(|p| p.typ().cloned()).collect(),
            vars: method_vars,
            code: def.code().cloned(),
            stmts: Vec::new(),
            ret_vars: Vec::new(),
        }
    }

    pub(crate) fn set_stmts(&mut self, stmts: Vec<Stmt>) {
        self.ret_vars = stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Return(var) => Some(*var),
                _ => None,
            })
            .collect();
        self.stmts = stmts;
    }

    #[inline]
    pub fn uid(&self) -> MethodUid {
        self.uid
    }

    /// The declaring class.
    #[inline]
    pub fn class(&self) -> ClassUid {
        self.class
    }

    #[inline]
    pub fn descriptor(&self) -> &MethodDescr {
        &self.descriptor
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor.subsig.name()
    }

    #[inline]
    pub fn subsig(&self) -> &Subsig {
        self.descriptor.subsig()
    }

    #[inline]
    pub fn class_name(&self) -> &str {
        self.descriptor.class_name()
    }

    /// The implicit `this` variable, for instance methods.
    #[inline]
    pub fn this_var(&self) -> Option<VarUid> {
        self.this
    }

    /// Parameter variables, receiver excluded.
    #[inline]
    pub fn params(&self) -> &[VarUid] {
        &self.params
    }

    /// Declared parameter types, receiver excluded.
    #[inline]
    pub fn param_types(&self) -> &[Option<Type>] {
        &self.param_types
    }

    /// Finds a local variable of the method by its name.
    pub fn var(&self, name: &str) -> Option<VarUid> {
        self.vars.get(name).copied()
    }

    pub fn iter_vars(&self) -> impl Iterator<Item = VarUid> + '_ {
        self.vars.values().copied()
    }

    /// The source body, if any.
    #[must_use]
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.code.is_some()
    }

    /// The analysis statements of the body.
    #[inline]
    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    /// Variables returned by the method.
    #[inline]
    pub fn ret_vars(&self) -> &[VarUid] {
        &self.ret_vars
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_STATIC)
    }

    #[inline]
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_ABSTRACT)
    }

    #[inline]
    #[must_use]
    pub const fn is_native(&self) -> bool {
        self.flags.contains(MethodFlags::ACC_NATIVE)
    }
}
