//! Methods definitions, bodies and references.

use crate::locals::Local;
use crate::stmts::LabeledStmt;
use crate::types::Type;
use crate::Addr;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    pub struct MethodFlags: u32 {
        const ACC_STATIC   = 0x0008;
        const ACC_NATIVE   = 0x0100;
        const ACC_ABSTRACT = 0x0400;
    }
}

impl fmt::Display for MethodFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.contains(Self::ACC_STATIC) {
            write!(f, "static ")?;
        }
        if self.contains(Self::ACC_ABSTRACT) {
            write!(f, "abstract ")?;
        }
        if self.contains(Self::ACC_NATIVE) {
            write!(f, "native ")?;
        }
        Ok(())
    }
}

/// A declared method parameter, with its optional declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub(crate) local: Local,
    pub(crate) typ: Option<Type>,
}

impl Param {
    #[must_use]
    pub const fn new(local: Local, typ: Option<Type>) -> Self {
        Self { local, typ }
    }

    #[inline]
    #[must_use]
    pub const fn local(&self) -> &Local {
        &self.local
    }

    #[inline]
    #[must_use]
    pub const fn typ(&self) -> Option<&Type> {
        self.typ.as_ref()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.typ {
            Some(typ) => write!(f, "{}: {typ}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// A method body: its statements, addressed by position.
#[derive(Debug, Clone, Default)]
pub struct Code {
    pub(crate) stmts: Vec<LabeledStmt>,
}

impl Code {
    #[inline]
    pub fn iter_stmts(&self) -> impl Iterator<Item = &LabeledStmt> {
        self.stmts.iter()
    }

    #[inline]
    #[must_use]
    pub fn stmts_count(&self) -> usize {
        self.stmts.len()
    }

    #[must_use]
    pub fn stmt_at(&self, addr: Addr) -> Option<&LabeledStmt> {
        self.stmts.get(addr.0)
    }
}

/// The method definition.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub(crate) name: String,
    pub(crate) flags: MethodFlags,
    pub(crate) params: Vec<Param>,
    pub(crate) code: Option<Code>,
}

impl MethodDef {
    #[must_use]
    pub fn new(name: &str, flags: MethodFlags, params: Vec<Param>) -> Self {
        Self {
            name: name.to_string(),
            flags,
            params,
            code: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Declared parameters, receiver excluded.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[inline]
    #[must_use]
    pub const fn code(&self) -> Option<&Code> {
        self.code.as_ref()
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

impl fmt::Display for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "  {}method {}(", self.flags, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}")?;
        }
        writeln!(f, ")")?;
        if let Some(code) = &self.code {
            for lstmt in code.iter_stmts() {
                writeln!(f, "    {}", lstmt.stmt())?;
                if let Some(result) = lstmt.stmt().invoke_result() {
                    writeln!(f, "    move-result {result}")?;
                }
            }
            writeln!(f, "  end")?;
        }
        Ok(())
    }
}

/// A symbolic method reference, as written at a call site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MethodRef {
    pub(crate) class: String,
    pub(crate) name: String,
}

impl MethodRef {
    #[must_use]
    pub fn new(class: &str, name: &str) -> Self {
        Self {
            class: class.to_string(),
            name: name.to_string(),
        }
    }

    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.class, self.name)
    }
}
