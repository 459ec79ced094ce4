//! Classes data structures.

use crate::fields::FieldDef;
use crate::methods::MethodDef;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    pub struct ClassFlags: u32 {
        const ACC_INTERFACE = 0x0200;
        const ACC_ABSTRACT  = 0x0400;
    }
}

impl fmt::Display for ClassFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.contains(Self::ACC_INTERFACE) {
            write!(f, "interface")
        } else if self.contains(Self::ACC_ABSTRACT) {
            write!(f, "abstract class")
        } else {
            write!(f, "class")
        }
    }
}

/// The class (or interface) definition.
#[derive(Debug, Clone)]
pub struct ClassDef {
    pub(crate) name: String,
    pub(crate) flags: ClassFlags,
    pub(crate) superclass: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) methods: Vec<MethodDef>,
}

impl ClassDef {
    #[must_use]
    pub fn new(name: &str, flags: ClassFlags) -> Self {
        Self {
            name: name.to_string(),
            flags,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Returns the name of the class.
    #[inline]
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.name
    }

    /// Returns the flags of the class.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> ClassFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub const fn is_interface(&self) -> bool {
        self.flags.contains(ClassFlags::ACC_INTERFACE)
    }

    #[inline]
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.flags.contains(ClassFlags::ACC_ABSTRACT)
    }

    /// Returns the name of the superclass if it exists, returns [`None`] otherwise.
    #[inline]
    #[must_use]
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Returns the names of the interfaces implemented by the class (or
    /// extended by the interface).
    #[inline]
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    #[inline]
    pub fn iter_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    #[inline]
    pub fn iter_methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.methods.iter()
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.flags, self.name)?;
        if let Some(superclass) = &self.superclass {
            write!(f, " extends {superclass}")?;
        }
        if !self.interfaces.is_empty() {
            let kw = if self.is_interface() {
                "extends"
            } else {
                "implements"
            };
            write!(f, " {kw} {}", self.interfaces.join(", "))?;
        }
        writeln!(f)?;
        for field in &self.fields {
            writeln!(f, "  {field}")?;
        }
        for method in &self.methods {
            write!(f, "{method}")?;
        }
        writeln!(f, "end")
    }
}
