//! Fields definitions and references.

use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    pub struct FieldFlags: u32 {
        const ACC_STATIC = 0x0008;
    }
}

/// A field declared by a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) flags: FieldFlags,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: &str, flags: FieldFlags) -> Self {
        Self {
            name: name.to_string(),
            flags,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> FieldFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::ACC_STATIC)
    }
}

impl fmt::Display for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_static() {
            write!(f, "static ")?;
        }
        write!(f, "field {}", self.name)
    }
}

/// A symbolic field reference, as written at an access site. The class is
/// the one named at the site, not necessarily the declaring one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FieldRef {
    pub(crate) class: String,
    pub(crate) name: String,
}

impl FieldRef {
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

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.class, self.name)
    }
}
