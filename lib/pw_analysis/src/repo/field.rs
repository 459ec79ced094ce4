use crate::repo::{ClassUid, FieldUid};
use pw_ir::fields::{FieldDef, FieldFlags};
use std::fmt;

/// The enriched field definition.
#[derive(Debug, Clone)]
pub struct Field {
    // Unique identifier in the repository
    uid: FieldUid,
    // Declaring class
    class: ClassUid,
    // Raw field flags
    flags: FieldFlags,
    // Cache of names that identify the field
    descriptor: FieldDescr,
}

impl Field {
    pub(crate) fn new(uid: FieldUid, class: ClassUid, class_name: &str, def: &FieldDef) -> Self {
        Self {
            uid,
            class,
            flags: def.flags(),
            descriptor: FieldDescr {
                class: class_name.to_string(),
                name: def.name().to_string(),
            },
        }
    }

    #[inline]
    pub fn uid(&self) -> FieldUid {
        self.uid
    }

    /// The declaring class.
    #[inline]
    pub fn class(&self) -> ClassUid {
        self.class
    }

    #[inline]
    pub fn descriptor(&self) -> &FieldDescr {
        &self.descriptor
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.descriptor().name()
    }

    #[inline]
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::ACC_STATIC)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FieldDescr {
    class: String,
    name: String,
}

impl fmt::Display for FieldDescr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}", self.class, self.name)
    }
}

impl FieldDescr {
    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}
