//! Textual object-oriented IR data structures definitions.
//!
//! A program is a list of class and interface definitions, each declaring
//! fields and methods, plus an optional entry method. Method bodies are flat
//! lists of statements over named locals.

mod addr;
mod parsers;

pub mod classes;
pub mod errors;
pub mod fields;
pub mod locals;
pub mod methods;
pub mod stmts;
pub mod types;

pub use crate::addr::Addr;
pub use crate::parsers::parse_program as parse;

use crate::classes::ClassDef;
use crate::errors::IrResult;
use crate::methods::MethodRef;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A parsed program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub(crate) classes: Vec<ClassDef>,
    pub(crate) entry: Option<MethodRef>,
}

impl Program {
    #[inline]
    pub fn iter_classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.iter()
    }

    #[must_use]
    pub fn get_class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|class| class.class_name() == name)
    }

    /// The declared entry method, if any.
    #[inline]
    #[must_use]
    pub const fn entry(&self) -> Option<&MethodRef> {
        self.entry.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn nb_classes(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn nb_methods(&self) -> usize {
        self.classes
            .iter()
            .map(|class| class.iter_methods().count())
            .sum()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for class in &self.classes {
            writeln!(f, "{class}")?;
        }
        if let Some(entry) = &self.entry {
            writeln!(f, "entry {entry}")?;
        }
        Ok(())
    }
}

/// Reads and parses a program file.
pub fn open<P: AsRef<Path>>(path: P) -> IrResult<Program> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    parse(&contents)
}
