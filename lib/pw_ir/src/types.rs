//! IR typing informations.
//!
//! The analysis only needs reference types: a fully-qualified class name, or
//! an array with a number of dimensions over a class type.

use crate::errors::{IrError, IrResult};
use serde::{Serialize, Serializer};
use std::fmt;

/// Root of every class hierarchy.
pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";

/// Type given to string-pool constants.
pub const JAVA_LANG_STRING: &str = "java/lang/String";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Type {
    /// Array of the given type descriptor, with its number of dimensions.
    Array(usize, Box<Self>),
    /// Type of a fully-qualified class
    Class(String),
}

impl Type {
    #[must_use]
    pub fn class(name: &str) -> Self {
        Self::Class(name.to_string())
    }

    /// Builds the array type whose elements are of type `self`.
    #[must_use]
    pub fn array_of(self) -> Self {
        match self {
            Self::Array(n, inner) => Self::Array(n + 1, inner),
            class => Self::Array(1, Box::new(class)),
        }
    }

    pub fn as_class_name(&self) -> IrResult<&str> {
        if let Self::Class(name) = self {
            Ok(name)
        } else {
            Err(IrError::InvalidType(self.to_string()))
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_, _))
    }

    /// Returns a java-like representation of the type.
    #[must_use]
    pub fn to_java_string(&self) -> String {
        match self {
            Self::Array(n, sub) => {
                let mut s = sub.to_java_string();
                for _ in 0..*n {
                    s.push_str("[]");
                }
                s
            }
            Self::Class(name) => name.replace('/', "."),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Array(n, inner) => {
                write!(f, "{inner}")?;
                for _ in 0..*n {
                    write!(f, "[]")?;
                }
                Ok(())
            }
            Self::Class(classname) => write!(f, "{classname}"),
        }
    }
}

impl Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl TryFrom<&str> for Type {
    type Error = IrError;

    fn try_from(s: &str) -> IrResult<Self> {
        let mut name = s.trim();
        let mut dims = 0;
        while let Some(inner) = name.strip_suffix("[]") {
            dims += 1;
            name = inner;
        }
        if name.is_empty()
            || name.contains(char::is_whitespace)
            || name.contains(['[', ']'])
            || dims >= 255
        {
            return Err(IrError::InvalidType(s.to_string()));
        }
        let class = Self::Class(name.to_string());
        if dims == 0 {
            Ok(class)
        } else {
            Ok(Self::Array(dims, Box::new(class)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_from_str() {
        assert_eq!(Type::try_from("A").unwrap(), Type::class("A"));
        assert_eq!(
            Type::try_from("java/lang/String[][]").unwrap(),
            Type::Array(2, Box::new(Type::class(JAVA_LANG_STRING)))
        );
        assert!(Type::try_from("").is_err());
        assert!(Type::try_from("[]").is_err());
        assert!(Type::try_from("A[").is_err());
    }

    #[test]
    fn array_of_adds_a_dimension() {
        let t = Type::class("A").array_of().array_of();
        assert_eq!(t, Type::Array(2, Box::new(Type::class("A"))));
        assert_eq!(t.to_string(), "A[][]");
        assert!(t.as_class_name().is_err());
    }

    #[test]
    fn java_string() {
        assert_eq!(
            Type::try_from("java/lang/Object[]").unwrap().to_java_string(),
            "java.lang.Object[]"
        );
    }
}
