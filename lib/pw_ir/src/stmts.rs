//! IR statements.
//!
//! Statements are kept in their source shape: operands are local names and
//! symbolic references, nothing is resolved at this level.

use crate::fields::FieldRef;
use crate::locals::Local;
use crate::methods::MethodRef;
use crate::types::Type;
use crate::Addr;
use serde::Serialize;
use std::fmt;

/// The invocation instruction flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum InvokeKind {
    Static,
    Direct,
    Super,
    Virtual,
    Interface,
}

impl InvokeKind {
    /// Checks if the first argument of the invocation is a receiver.
    #[inline]
    #[must_use]
    pub const fn has_receiver(self) -> bool {
        !matches!(self, Self::Static)
    }

    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Static => "invoke-static",
            Self::Direct => "invoke-direct",
            Self::Super => "invoke-super",
            Self::Virtual => "invoke-virtual",
            Self::Interface => "invoke-interface",
        }
    }
}

impl fmt::Display for InvokeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// An invocation statement. For instance invocations the receiver is the
/// first element of `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoke {
    pub(crate) kind: InvokeKind,
    pub(crate) args: Vec<Local>,
    pub(crate) method: MethodRef,
    pub(crate) result: Option<Local>,
}

impl Invoke {
    #[must_use]
    pub const fn new(kind: InvokeKind, args: Vec<Local>, method: MethodRef) -> Self {
        Self {
            kind,
            args,
            method,
            result: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> InvokeKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn method(&self) -> &MethodRef {
        &self.method
    }

    /// The receiver variable, for instance invocations.
    #[must_use]
    pub fn receiver(&self) -> Option<&Local> {
        if self.kind.has_receiver() {
            self.args.first()
        } else {
            None
        }
    }

    /// The actual arguments, receiver excluded.
    #[must_use]
    pub fn arguments(&self) -> &[Local] {
        if self.kind.has_receiver() && !self.args.is_empty() {
            &self.args[1..]
        } else {
            &self.args
        }
    }

    #[inline]
    #[must_use]
    pub const fn result(&self) -> Option<&Local> {
        self.result.as_ref()
    }

    pub(crate) fn set_result(&mut self, local: Local) {
        self.result = Some(local);
    }
}

impl fmt::Display for Invoke {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {{", self.kind)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        write!(f, "}}, {}", self.method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Stmt {
    Nop,
    Const(Local, i64),
    ConstString(Local, String),
    NewInstance(Local, Type),
    /// Allocation of an array whose elements are of the given type.
    NewArray(Local, Type),
    Move(Local, Local),
    Iget(Local, Local, FieldRef),
    Iput(Local, Local, FieldRef),
    Sget(Local, FieldRef),
    Sput(Local, FieldRef),
    Aget(Local, Local),
    Aput(Local, Local),
    Invoke(Invoke),
    Return(Local),
    ReturnVoid,
}

impl Stmt {
    /// The assigned result of an invocation statement, if any.
    #[must_use]
    pub fn invoke_result(&self) -> Option<&Local> {
        match self {
            Self::Invoke(invoke) => invoke.result(),
            _ => None,
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Nop => write!(f, "nop"),
            Self::Const(dst, value) => write!(f, "const {dst}, {value}"),
            Self::ConstString(dst, lit) => write!(f, "const-string {dst}, {lit:?}"),
            Self::NewInstance(dst, typ) => write!(f, "new-instance {dst}, {typ}"),
            Self::NewArray(dst, typ) => write!(f, "new-array {dst}, {typ}"),
            Self::Move(dst, src) => write!(f, "move {dst}, {src}"),
            Self::Iget(dst, obj, field) => write!(f, "iget {dst}, {obj}, {field}"),
            Self::Iput(src, obj, field) => write!(f, "iput {src}, {obj}, {field}"),
            Self::Sget(dst, field) => write!(f, "sget {dst}, {field}"),
            Self::Sput(src, field) => write!(f, "sput {src}, {field}"),
            Self::Aget(dst, arr) => write!(f, "aget {dst}, {arr}"),
            Self::Aput(src, arr) => write!(f, "aput {src}, {arr}"),
            Self::Invoke(invoke) => write!(f, "{invoke}"),
            Self::Return(src) => write!(f, "return {src}"),
            Self::ReturnVoid => write!(f, "return-void"),
        }
    }
}

/// A statement along with its address in the method body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledStmt {
    pub(crate) addr: Addr,
    pub(crate) stmt: Stmt,
}

impl LabeledStmt {
    #[inline]
    #[must_use]
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    #[inline]
    #[must_use]
    pub const fn stmt(&self) -> &Stmt {
        &self.stmt
    }
}

impl fmt::Display for LabeledStmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.addr, self.stmt)
    }
}
