//! Analysis statements, lowered from the source IR.
//!
//! Lowering resolves locals to [`VarUid`]s and field references to the
//! declaring [`FieldUid`]. Statements that carry no pointer information
//! (numeric constants, `nop`, `return-void`) are dropped.

use crate::repo::*;
use pw_ir::fields::FieldRef;
use pw_ir::locals::Local;
use pw_ir::methods::Code;
use pw_ir::stmts::{self as ir, InvokeKind};
use pw_ir::types::Type;
use pw_ir::Addr;
use serde::Serialize;
use std::fmt;

/// Call kinds of call graph edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallKind {
    Static,
    /// Exact call: constructors, private methods and super calls.
    Special,
    Virtual,
    Interface,
}

impl From<InvokeKind> for CallKind {
    fn from(kind: InvokeKind) -> Self {
        match kind {
            InvokeKind::Static => Self::Static,
            InvokeKind::Direct | InvokeKind::Super => Self::Special,
            InvokeKind::Virtual => Self::Virtual,
            InvokeKind::Interface => Self::Interface,
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Special => write!(f, "special"),
            Self::Virtual => write!(f, "virtual"),
            Self::Interface => write!(f, "interface"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoke {
    addr: Addr,
    kind: CallKind,
    class: String,
    subsig: Subsig,
    recv: Option<VarUid>,
    args: Vec<VarUid>,
    result: Option<VarUid>,
}

impl Invoke {
    /// Address of the call site in the caller body.
    #[inline]
    pub fn addr(&self) -> Addr {
        self.addr
    }

    #[inline]
    pub fn kind(&self) -> CallKind {
        self.kind
    }

    /// Name of the class referenced at the call site.
    #[inline]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    #[inline]
    pub fn subsig(&self) -> &Subsig {
        &self.subsig
    }

    #[inline]
    pub fn recv(&self) -> Option<VarUid> {
        self.recv
    }

    /// Argument variables, receiver excluded.
    #[inline]
    pub fn args(&self) -> &[VarUid] {
        &self.args
    }

    #[inline]
    pub fn result(&self) -> Option<VarUid> {
        self.result
    }
}

impl fmt::Display for Invoke {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {} {}->{}", self.addr, self.kind, self.class, self.subsig)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `dst = new T`
    New { addr: Addr, dst: VarUid, typ: Type },
    /// `dst = new T[]`, `typ` being the array type
    NewArray { addr: Addr, dst: VarUid, typ: Type },
    /// `dst = "lit"`
    ConstString { addr: Addr, dst: VarUid, lit: String },
    /// `dst = src`
    Copy { dst: VarUid, src: VarUid },
    /// `dst = base.field`
    LoadField {
        dst: VarUid,
        base: VarUid,
        field: FieldUid,
    },
    /// `base.field = src`
    StoreField {
        base: VarUid,
        field: FieldUid,
        src: VarUid,
    },
    /// `dst = C.field`
    LoadStatic { dst: VarUid, field: FieldUid },
    /// `C.field = src`
    StoreStatic { field: FieldUid, src: VarUid },
    /// `dst = base[*]`
    LoadArray { dst: VarUid, base: VarUid },
    /// `base[*] = src`
    StoreArray { base: VarUid, src: VarUid },
    Invoke(Invoke),
    Return(VarUid),
}

impl Stmt {
    /// The variable whose points-to set the statement effect depends on:
    /// the base of instance field and array accesses, the receiver of
    /// instance calls.
    #[must_use]
    pub fn base_var(&self) -> Option<VarUid> {
        match self {
            Self::LoadField { base, .. }
            | Self::StoreField { base, .. }
            | Self::LoadArray { base, .. }
            | Self::StoreArray { base, .. } => Some(*base),
            Self::Invoke(invoke) => invoke.recv(),
            _ => None,
        }
    }
}

/// Every local mentioned by a source statement.
pub(crate) fn source_locals(stmt: &ir::Stmt) -> Vec<&Local> {
    match stmt {
        ir::Stmt::Nop | ir::Stmt::ReturnVoid => Vec::new(),
        ir::Stmt::Const(dst, _)
        | ir::Stmt::ConstString(dst, _)
        | ir::Stmt::NewInstance(dst, _)
        | ir::Stmt::NewArray(dst, _)
        | ir::Stmt::Sget(dst, _)
        | ir::Stmt::Sput(dst, _)
        | ir::Stmt::Return(dst) => vec![dst],
        ir::Stmt::Move(a, b)
        | ir::Stmt::Iget(a, b, _)
        | ir::Stmt::Iput(a, b, _)
        | ir::Stmt::Aget(a, b)
        | ir::Stmt::Aput(a, b) => vec![a, b],
        ir::Stmt::Invoke(invoke) => {
            let mut locals: Vec<&Local> = invoke.receiver().into_iter().collect();
            locals.extend(invoke.arguments());
            locals.extend(invoke.result());
            locals
        }
    }
}

/// Lowers a method source body into analysis statements.
pub(crate) fn lower_code(method: &Method, code: &Code, repo: &Repo) -> Vec<Stmt> {
    code.iter_stmts()
        .filter_map(|lstmt| lower_stmt(lstmt, method, repo))
        .collect()
}

fn lower_stmt(lstmt: &ir::LabeledStmt, method: &Method, repo: &Repo) -> Option<Stmt> {
    let addr = lstmt.addr();
    let var = |local: &Local| -> Option<VarUid> {
        let var = method.var(local.name());
        if var.is_none() {
            log::error!("unregistered local '{}' in {}", local, method);
        }
        var
    };
    let field = |fref: &FieldRef, is_static: bool| -> Option<FieldUid> {
        match repo.resolve_field(fref.class_name(), fref.name()) {
            Some(field) if field.is_static() == is_static => Some(field.uid()),
            Some(field) => {
                log::warn!(
                    "{} {}: field {} accessed as {}, statement skipped",
                    method,
                    addr,
                    field.descriptor(),
                    if is_static { "static" } else { "instance" }
                );
                None
            }
            None => {
                log::warn!(
                    "{} {}: unresolvable field {}, statement skipped",
                    method,
                    addr,
                    fref
                );
                None
            }
        }
    };

    let stmt = match lstmt.stmt() {
        ir::Stmt::Nop | ir::Stmt::Const(_, _) | ir::Stmt::ReturnVoid => return None,
        ir::Stmt::NewInstance(dst, typ) => Stmt::New {
            addr,
            dst: var(dst)?,
            typ: typ.clone(),
        },
        ir::Stmt::NewArray(dst, elem) => Stmt::NewArray {
            addr,
            dst: var(dst)?,
            typ: elem.clone().array_of(),
        },
        ir::Stmt::ConstString(dst, lit) => Stmt::ConstString {
            addr,
            dst: var(dst)?,
            lit: lit.clone(),
        },
        ir::Stmt::Move(dst, src) => Stmt::Copy {
            dst: var(dst)?,
            src: var(src)?,
        },
        ir::Stmt::Iget(dst, base, fref) => Stmt::LoadField {
            dst: var(dst)?,
            base: var(base)?,
            field: field(fref, false)?,
        },
        ir::Stmt::Iput(src, base, fref) => Stmt::StoreField {
            base: var(base)?,
            field: field(fref, false)?,
            src: var(src)?,
        },
        ir::Stmt::Sget(dst, fref) => Stmt::LoadStatic {
            dst: var(dst)?,
            field: field(fref, true)?,
        },
        ir::Stmt::Sput(src, fref) => Stmt::StoreStatic {
            field: field(fref, true)?,
            src: var(src)?,
        },
        ir::Stmt::Aget(dst, base) => Stmt::LoadArray {
            dst: var(dst)?,
            base: var(base)?,
        },
        ir::Stmt::Aput(src, base) => Stmt::StoreArray {
            base: var(base)?,
            src: var(src)?,
        },
        ir::Stmt::Invoke(invoke) => {
            let recv = match invoke.receiver() {
                Some(recv) => Some(var(recv)?),
                None => None,
            };
            let result = match invoke.result() {
                Some(result) => Some(var(result)?),
                None => None,
            };
            Stmt::Invoke(Invoke {
                addr,
                kind: invoke.kind().into(),
                class: invoke.method().class_name().to_string(),
                subsig: Subsig::new(invoke.method().name(), invoke.arguments().len()),
                recv,
                args: invoke
                    .arguments()
                    .iter()
                    .map(&var)
                    .collect::<Option<Vec<_>>>()?,
                result,
            })
        }
        ir::Stmt::Return(src) => Stmt::Return(var(src)?),
    };
    Some(stmt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowering() {
        let program = pw_ir::parse(
            r#"
            class A
              field f
              static field s
              static method main()
                new-instance a, A
                const n, 3
                iput a, a, A->f
                iget b, a, B->f
                sput b, A->s
                iget c, a, A->missing
                new-array arr, A
                aput a, arr
                invoke-virtual {a, b}, A->m
                move-result r
                return r
              end
            end
            class B extends A
            end
            "#,
        )
        .unwrap();
        let repo = Repo::from_program(&program).unwrap();
        let a = repo.get_class_by_name("A").unwrap();
        let main = repo.find_method("A", "main").unwrap();
        let f = a.get_field("f", &repo).unwrap().uid();
        let var = |name| main.var(name).unwrap();

        let stmts = main.stmts();
        // const and the unresolvable field load are dropped
        assert_eq!(stmts.len(), 8);
        assert_eq!(
            stmts[1],
            Stmt::StoreField {
                base: var("a"),
                field: f,
                src: var("a")
            }
        );
        // B->f resolves to the field declared by A
        assert_eq!(
            stmts[2],
            Stmt::LoadField {
                dst: var("b"),
                base: var("a"),
                field: f
            }
        );
        assert!(matches!(&stmts[4], Stmt::NewArray { typ, .. } if typ.is_array()));
        let Stmt::Invoke(invoke) = &stmts[6] else {
            panic!("expected an invocation");
        };
        assert_eq!(invoke.kind(), CallKind::Virtual);
        assert_eq!(invoke.recv(), Some(var("a")));
        assert_eq!(invoke.args(), &[var("b")]);
        assert_eq!(invoke.result(), Some(var("r")));
        assert_eq!(invoke.subsig(), &Subsig::new("m", 1));
        assert_eq!(invoke.addr(), Addr(8));
        assert_eq!(stmts[6].base_var(), Some(var("a")));
        assert_eq!(main.ret_vars(), &[var("r")]);
    }
}
