//! Wrappers over `pw_ir` raw structures (classes, methods, etc.)
//! to enrich them and store them in the repository.

mod class;
mod field;
mod method;
mod repository;
mod stmt;
mod uids;

pub use class::Class;
pub use field::{Field, FieldDescr};
pub use method::{Method, MethodDescr, Subsig, Var};
pub use repository::Repo;
pub use stmt::{CallKind, Invoke, Stmt};
pub use uids::{ClassUid, FieldUid, MethodUid, RepoCounters, VarUid};
