//! Orin AST - Resolver Output Contract
//!
//! This crate defines the data the semantic resolver hands to the backend:
//! resolved, alias-free semantic types and a fully typed AST in which every
//! implicit conversion is an explicit cast node. The backend performs no
//! semantic validation of its own; anything that violates this contract is
//! an upstream bug.

pub mod ast;
pub mod types;

pub use ast::{
    Assign, BinaryOp, Block, Decl, Expr, ExprKind, ForEach, ForRange, If, Param, Print, Program,
    Return, Routine, RoutineCall, Stmt, Target, UnaryOp, VarDecl, While,
};
pub use types::{Field, Primitive, Type};
