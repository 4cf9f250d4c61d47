//! Orin Codegen - AST to JVM Assembly
//!
//! This crate implements the backend of the Orin compiler: it translates the
//! resolver's fully typed AST into label-addressed JVM instruction lists and
//! assembles them into textual class units. The translation is a single
//! synchronous pass per routine; loop constructs are lowered to while-form
//! before code generation so the generators only ever see one loop shape.

pub mod context;
pub mod descriptor;
pub mod error;
pub mod expr;
pub mod init;
pub mod lower;
pub mod program;
pub mod stmt;

pub use context::RoutineCtx;
pub use error::{CodegenError, CodegenResult};
pub use expr::Mode;
pub use program::compile_program;
pub use stmt::RoutineCompiler;
