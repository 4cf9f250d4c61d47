//! Orin Jasm - JVM Assembly Entity Model
//!
//! Label-addressed instruction lists, class/field/method entities, textual
//! Jasmin rendering, and the static stack-depth estimator that computes
//! `.limit stack` for finished methods.

pub mod class;
pub mod emit;
pub mod instr;
pub mod stack;

pub use class::{access, Class, Field, Method};
pub use emit::render_class;
pub use instr::{ArrayElem, Cond, Const, Instr, Label};
pub use stack::{max_stack, StackError};
