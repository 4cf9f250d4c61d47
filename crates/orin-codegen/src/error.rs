//! Code generation errors
//!
//! Nothing here is user-facing: the resolver has already validated the
//! program, so every error below is either an internal-contract violation or
//! an exhausted representation limit. None of them are recoverable;
//! recompiling from the AST is the only recovery path.

use orin_jasm::StackError;
use thiserror::Error;

pub type CodegenResult<T> = Result<T, CodegenError>;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Too many local variables (max 65535)")]
    TooManyLocals,

    #[error("Label space exhausted")]
    TooManyLabels,

    #[error("Invalid break statement (not in loop)")]
    BreakOutsideLoop,

    #[error("Invalid continue statement (not in loop)")]
    ContinueOutsideLoop,

    #[error("Dispatch hash collision between routines {first} and {second}")]
    DispatchHashCollision { first: String, second: String },

    #[error("Stack analysis failed in {method}: {source}")]
    Stack {
        method: String,
        #[source]
        source: StackError,
    },

    #[error("Internal compiler error: {message}")]
    Internal { message: String },
}

impl CodegenError {
    /// Internal-contract violation with a description of the offending node
    pub fn internal(message: impl Into<String>) -> Self {
        CodegenError::Internal {
            message: message.into(),
        }
    }
}
