use thiserror::Error;

/// Errors produced while parsing or evaluating embedded expressions and
/// while resolving values through the dependency graph.
///
/// Validation failures are not errors in this sense. They travel as data
/// (see [`crate::application::validation`]) because they are expected,
/// user-facing outcomes. `EvalError` covers the cases where an expression
/// or a graph lookup cannot produce a value at all.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("modulo by zero")]
    ModuloByZero,

    #[error("expression nesting exceeds the supported depth")]
    TooDeeplyNested,

    #[error("{name}: {message}")]
    Function { name: String, message: String },

    #[error("circular dependency: {0}")]
    CircularDependency(String),

    #[error("unknown dependency key: {0}")]
    UnknownDependency(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
