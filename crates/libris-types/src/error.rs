use thiserror::Error;

/// Errors produced while parsing or validating foundation types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {kind} id {value:?}: expected a non-negative integer")]
    InvalidId { kind: &'static str, value: String },

    #[error("ISBN must not be empty")]
    EmptyIsbn,

    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },
}
