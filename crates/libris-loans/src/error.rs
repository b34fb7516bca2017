use std::fmt;

use serde::Serialize;

use libris_store::StoreError;
use libris_types::{Isbn, StudentId, TransId, TypeError};

/// The record an error refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RecordRef {
    Student(StudentId),
    Book(Isbn),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student(id) => write!(f, "student {id}"),
            Self::Book(isbn) => write!(f, "book {isbn}"),
        }
    }
}

/// Errors produced by loan engine operations.
///
/// Every variant is recoverable. When an operation fails, the store is left
/// exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum LoanError {
    #[error("{0} not found")]
    NotFound(RecordRef),

    #[error("duplicate {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    #[error("book {title:?} ({isbn}) is not currently available")]
    Unavailable { isbn: Isbn, title: String },

    #[error("student {student} already has {title:?} ({isbn}) on loan")]
    AlreadyIssued {
        student: StudentId,
        isbn: Isbn,
        title: String,
    },

    #[error("no outstanding loan of book {isbn} for student {student}")]
    NoOutstandingLoan { student: StudentId, isbn: Isbn },

    #[error("transaction {0} has already been returned")]
    AlreadyReturned(TransId),

    #[error("{subject} is referenced by {outstanding} outstanding loan(s)")]
    ReferencedByOutstandingLoan { subject: RecordRef, outstanding: u64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for LoanError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { entity, key } => Self::DuplicateKey { entity, key },
            StoreError::AlreadyReturned(id) => Self::AlreadyReturned(id),
            other => Self::Store(other),
        }
    }
}

impl From<TypeError> for LoanError {
    fn from(err: TypeError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result alias for engine operations.
pub type LoanResult<T> = Result<T, LoanError>;
