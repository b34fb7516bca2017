//! Values returned by successful lifecycle operations.
//!
//! They carry everything a receipt needs, resolved inside the same store
//! transaction that made the change.

use serde::Serialize;

use libris_types::{BookId, Isbn, LoanDate, StudentId, TransId};

/// Result of a successful issue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IssueOutcome {
    pub trans_id: TransId,
    pub student_id: StudentId,
    pub student_name: String,
    pub book_id: BookId,
    pub book_title: String,
    pub isbn: Isbn,
    pub issue_date: LoanDate,
    /// Last day the book can be returned without a fine.
    pub due_date: LoanDate,
    /// Copies left on the shelf after this issue.
    pub copies_remaining: u32,
}

/// Result of a successful return.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    pub trans_id: TransId,
    pub student_id: StudentId,
    pub student_name: String,
    pub book_id: BookId,
    pub book_title: String,
    pub isbn: Isbn,
    pub issue_date: LoanDate,
    pub return_date: LoanDate,
    pub late_days: u32,
    pub fine: u32,
    pub copies_remaining: u32,
}

impl ReturnOutcome {
    pub fn was_late(&self) -> bool {
        self.late_days > 0
    }
}
