//! Loan lifecycle engine for Libris.
//!
//! This crate owns the rules that move a book between shelf and borrower:
//! - [`LoanEngine::issue_book`] / [`LoanEngine::return_book`] with their
//!   ordered preconditions
//! - the fine rule in [`fine`] (14-day loan period, 1 unit per late day)
//! - deletion guards that refuse to drop books or students with
//!   outstanding loans
//! - the [`Clock`] seam that supplies "today"
//!
//! Every engine operation runs as one atomic store transaction. The engine
//! returns plain outcome values and never writes receipts or prints.

pub mod clock;
pub mod engine;
pub mod error;
pub mod fine;
pub mod outcome;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::LoanEngine;
pub use error::{LoanError, LoanResult, RecordRef};
pub use fine::{FineAssessment, FINE_PER_DAY, LOAN_PERIOD_DAYS};
pub use outcome::{IssueOutcome, ReturnOutcome};
