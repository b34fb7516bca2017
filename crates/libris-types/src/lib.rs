//! Foundation types for Libris.
//!
//! This crate provides the identity, temporal, and record types shared by the
//! store backends, the loan engine, and the command-line front end. Every
//! other Libris crate depends on `libris-types`.
//!
//! # Key Types
//!
//! - [`BookId`], [`StudentId`], [`TransId`]: surrogate row identities
//! - [`Isbn`]: validated, unique catalog key
//! - [`LoanDate`]: calendar date with whole-day arithmetic
//! - [`Book`], [`Student`], [`Transaction`]: persisted records
//! - [`NewBook`], [`BookUpdate`], [`NewStudent`], [`NewLoan`]: write inputs

pub mod error;
pub mod identity;
pub mod records;
pub mod temporal;

pub use error::TypeError;
pub use identity::{BookId, Isbn, StudentId, TransId};
pub use records::{
    Book, BookQuery, BookUpdate, LoanFilter, LoanHistoryEntry, NewBook, NewLoan, NewStudent,
    SearchField, Student, Transaction,
};
pub use temporal::LoanDate;
