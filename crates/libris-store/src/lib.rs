//! Storage for the Libris catalog, roster, and loan ledger.
//!
//! The three logical stores are expressed as traits that a single
//! transaction handle implements, so that an operation touching books,
//! students, and loans commits or rolls back as one unit.
//!
//! # Traits
//!
//! - [`CatalogStore`] -- books keyed by id and unique ISBN
//! - [`RosterStore`] -- students
//! - [`LoanLedger`] -- append-mostly transaction log
//! - [`LibraryStore`] -- runs a closure atomically against all three
//!
//! # Backends
//!
//! - [`InMemoryLibrary`] -- `BTreeMap` tables behind a mutex, for tests and embedding
//! - [`SqliteLibrary`] -- durable SQLite database via `rusqlite`
//!
//! # Design Rules
//!
//! 1. `copies_available` never goes negative; every backend refuses the write.
//! 2. ISBNs are unique; violations surface as [`StoreError::DuplicateKey`].
//! 3. At most one outstanding loan per (student, book) pair.
//! 4. A loan is returned at most once ([`StoreError::AlreadyReturned`]).
//! 5. An error returned from an atomic closure discards every write it made.

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryLibrary, MemoryTables};
pub use sqlite::{SqliteLibrary, SqliteOptions, SqliteTx};
pub use traits::{CatalogStore, LibraryStore, LoanLedger, RosterStore, StoreTx};
