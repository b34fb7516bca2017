use libris_types::{BookId, TransId};

/// Errors from catalog, roster, and ledger storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated (ISBN, or a second outstanding loan).
    #[error("duplicate {entity}: {key}")]
    DuplicateKey { entity: &'static str, key: String },

    /// A row addressed by id does not exist.
    #[error("{entity} {id} not found")]
    MissingRow { entity: &'static str, id: i64 },

    /// The write would push `copies_available` below zero (or past `u32::MAX`).
    #[error("stock of book {book} would leave the valid range")]
    StockOutOfRange { book: BookId },

    /// The loan already carries a return date.
    #[error("transaction {0} has already been returned")]
    AlreadyReturned(TransId),

    /// A persisted row could not be decoded.
    #[error("corrupt {table} row: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// A thread panicked while holding the store lock.
    #[error("store lock poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
