use std::sync::Arc;

use libris_types::{
    Book, BookId, BookQuery, BookUpdate, Isbn, LoanDate, NewBook, NewLoan, NewStudent, Student,
    StudentId, TransId, Transaction,
};

use crate::error::{StoreError, StoreResult};

/// Books keyed by surrogate id, with a unique ISBN.
///
/// Implementations must refuse any write that would leave
/// `copies_available` negative, whatever path the write takes.
pub trait CatalogStore {
    /// Insert a book and return it with its assigned id.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the ISBN is taken.
    fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book>;

    fn find_book(&self, id: BookId) -> StoreResult<Option<Book>>;

    fn find_book_by_isbn(&self, isbn: &Isbn) -> StoreResult<Option<Book>>;

    /// Apply a partial update; unspecified fields keep their value.
    fn update_book(&mut self, id: BookId, update: &BookUpdate) -> StoreResult<Book>;

    /// Add `delta` to the book's available copies and return the new count.
    ///
    /// The check and the write are a single compare-and-set: the count is
    /// only changed if the result stays within `0..=u32::MAX`, otherwise
    /// [`StoreError::StockOutOfRange`] is returned and nothing changes.
    fn adjust_copies(&mut self, id: BookId, delta: i32) -> StoreResult<u32>;

    /// Delete a book. Returns `true` if it existed.
    ///
    /// Does not consult the ledger; callers enforce the outstanding-loan guard.
    fn delete_book(&mut self, id: BookId) -> StoreResult<bool>;

    /// Books matching the query, ordered by id.
    fn search_books(&self, query: &BookQuery) -> StoreResult<Vec<Book>>;
}

/// Students keyed by surrogate id.
pub trait RosterStore {
    fn insert_student(&mut self, student: &NewStudent) -> StoreResult<Student>;

    fn find_student(&self, id: StudentId) -> StoreResult<Option<Student>>;

    /// Delete a student. Returns `true` if they existed.
    fn delete_student(&mut self, id: StudentId) -> StoreResult<bool>;

    /// All students, ordered by id.
    fn list_students(&self) -> StoreResult<Vec<Student>>;
}

/// Append-mostly log of loan transactions.
///
/// Rows are never deleted. The only mutation is [`LoanLedger::mark_returned`],
/// which succeeds at most once per row.
pub trait LoanLedger {
    /// Record a new outstanding loan with a zero fine.
    ///
    /// Fails with [`StoreError::DuplicateKey`] if the pair already has an
    /// outstanding loan.
    fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Transaction>;

    fn find_loan(&self, id: TransId) -> StoreResult<Option<Transaction>>;

    /// The outstanding loan for the pair, if any. There is never more than one.
    fn find_outstanding(
        &self,
        student: StudentId,
        book: BookId,
    ) -> StoreResult<Option<Transaction>>;

    fn count_outstanding_for_book(&self, book: BookId) -> StoreResult<u64>;

    fn count_outstanding_for_student(&self, student: StudentId) -> StoreResult<u64>;

    /// Set the return date and fine of an outstanding loan.
    ///
    /// Fails with [`StoreError::AlreadyReturned`] if the loan was returned before.
    fn mark_returned(
        &mut self,
        id: TransId,
        return_date: LoanDate,
        fine: u32,
    ) -> StoreResult<Transaction>;

    /// Every loan, newest issue date first; ties broken by descending id.
    fn scan_by_issue_date_desc(&self) -> StoreResult<Vec<Transaction>>;
}

/// A transaction handle exposing all three stores.
pub trait StoreTx: CatalogStore + RosterStore + LoanLedger {}

impl<T: CatalogStore + RosterStore + LoanLedger> StoreTx for T {}

/// A durable library database that can run operations atomically.
///
/// `atomically` runs `op` against a transaction handle. If `op` returns
/// `Ok`, every write it made is committed together; if it returns `Err`,
/// none of them is observable afterwards. Isolation is serializable: the
/// reads `op` performs cannot be invalidated by a concurrent operation
/// before it commits.
pub trait LibraryStore: Send + Sync {
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>;
}

impl<S: LibraryStore> LibraryStore for Arc<S> {
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).atomically(op)
    }
}
