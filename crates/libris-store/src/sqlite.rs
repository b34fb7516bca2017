use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, info};

use libris_types::{
    Book, BookId, BookQuery, BookUpdate, Isbn, LoanDate, NewBook, NewLoan, NewStudent,
    SearchField, Student, StudentId, TransId, Transaction,
};

use crate::error::{StoreError, StoreResult};
use crate::schema::{SCHEMA, SCHEMA_VERSION};
use crate::traits::{CatalogStore, LibraryStore, LoanLedger, RosterStore, StoreTx};

/// Connection settings for [`SqliteLibrary`].
#[derive(Clone, Debug)]
pub struct SqliteOptions {
    /// How long a write waits for a lock held by another connection before
    /// failing with `SQLITE_BUSY`.
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5_000),
        }
    }
}

/// Library database backed by a single SQLite connection.
///
/// Every atomic operation is a `BEGIN IMMEDIATE` transaction: the database
/// write lock is taken before the first read, so precondition reads cannot
/// be invalidated by another connection before commit. Within the process
/// the connection is serialized by a mutex.
pub struct SqliteLibrary {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteLibrary {
    /// Open (or create) a database file and bootstrap the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(path, &SqliteOptions::default())
    }

    pub fn open_with(path: impl AsRef<Path>, options: &SqliteOptions) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let library = Self::bootstrap(conn, options, path.display().to_string())?;
        info!(path = %path.display(), "opened library database");
        Ok(library)
    }

    /// A private in-memory database, mainly for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::bootstrap(conn, &SqliteOptions::default(), ":memory:".into())
    }

    fn bootstrap(conn: Connection, options: &SqliteOptions, location: String) -> StoreResult<Self> {
        conn.busy_timeout(options.busy_timeout)?;
        conn.execute_batch(SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
        debug!(location = %location, version = SCHEMA_VERSION, "schema ready");
        Ok(Self {
            conn: Mutex::new(conn),
            location,
        })
    }

    /// Where the database lives (`:memory:` for in-memory databases).
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl LibraryStore for SqliteLibrary {
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| E::from(StoreError::from(e)))?;
        let mut handle = SqliteTx { tx };
        match op(&mut handle) {
            Ok(value) => {
                handle
                    .tx
                    .commit()
                    .map_err(|e| E::from(StoreError::from(e)))?;
                Ok(value)
            }
            Err(err) => {
                // Dropping the handle rolls the transaction back.
                debug!(location = %self.location, "operation failed; rolling back");
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for SqliteLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLibrary")
            .field("location", &self.location)
            .finish()
    }
}

/// An open `BEGIN IMMEDIATE` transaction on a [`SqliteLibrary`].
pub struct SqliteTx<'c> {
    tx: rusqlite::Transaction<'c>,
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let isbn: String = row.get(3)?;
    let isbn = Isbn::parse(&isbn)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Book {
        id: BookId::new(row.get(0)?),
        title: row.get(1)?,
        author: row.get(2)?,
        isbn,
        copies_available: row.get(4)?,
    })
}

fn student_from_row(row: &Row<'_>) -> rusqlite::Result<Student> {
    Ok(Student {
        id: StudentId::new(row.get(0)?),
        name: row.get(1)?,
        class: row.get(2)?,
        roll_no: row.get(3)?,
    })
}

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: TransId::new(row.get(0)?),
        student_id: StudentId::new(row.get(1)?),
        book_id: BookId::new(row.get(2)?),
        issue_date: LoanDate::from_naive(row.get::<_, NaiveDate>(3)?),
        return_date: row.get::<_, Option<NaiveDate>>(4)?.map(LoanDate::from_naive),
        fine: row.get(5)?,
    })
}

/// Map a unique-constraint failure to [`StoreError::DuplicateKey`].
fn duplicate_or(err: rusqlite::Error, entity: &'static str, key: impl FnOnce() -> String) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            StoreError::DuplicateKey { entity, key: key() }
        }
        _ => StoreError::Sqlite(err),
    }
}

fn count_to_u64(count: i64, table: &'static str) -> StoreResult<u64> {
    u64::try_from(count).map_err(|_| StoreError::CorruptRow {
        table,
        reason: format!("negative count {count}"),
    })
}

/// `LIKE` pattern matching `keyword` anywhere, with wildcards escaped.
fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

// ---------------------------------------------------------------------------
// Store implementations
// ---------------------------------------------------------------------------

impl CatalogStore for SqliteTx<'_> {
    fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book> {
        let id = self
            .tx
            .prepare_cached(
                "INSERT INTO Books (Title, Author, ISBN, CopiesAvailable) VALUES (?1, ?2, ?3, ?4)",
            )?
            .insert(params![book.title, book.author, book.isbn.as_str(), book.copies])
            .map_err(|e| duplicate_or(e, "book", || book.isbn.to_string()))?;
        Ok(Book {
            id: BookId::new(id),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            copies_available: book.copies,
        })
    }

    fn find_book(&self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(self
            .tx
            .prepare_cached(
                "SELECT BookID, Title, Author, ISBN, CopiesAvailable FROM Books WHERE BookID = ?1",
            )?
            .query_row([id.get()], book_from_row)
            .optional()?)
    }

    fn find_book_by_isbn(&self, isbn: &Isbn) -> StoreResult<Option<Book>> {
        Ok(self
            .tx
            .prepare_cached(
                "SELECT BookID, Title, Author, ISBN, CopiesAvailable FROM Books WHERE ISBN = ?1",
            )?
            .query_row([isbn.as_str()], book_from_row)
            .optional()?)
    }

    fn update_book(&mut self, id: BookId, update: &BookUpdate) -> StoreResult<Book> {
        let mut book = self.find_book(id)?.ok_or(StoreError::MissingRow {
            entity: "book",
            id: id.get(),
        })?;
        update.apply_to(&mut book);
        self.tx
            .prepare_cached(
                "UPDATE Books SET Title = ?1, Author = ?2, CopiesAvailable = ?3 WHERE BookID = ?4",
            )?
            .execute(params![book.title, book.author, book.copies_available, id.get()])?;
        Ok(book)
    }

    fn adjust_copies(&mut self, id: BookId, delta: i32) -> StoreResult<u32> {
        let changed = self
            .tx
            .prepare_cached(
                "UPDATE Books SET CopiesAvailable = CopiesAvailable + ?1 \
                 WHERE BookID = ?2 AND CopiesAvailable + ?1 BETWEEN 0 AND 4294967295",
            )?
            .execute(params![delta, id.get()])?;
        if changed == 0 {
            return Err(match self.find_book(id)? {
                Some(_) => StoreError::StockOutOfRange { book: id },
                None => StoreError::MissingRow {
                    entity: "book",
                    id: id.get(),
                },
            });
        }
        let copies = self
            .tx
            .prepare_cached("SELECT CopiesAvailable FROM Books WHERE BookID = ?1")?
            .query_row([id.get()], |row| row.get(0))?;
        Ok(copies)
    }

    fn delete_book(&mut self, id: BookId) -> StoreResult<bool> {
        let changed = self
            .tx
            .prepare_cached("DELETE FROM Books WHERE BookID = ?1")?
            .execute([id.get()])?;
        Ok(changed > 0)
    }

    fn search_books(&self, query: &BookQuery) -> StoreResult<Vec<Book>> {
        let sql = match query.field {
            SearchField::Title => {
                "SELECT BookID, Title, Author, ISBN, CopiesAvailable FROM Books \
                 WHERE Title LIKE ?1 ESCAPE '\\' ORDER BY BookID"
            }
            SearchField::Author => {
                "SELECT BookID, Title, Author, ISBN, CopiesAvailable FROM Books \
                 WHERE Author LIKE ?1 ESCAPE '\\' ORDER BY BookID"
            }
        };
        let mut stmt = self.tx.prepare_cached(sql)?;
        let books = stmt
            .query_map([contains_pattern(&query.keyword)], book_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(books)
    }
}

impl RosterStore for SqliteTx<'_> {
    fn insert_student(&mut self, student: &NewStudent) -> StoreResult<Student> {
        let id = self
            .tx
            .prepare_cached("INSERT INTO Students (Name, Class, RollNo) VALUES (?1, ?2, ?3)")?
            .insert(params![student.name, student.class, student.roll_no])?;
        Ok(Student {
            id: StudentId::new(id),
            name: student.name.clone(),
            class: student.class.clone(),
            roll_no: student.roll_no.clone(),
        })
    }

    fn find_student(&self, id: StudentId) -> StoreResult<Option<Student>> {
        Ok(self
            .tx
            .prepare_cached("SELECT StudentID, Name, Class, RollNo FROM Students WHERE StudentID = ?1")?
            .query_row([id.get()], student_from_row)
            .optional()?)
    }

    fn delete_student(&mut self, id: StudentId) -> StoreResult<bool> {
        let changed = self
            .tx
            .prepare_cached("DELETE FROM Students WHERE StudentID = ?1")?
            .execute([id.get()])?;
        Ok(changed > 0)
    }

    fn list_students(&self) -> StoreResult<Vec<Student>> {
        let mut stmt = self
            .tx
            .prepare_cached("SELECT StudentID, Name, Class, RollNo FROM Students ORDER BY StudentID")?;
        let students = stmt
            .query_map([], student_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(students)
    }
}

impl LoanLedger for SqliteTx<'_> {
    fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Transaction> {
        let id = self
            .tx
            .prepare_cached(
                "INSERT INTO Transactions (StudentID, BookID, IssueDate) VALUES (?1, ?2, ?3)",
            )?
            .insert(params![
                loan.student_id.get(),
                loan.book_id.get(),
                loan.issue_date.as_naive()
            ])
            .map_err(|e| {
                duplicate_or(e, "outstanding loan", || {
                    format!("student {} / book {}", loan.student_id, loan.book_id)
                })
            })?;
        Ok(Transaction {
            id: TransId::new(id),
            student_id: loan.student_id,
            book_id: loan.book_id,
            issue_date: loan.issue_date,
            return_date: None,
            fine: 0,
        })
    }

    fn find_loan(&self, id: TransId) -> StoreResult<Option<Transaction>> {
        Ok(self
            .tx
            .prepare_cached(
                "SELECT TransID, StudentID, BookID, IssueDate, ReturnDate, Fine \
                 FROM Transactions WHERE TransID = ?1",
            )?
            .query_row([id.get()], loan_from_row)
            .optional()?)
    }

    fn find_outstanding(
        &self,
        student: StudentId,
        book: BookId,
    ) -> StoreResult<Option<Transaction>> {
        Ok(self
            .tx
            .prepare_cached(
                "SELECT TransID, StudentID, BookID, IssueDate, ReturnDate, Fine FROM Transactions \
                 WHERE StudentID = ?1 AND BookID = ?2 AND ReturnDate IS NULL",
            )?
            .query_row([student.get(), book.get()], loan_from_row)
            .optional()?)
    }

    fn count_outstanding_for_book(&self, book: BookId) -> StoreResult<u64> {
        let count: i64 = self
            .tx
            .prepare_cached(
                "SELECT COUNT(*) FROM Transactions WHERE BookID = ?1 AND ReturnDate IS NULL",
            )?
            .query_row([book.get()], |row| row.get(0))?;
        count_to_u64(count, "Transactions")
    }

    fn count_outstanding_for_student(&self, student: StudentId) -> StoreResult<u64> {
        let count: i64 = self
            .tx
            .prepare_cached(
                "SELECT COUNT(*) FROM Transactions WHERE StudentID = ?1 AND ReturnDate IS NULL",
            )?
            .query_row([student.get()], |row| row.get(0))?;
        count_to_u64(count, "Transactions")
    }

    fn mark_returned(
        &mut self,
        id: TransId,
        return_date: LoanDate,
        fine: u32,
    ) -> StoreResult<Transaction> {
        let changed = self
            .tx
            .prepare_cached(
                "UPDATE Transactions SET ReturnDate = ?1, Fine = ?2 \
                 WHERE TransID = ?3 AND ReturnDate IS NULL",
            )?
            .execute(params![return_date.as_naive(), fine, id.get()])?;
        let loan = self.find_loan(id)?.ok_or(StoreError::MissingRow {
            entity: "transaction",
            id: id.get(),
        })?;
        if changed == 0 {
            return Err(StoreError::AlreadyReturned(id));
        }
        Ok(loan)
    }

    fn scan_by_issue_date_desc(&self) -> StoreResult<Vec<Transaction>> {
        let mut stmt = self.tx.prepare_cached(
            "SELECT TransID, StudentID, BookID, IssueDate, ReturnDate, Fine FROM Transactions \
             ORDER BY IssueDate DESC, TransID DESC",
        )?;
        let loans = stmt
            .query_map([], loan_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(loans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(isbn: &str, copies: u32) -> NewBook {
        NewBook {
            title: format!("Title {isbn}"),
            author: "Author".into(),
            isbn: Isbn::parse(isbn).unwrap(),
            copies,
        }
    }

    fn new_student(name: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            class: "9A".into(),
            roll_no: "3".into(),
        }
    }

    fn day(d: u32) -> LoanDate {
        LoanDate::from_ymd(2024, 2, d).unwrap()
    }

    fn library() -> SqliteLibrary {
        SqliteLibrary::open_in_memory().unwrap()
    }

    #[test]
    fn insert_and_find_book() {
        let lib = library();
        let book = lib.atomically(|tx| tx.insert_book(&new_book("111", 2))).unwrap();
        assert_eq!(book.id, BookId::new(1));

        let by_id = lib.atomically(|tx| tx.find_book(book.id)).unwrap();
        assert_eq!(by_id, Some(book.clone()));
        let by_isbn = lib
            .atomically(|tx| tx.find_book_by_isbn(&Isbn::parse("111").unwrap()))
            .unwrap();
        assert_eq!(by_isbn, Some(book));
    }

    #[test]
    fn duplicate_isbn_surfaces_as_duplicate_key() {
        let lib = library();
        lib.atomically(|tx| tx.insert_book(&new_book("111", 1))).unwrap();
        let err = lib
            .atomically(|tx| tx.insert_book(&new_book("111", 3)))
            .unwrap_err();
        match err {
            StoreError::DuplicateKey { entity, key } => {
                assert_eq!(entity, "book");
                assert_eq!(key, "111");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn adjust_copies_is_compare_and_set() {
        let lib = library();
        let book = lib.atomically(|tx| tx.insert_book(&new_book("111", 1))).unwrap();
        assert_eq!(lib.atomically(|tx| tx.adjust_copies(book.id, -1)).unwrap(), 0);

        let err = lib
            .atomically(|tx| tx.adjust_copies(book.id, -1))
            .unwrap_err();
        assert!(matches!(err, StoreError::StockOutOfRange { .. }));
        assert_eq!(lib.atomically(|tx| tx.adjust_copies(book.id, 1)).unwrap(), 1);
    }

    #[test]
    fn adjust_copies_on_missing_book() {
        let lib = library();
        let err = lib
            .atomically(|tx| tx.adjust_copies(BookId::new(4), -1))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingRow { entity: "book", id: 4 }));
    }

    #[test]
    fn update_keeps_unspecified_fields() {
        let lib = library();
        let book = lib.atomically(|tx| tx.insert_book(&new_book("111", 5))).unwrap();
        let update = BookUpdate {
            copies_available: Some(2),
            ..Default::default()
        };
        let updated = lib.atomically(|tx| tx.update_book(book.id, &update)).unwrap();
        assert_eq!(updated.title, book.title);
        assert_eq!(updated.copies_available, 2);
        let reread = lib.atomically(|tx| tx.find_book(book.id)).unwrap();
        assert_eq!(reread, Some(updated));
    }

    #[test]
    fn search_escapes_wildcards() {
        let lib = library();
        lib.atomically(|tx| {
            tx.insert_book(&NewBook {
                title: "100% Rust".into(),
                ..new_book("1", 1)
            })?;
            tx.insert_book(&NewBook {
                title: "1000 Recipes".into(),
                ..new_book("2", 1)
            })?;
            tx.insert_book(&NewBook {
                title: "Collected Stories".into(),
                author: "Ruskin Bond".into(),
                ..new_book("3", 1)
            })
        })
        .unwrap();

        let hits = lib
            .atomically(|tx| tx.search_books(&BookQuery::title("0%")))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "100% Rust");

        let by_author = lib
            .atomically(|tx| tx.search_books(&BookQuery::author("ruskin")))
            .unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].isbn.as_str(), "3");
    }

    #[test]
    fn loan_lifecycle_rows() {
        let lib = library();
        let (student, book) = lib
            .atomically(|tx| {
                let s = tx.insert_student(&new_student("Meera"))?;
                let b = tx.insert_book(&new_book("111", 2))?;
                Ok::<_, StoreError>((s, b))
            })
            .unwrap();
        let loan = NewLoan {
            student_id: student.id,
            book_id: book.id,
            issue_date: day(1),
        };
        let issued = lib.atomically(|tx| tx.insert_loan(&loan)).unwrap();
        assert!(issued.is_outstanding());

        let outstanding = lib
            .atomically(|tx| tx.find_outstanding(student.id, book.id))
            .unwrap();
        assert_eq!(outstanding, Some(issued.clone()));
        assert_eq!(
            lib.atomically(|tx| tx.count_outstanding_for_book(book.id)).unwrap(),
            1
        );

        let returned = lib
            .atomically(|tx| tx.mark_returned(issued.id, day(20), 5))
            .unwrap();
        assert_eq!(returned.return_date, Some(day(20)));
        assert_eq!(returned.fine, 5);
        assert_eq!(
            lib.atomically(|tx| tx.count_outstanding_for_student(student.id))
                .unwrap(),
            0
        );
    }

    #[test]
    fn unique_index_allows_one_outstanding_loan() {
        let lib = library();
        let loan = NewLoan {
            student_id: StudentId::new(1),
            book_id: BookId::new(1),
            issue_date: day(1),
        };
        let first = lib.atomically(|tx| tx.insert_loan(&loan)).unwrap();
        let err = lib.atomically(|tx| tx.insert_loan(&loan)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { entity: "outstanding loan", .. }));

        lib.atomically(|tx| tx.mark_returned(first.id, day(2), 0)).unwrap();
        lib.atomically(|tx| tx.insert_loan(&loan)).unwrap();
    }

    #[test]
    fn mark_returned_twice_fails() {
        let lib = library();
        let loan = lib
            .atomically(|tx| {
                tx.insert_loan(&NewLoan {
                    student_id: StudentId::new(1),
                    book_id: BookId::new(1),
                    issue_date: day(1),
                })
            })
            .unwrap();
        lib.atomically(|tx| tx.mark_returned(loan.id, day(3), 0)).unwrap();
        let err = lib
            .atomically(|tx| tx.mark_returned(loan.id, day(28), 14))
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyReturned(id) if id == loan.id));

        let stored = lib.atomically(|tx| tx.find_loan(loan.id)).unwrap().unwrap();
        assert_eq!(stored.return_date, Some(day(3)));
        assert_eq!(stored.fine, 0);
    }

    #[test]
    fn mark_returned_missing_row() {
        let lib = library();
        let err = lib
            .atomically(|tx| tx.mark_returned(TransId::new(7), day(3), 0))
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingRow { entity: "transaction", id: 7 }));
    }

    #[test]
    fn scan_orders_by_issue_date_then_id() {
        let lib = library();
        lib.atomically(|tx| {
            for (student, d) in [(1, 3), (2, 10), (3, 3)] {
                tx.insert_loan(&NewLoan {
                    student_id: StudentId::new(student),
                    book_id: BookId::new(1),
                    issue_date: day(d),
                })?;
            }
            Ok::<_, StoreError>(())
        })
        .unwrap();
        let ids: Vec<i64> = lib
            .atomically(|tx| tx.scan_by_issue_date_desc())
            .unwrap()
            .iter()
            .map(|l| l.id.get())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn failed_operation_rolls_back() {
        let lib = library();
        let result: Result<(), StoreError> = lib.atomically(|tx| {
            tx.insert_student(&new_student("Kabir"))?;
            tx.insert_book(&new_book("111", 1))?;
            tx.insert_book(&new_book("111", 1))?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(lib.atomically(|tx| tx.list_students()).unwrap().is_empty());
        let book = lib
            .atomically(|tx| tx.find_book_by_isbn(&Isbn::parse("111").unwrap()))
            .unwrap();
        assert!(book.is_none());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.db");
        {
            let lib = SqliteLibrary::open(&path).unwrap();
            lib.atomically(|tx| tx.insert_student(&new_student("Zoya")))
                .unwrap();
        }
        let lib = SqliteLibrary::open(&path).unwrap();
        let students = lib.atomically(|tx| tx.list_students()).unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Zoya");
        assert!(lib.location().ends_with("library.db"));
    }

    #[test]
    fn deleted_ids_are_not_reused() {
        let lib = library();
        let first = lib.atomically(|tx| tx.insert_book(&new_book("111", 1))).unwrap();
        assert!(lib.atomically(|tx| tx.delete_book(first.id)).unwrap());
        let second = lib.atomically(|tx| tx.insert_book(&new_book("222", 1))).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn contains_pattern_escapes() {
        assert_eq!(contains_pattern("a_b%c\\"), "%a\\_b\\%c\\\\%");
        assert_eq!(contains_pattern(""), "%%");
    }
}
