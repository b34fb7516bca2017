use std::collections::BTreeMap;
use std::sync::Mutex;

use libris_types::{
    Book, BookId, BookQuery, BookUpdate, Isbn, LoanDate, NewBook, NewLoan, NewStudent, Student,
    StudentId, TransId, Transaction,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{CatalogStore, LibraryStore, LoanLedger, RosterStore, StoreTx};

/// In-memory library, for tests and embedding.
///
/// All tables sit behind one `Mutex`. An atomic operation runs against a
/// scratch copy of the tables which replaces the live copy only when the
/// operation succeeds, so a failed operation leaves no trace and operations
/// are fully serialized.
pub struct InMemoryLibrary {
    tables: Mutex<MemoryTables>,
}

/// The tables of an [`InMemoryLibrary`]; also its transaction handle.
///
/// Id counters only move forward, so ids of deleted rows are never reused.
#[derive(Clone, Debug, Default)]
pub struct MemoryTables {
    books: BTreeMap<BookId, Book>,
    students: BTreeMap<StudentId, Student>,
    loans: BTreeMap<TransId, Transaction>,
    last_book_id: i64,
    last_student_id: i64,
    last_trans_id: i64,
}

impl InMemoryLibrary {
    /// Create a new empty library.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(MemoryTables::default()),
        }
    }

    fn counts(&self) -> Option<(usize, usize, usize)> {
        let tables = self.tables.lock().ok()?;
        Some((tables.books.len(), tables.students.len(), tables.loans.len()))
    }
}

impl Default for InMemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryStore for InMemoryLibrary {
    fn atomically<T, E, F>(&self, op: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut live = self
            .tables
            .lock()
            .map_err(|_| E::from(StoreError::LockPoisoned))?;
        let mut scratch = live.clone();
        let value = op(&mut scratch)?;
        *live = scratch;
        Ok(value)
    }
}

impl std::fmt::Debug for InMemoryLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (books, students, loans) = self.counts().unwrap_or_default();
        f.debug_struct("InMemoryLibrary")
            .field("book_count", &books)
            .field("student_count", &students)
            .field("loan_count", &loans)
            .finish()
    }
}

impl CatalogStore for MemoryTables {
    fn insert_book(&mut self, book: &NewBook) -> StoreResult<Book> {
        if self.books.values().any(|b| b.isbn == book.isbn) {
            return Err(StoreError::DuplicateKey {
                entity: "book",
                key: book.isbn.to_string(),
            });
        }
        self.last_book_id += 1;
        let stored = Book {
            id: BookId::new(self.last_book_id),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            copies_available: book.copies,
        };
        self.books.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_book(&self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(self.books.get(&id).cloned())
    }

    fn find_book_by_isbn(&self, isbn: &Isbn) -> StoreResult<Option<Book>> {
        Ok(self.books.values().find(|b| &b.isbn == isbn).cloned())
    }

    fn update_book(&mut self, id: BookId, update: &BookUpdate) -> StoreResult<Book> {
        let book = self.books.get_mut(&id).ok_or(StoreError::MissingRow {
            entity: "book",
            id: id.get(),
        })?;
        update.apply_to(book);
        Ok(book.clone())
    }

    fn adjust_copies(&mut self, id: BookId, delta: i32) -> StoreResult<u32> {
        let book = self.books.get_mut(&id).ok_or(StoreError::MissingRow {
            entity: "book",
            id: id.get(),
        })?;
        let copies = book
            .copies_available
            .checked_add_signed(delta)
            .ok_or(StoreError::StockOutOfRange { book: id })?;
        book.copies_available = copies;
        Ok(copies)
    }

    fn delete_book(&mut self, id: BookId) -> StoreResult<bool> {
        Ok(self.books.remove(&id).is_some())
    }

    fn search_books(&self, query: &BookQuery) -> StoreResult<Vec<Book>> {
        Ok(self
            .books
            .values()
            .filter(|b| query.matches(b))
            .cloned()
            .collect())
    }
}

impl RosterStore for MemoryTables {
    fn insert_student(&mut self, student: &NewStudent) -> StoreResult<Student> {
        self.last_student_id += 1;
        let stored = Student {
            id: StudentId::new(self.last_student_id),
            name: student.name.clone(),
            class: student.class.clone(),
            roll_no: student.roll_no.clone(),
        };
        self.students.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_student(&self, id: StudentId) -> StoreResult<Option<Student>> {
        Ok(self.students.get(&id).cloned())
    }

    fn delete_student(&mut self, id: StudentId) -> StoreResult<bool> {
        Ok(self.students.remove(&id).is_some())
    }

    fn list_students(&self) -> StoreResult<Vec<Student>> {
        Ok(self.students.values().cloned().collect())
    }
}

impl LoanLedger for MemoryTables {
    fn insert_loan(&mut self, loan: &NewLoan) -> StoreResult<Transaction> {
        if self.find_outstanding(loan.student_id, loan.book_id)?.is_some() {
            return Err(StoreError::DuplicateKey {
                entity: "outstanding loan",
                key: format!("student {} / book {}", loan.student_id, loan.book_id),
            });
        }
        self.last_trans_id += 1;
        let stored = Transaction {
            id: TransId::new(self.last_trans_id),
            student_id: loan.student_id,
            book_id: loan.book_id,
            issue_date: loan.issue_date,
            return_date: None,
            fine: 0,
        };
        self.loans.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn find_loan(&self, id: TransId) -> StoreResult<Option<Transaction>> {
        Ok(self.loans.get(&id).cloned())
    }

    fn find_outstanding(
        &self,
        student: StudentId,
        book: BookId,
    ) -> StoreResult<Option<Transaction>> {
        Ok(self
            .loans
            .values()
            .find(|l| l.student_id == student && l.book_id == book && l.is_outstanding())
            .cloned())
    }

    fn count_outstanding_for_book(&self, book: BookId) -> StoreResult<u64> {
        Ok(self
            .loans
            .values()
            .filter(|l| l.book_id == book && l.is_outstanding())
            .count() as u64)
    }

    fn count_outstanding_for_student(&self, student: StudentId) -> StoreResult<u64> {
        Ok(self
            .loans
            .values()
            .filter(|l| l.student_id == student && l.is_outstanding())
            .count() as u64)
    }

    fn mark_returned(
        &mut self,
        id: TransId,
        return_date: LoanDate,
        fine: u32,
    ) -> StoreResult<Transaction> {
        let loan = self.loans.get_mut(&id).ok_or(StoreError::MissingRow {
            entity: "transaction",
            id: id.get(),
        })?;
        if !loan.is_outstanding() {
            return Err(StoreError::AlreadyReturned(id));
        }
        loan.return_date = Some(return_date);
        loan.fine = fine;
        Ok(loan.clone())
    }

    fn scan_by_issue_date_desc(&self) -> StoreResult<Vec<Transaction>> {
        let mut loans: Vec<Transaction> = self.loans.values().cloned().collect();
        loans.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then(b.id.cmp(&a.id)));
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
            class: "7B".into(),
            roll_no: "12".into(),
        }
    }

    fn day(d: u32) -> LoanDate {
        LoanDate::from_ymd(2024, 1, d).unwrap()
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    #[test]
    fn insert_and_find_book() {
        let mut t = MemoryTables::default();
        let book = t.insert_book(&new_book("111", 2)).unwrap();
        assert_eq!(book.id, BookId::new(1));
        assert_eq!(t.find_book(book.id).unwrap(), Some(book.clone()));
        assert_eq!(
            t.find_book_by_isbn(&Isbn::parse("111").unwrap()).unwrap(),
            Some(book)
        );
    }

    #[test]
    fn duplicate_isbn_is_rejected() {
        let mut t = MemoryTables::default();
        t.insert_book(&new_book("111", 1)).unwrap();
        let err = t.insert_book(&new_book("111", 5)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { entity: "book", .. }));
    }

    #[test]
    fn adjust_copies_refuses_negative() {
        let mut t = MemoryTables::default();
        let book = t.insert_book(&new_book("111", 1)).unwrap();
        assert_eq!(t.adjust_copies(book.id, -1).unwrap(), 0);
        let err = t.adjust_copies(book.id, -1).unwrap_err();
        assert!(matches!(err, StoreError::StockOutOfRange { .. }));
        assert_eq!(t.find_book(book.id).unwrap().unwrap().copies_available, 0);
    }

    #[test]
    fn adjust_copies_missing_book() {
        let mut t = MemoryTables::default();
        let err = t.adjust_copies(BookId::new(9), 1).unwrap_err();
        assert!(matches!(err, StoreError::MissingRow { entity: "book", id: 9 }));
    }

    #[test]
    fn update_is_partial() {
        let mut t = MemoryTables::default();
        let book = t.insert_book(&new_book("111", 4)).unwrap();
        let updated = t
            .update_book(
                book.id,
                &BookUpdate {
                    title: Some("New".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(updated.author, "Author");
        assert_eq!(updated.copies_available, 4);
    }

    #[test]
    fn ids_are_not_reused() {
        let mut t = MemoryTables::default();
        let first = t.insert_book(&new_book("111", 1)).unwrap();
        assert!(t.delete_book(first.id).unwrap());
        let second = t.insert_book(&new_book("222", 1)).unwrap();
        assert_eq!(second.id, BookId::new(2));
        assert!(!t.delete_book(first.id).unwrap());
    }

    // -----------------------------------------------------------------------
    // Ledger
    // -----------------------------------------------------------------------

    #[test]
    fn second_outstanding_loan_is_rejected() {
        let mut t = MemoryTables::default();
        let loan = NewLoan {
            student_id: StudentId::new(1),
            book_id: BookId::new(1),
            issue_date: day(1),
        };
        t.insert_loan(&loan).unwrap();
        let err = t.insert_loan(&loan).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
    }

    #[test]
    fn loan_after_return_is_allowed() {
        let mut t = MemoryTables::default();
        let loan = NewLoan {
            student_id: StudentId::new(1),
            book_id: BookId::new(1),
            issue_date: day(1),
        };
        let first = t.insert_loan(&loan).unwrap();
        t.mark_returned(first.id, day(3), 0).unwrap();
        let second = t.insert_loan(&loan).unwrap();
        assert!(second.id > first.id);
        assert_eq!(t.count_outstanding_for_book(BookId::new(1)).unwrap(), 1);
    }

    #[test]
    fn mark_returned_only_once() {
        let mut t = MemoryTables::default();
        let loan = t
            .insert_loan(&NewLoan {
                student_id: StudentId::new(1),
                book_id: BookId::new(1),
                issue_date: day(1),
            })
            .unwrap();
        let returned = t.mark_returned(loan.id, day(20), 5).unwrap();
        assert_eq!(returned.return_date, Some(day(20)));
        assert_eq!(returned.fine, 5);

        let err = t.mark_returned(loan.id, day(25), 11).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyReturned(id) if id == loan.id));
        assert_eq!(t.find_loan(loan.id).unwrap().unwrap().fine, 5);
    }

    #[test]
    fn scan_orders_newest_first() {
        let mut t = MemoryTables::default();
        for (student, d) in [(1, 5), (2, 9), (3, 5)] {
            t.insert_loan(&NewLoan {
                student_id: StudentId::new(student),
                book_id: BookId::new(1),
                issue_date: day(d),
            })
            .unwrap();
        }
        let ids: Vec<i64> = t
            .scan_by_issue_date_desc()
            .unwrap()
            .iter()
            .map(|l| l.id.get())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn outstanding_counts_per_student() {
        let mut t = MemoryTables::default();
        let s = t.insert_student(&new_student("Asha")).unwrap();
        for book in 1..=3 {
            t.insert_loan(&NewLoan {
                student_id: s.id,
                book_id: BookId::new(book),
                issue_date: day(1),
            })
            .unwrap();
        }
        assert_eq!(t.count_outstanding_for_student(s.id).unwrap(), 3);
        assert_eq!(t.count_outstanding_for_student(StudentId::new(99)).unwrap(), 0);
    }

    // -----------------------------------------------------------------------
    // Atomicity
    // -----------------------------------------------------------------------

    #[test]
    fn failed_operation_discards_writes() {
        let library = InMemoryLibrary::new();
        let result: Result<(), StoreError> = library.atomically(|tx| {
            tx.insert_book(&new_book("111", 1))?;
            tx.insert_book(&new_book("111", 1))?;
            Ok(())
        });
        assert!(result.is_err());

        let found = library
            .atomically(|tx| tx.find_book_by_isbn(&Isbn::parse("111").unwrap()))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn successful_operation_commits() {
        let library = InMemoryLibrary::new();
        let student = library
            .atomically(|tx| tx.insert_student(&new_student("Ravi")))
            .unwrap();
        let listed = library.atomically(|tx| tx.list_students()).unwrap();
        assert_eq!(listed, vec![student]);
    }

    #[test]
    fn concurrent_decrements_never_go_negative() {
        use std::sync::Arc;
        use std::thread;

        let library = Arc::new(InMemoryLibrary::new());
        let book = library
            .atomically(|tx| tx.insert_book(&new_book("111", 3)))
            .unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let library = Arc::clone(&library);
                thread::spawn(move || library.atomically(|tx| tx.adjust_copies(book.id, -1)))
            })
            .collect();

        let succeeded = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(Result::is_ok)
            .count();
        assert_eq!(succeeded, 3);
        let left = library.atomically(|tx| tx.find_book(book.id)).unwrap();
        assert_eq!(left.unwrap().copies_available, 0);
    }

    #[test]
    fn debug_format() {
        let library = InMemoryLibrary::new();
        let debug = format!("{library:?}");
        assert!(debug.contains("InMemoryLibrary"));
        assert!(debug.contains("loan_count"));
    }
}
