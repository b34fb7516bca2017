use std::collections::BTreeMap;

use libris_store::{LibraryStore, StoreError, StoreTx};
use libris_types::{
    Book, BookQuery, BookUpdate, Isbn, LoanDate, LoanFilter, LoanHistoryEntry, NewBook, NewLoan,
    NewStudent, Student, StudentId,
};

use crate::error::{LoanError, LoanResult, RecordRef};
use crate::fine::{due_date, FineAssessment};
use crate::outcome::{IssueOutcome, ReturnOutcome};

/// The loan lifecycle engine.
///
/// Each public operation is one call to [`LibraryStore::atomically`]: the
/// precondition reads and the writes that follow commit together, or the
/// store is left untouched.
pub struct LoanEngine<S> {
    store: S,
}

impl<S: LibraryStore> LoanEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // --- catalog ---

    pub fn add_book(&self, book: &NewBook) -> LoanResult<Book> {
        require_text("title", &book.title)?;
        require_text("author", &book.author)?;
        self.store
            .atomically(|tx| -> LoanResult<Book> { Ok(tx.insert_book(book)?) })
    }

    pub fn find_book(&self, isbn: &Isbn) -> LoanResult<Book> {
        self.store.atomically(|tx| resolve_book(tx, isbn))
    }

    /// Apply a partial update to the book with this ISBN.
    ///
    /// `copies_available`, when given, replaces the stored count as is.
    pub fn update_book(&self, isbn: &Isbn, update: &BookUpdate) -> LoanResult<Book> {
        if let Some(title) = &update.title {
            require_text("title", title)?;
        }
        if let Some(author) = &update.author {
            require_text("author", author)?;
        }
        self.store.atomically(|tx| -> LoanResult<Book> {
            let book = resolve_book(tx, isbn)?;
            if update.is_empty() {
                return Ok(book);
            }
            Ok(tx.update_book(book.id, update)?)
        })
    }

    /// Delete a book that no outstanding loan references.
    pub fn delete_book(&self, isbn: &Isbn) -> LoanResult<Book> {
        self.store.atomically(|tx| -> LoanResult<Book> {
            let book = resolve_book(tx, isbn)?;
            let outstanding = tx.count_outstanding_for_book(book.id)?;
            if outstanding > 0 {
                return Err(LoanError::ReferencedByOutstandingLoan {
                    subject: RecordRef::Book(book.isbn),
                    outstanding,
                });
            }
            tx.delete_book(book.id)?;
            Ok(book)
        })
    }

    pub fn search_books(&self, query: &BookQuery) -> LoanResult<Vec<Book>> {
        self.store
            .atomically(|tx| -> LoanResult<Vec<Book>> { Ok(tx.search_books(query)?) })
    }

    // --- roster ---

    pub fn add_student(&self, student: &NewStudent) -> LoanResult<Student> {
        require_text("name", &student.name)?;
        self.store
            .atomically(|tx| -> LoanResult<Student> { Ok(tx.insert_student(student)?) })
    }

    pub fn find_student(&self, id: StudentId) -> LoanResult<Student> {
        self.store.atomically(|tx| resolve_student(tx, id))
    }

    pub fn list_students(&self) -> LoanResult<Vec<Student>> {
        self.store
            .atomically(|tx| -> LoanResult<Vec<Student>> { Ok(tx.list_students()?) })
    }

    /// Remove a student who has no outstanding loans.
    pub fn remove_student(&self, id: StudentId) -> LoanResult<Student> {
        self.store.atomically(|tx| -> LoanResult<Student> {
            let student = resolve_student(tx, id)?;
            let outstanding = tx.count_outstanding_for_student(id)?;
            if outstanding > 0 {
                return Err(LoanError::ReferencedByOutstandingLoan {
                    subject: RecordRef::Student(id),
                    outstanding,
                });
            }
            tx.delete_student(id)?;
            Ok(student)
        })
    }

    // --- lifecycle ---

    /// Lend one copy of the book with `isbn` to `student`.
    ///
    /// Preconditions are checked in this order, each with its own error:
    /// the student exists, the book exists, a copy is on the shelf, and the
    /// student does not already hold this book.
    pub fn issue_book(
        &self,
        student: StudentId,
        isbn: &Isbn,
        today: LoanDate,
    ) -> LoanResult<IssueOutcome> {
        let due = due_date(today)
            .ok_or_else(|| LoanError::InvalidInput(format!("issue date {today} is out of range")))?;

        self.store.atomically(|tx| -> LoanResult<IssueOutcome> {
            let borrower = resolve_student(tx, student)?;
            let book = resolve_book(tx, isbn)?;
            if book.copies_available == 0 {
                return Err(unavailable(book));
            }
            if tx.find_outstanding(student, book.id)?.is_some() {
                return Err(LoanError::AlreadyIssued {
                    student,
                    isbn: book.isbn,
                    title: book.title,
                });
            }

            let loan = tx.insert_loan(&NewLoan {
                student_id: student,
                book_id: book.id,
                issue_date: today,
            })?;
            let copies_remaining = match tx.adjust_copies(book.id, -1) {
                Ok(left) => left,
                Err(StoreError::StockOutOfRange { .. }) => return Err(unavailable(book)),
                Err(err) => return Err(err.into()),
            };

            Ok(IssueOutcome {
                trans_id: loan.id,
                student_id: borrower.id,
                student_name: borrower.name,
                book_id: book.id,
                book_title: book.title,
                isbn: book.isbn,
                issue_date: today,
                due_date: due,
                copies_remaining,
            })
        })
    }

    /// Take back the book with `isbn` from `student` and settle the fine.
    pub fn return_book(
        &self,
        student: StudentId,
        isbn: &Isbn,
        today: LoanDate,
    ) -> LoanResult<ReturnOutcome> {
        self.store.atomically(|tx| -> LoanResult<ReturnOutcome> {
            let borrower = resolve_student(tx, student)?;
            let book = resolve_book(tx, isbn)?;
            let Some(loan) = tx.find_outstanding(student, book.id)? else {
                return Err(LoanError::NoOutstandingLoan {
                    student,
                    isbn: book.isbn,
                });
            };

            let assessment = FineAssessment::assess(loan.issue_date, today);
            tx.mark_returned(loan.id, today, assessment.fine)?;
            let copies_remaining = tx.adjust_copies(book.id, 1)?;

            Ok(ReturnOutcome {
                trans_id: loan.id,
                student_id: borrower.id,
                student_name: borrower.name,
                book_id: book.id,
                book_title: book.title,
                isbn: book.isbn,
                issue_date: loan.issue_date,
                return_date: today,
                late_days: assessment.late_days,
                fine: assessment.fine,
                copies_remaining,
            })
        })
    }

    /// The ledger, newest issue first, joined with student names and book
    /// titles where those records still exist.
    pub fn loan_history(&self, filter: LoanFilter) -> LoanResult<Vec<LoanHistoryEntry>> {
        self.store.atomically(|tx| -> LoanResult<Vec<LoanHistoryEntry>> {
            let mut names = BTreeMap::new();
            let mut titles = BTreeMap::new();
            let mut entries = Vec::new();
            for loan in tx.scan_by_issue_date_desc()? {
                if !filter.admits(&loan) {
                    continue;
                }
                if !names.contains_key(&loan.student_id) {
                    let name = tx.find_student(loan.student_id)?.map(|s| s.name);
                    names.insert(loan.student_id, name);
                }
                if !titles.contains_key(&loan.book_id) {
                    let title = tx.find_book(loan.book_id)?.map(|b| b.title);
                    titles.insert(loan.book_id, title);
                }
                entries.push(LoanHistoryEntry {
                    student_name: names.get(&loan.student_id).cloned().flatten(),
                    book_title: titles.get(&loan.book_id).cloned().flatten(),
                    loan,
                });
            }
            Ok(entries)
        })
    }
}

impl<S> std::fmt::Debug for LoanEngine<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoanEngine")
            .field("store", &self.store)
            .finish()
    }
}

fn resolve_student(tx: &mut dyn StoreTx, id: StudentId) -> LoanResult<Student> {
    tx.find_student(id)?
        .ok_or(LoanError::NotFound(RecordRef::Student(id)))
}

fn resolve_book(tx: &mut dyn StoreTx, isbn: &Isbn) -> LoanResult<Book> {
    tx.find_book_by_isbn(isbn)?
        .ok_or_else(|| LoanError::NotFound(RecordRef::Book(isbn.clone())))
}

fn unavailable(book: Book) -> LoanError {
    LoanError::Unavailable {
        isbn: book.isbn,
        title: book.title,
    }
}

fn require_text(field: &str, value: &str) -> LoanResult<()> {
    if value.trim().is_empty() {
        return Err(LoanError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(())
}
