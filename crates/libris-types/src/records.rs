//! Persisted records and the inputs used to create or change them.

use serde::{Deserialize, Serialize};

use crate::identity::{BookId, Isbn, StudentId, TransId};
use crate::temporal::LoanDate;

/// A catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Isbn,
    /// Copies on the shelf: physical copies minus outstanding loans.
    pub copies_available: u32,
}

/// Input for adding a book to the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: Isbn,
    pub copies: u32,
}

/// Partial update of a catalog entry. `None` keeps the current value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub copies_available: Option<u32>,
}

impl BookUpdate {
    /// Returns `true` if the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.copies_available.is_none()
    }

    /// Apply this update to `book` in place.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title.clone_from(title);
        }
        if let Some(author) = &self.author {
            book.author.clone_from(author);
        }
        if let Some(copies) = self.copies_available {
            book.copies_available = copies;
        }
    }
}

/// Which catalog column a search matches against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchField {
    #[default]
    Title,
    Author,
}

/// Case-insensitive substring search over the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookQuery {
    pub field: SearchField,
    pub keyword: String,
}

impl BookQuery {
    pub fn title(keyword: impl Into<String>) -> Self {
        Self {
            field: SearchField::Title,
            keyword: keyword.into(),
        }
    }

    pub fn author(keyword: impl Into<String>) -> Self {
        Self {
            field: SearchField::Author,
            keyword: keyword.into(),
        }
    }

    /// Returns `true` if `book` matches. An empty keyword matches everything.
    pub fn matches(&self, book: &Book) -> bool {
        let haystack = match self.field {
            SearchField::Title => &book.title,
            SearchField::Author => &book.author,
        };
        haystack
            .to_lowercase()
            .contains(&self.keyword.to_lowercase())
    }
}

/// A roster entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub class: String,
    pub roll_no: String,
}

/// Input for adding a student to the roster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub class: String,
    pub roll_no: String,
}

/// A loan record in the ledger.
///
/// `return_date == None` means the loan is outstanding. `fine` is frozen at
/// return time and stays 0 while outstanding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransId,
    pub student_id: StudentId,
    pub book_id: BookId,
    pub issue_date: LoanDate,
    pub return_date: Option<LoanDate>,
    pub fine: u32,
}

impl Transaction {
    pub fn is_outstanding(&self) -> bool {
        self.return_date.is_none()
    }
}

/// Input for recording a new loan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewLoan {
    pub student_id: StudentId,
    pub book_id: BookId,
    pub issue_date: LoanDate,
}

/// Which loans a history report includes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanFilter {
    #[default]
    All,
    Outstanding,
    Returned,
}

impl LoanFilter {
    pub fn admits(&self, loan: &Transaction) -> bool {
        match self {
            Self::All => true,
            Self::Outstanding => loan.is_outstanding(),
            Self::Returned => !loan.is_outstanding(),
        }
    }
}

/// A ledger row joined with the names it references.
///
/// Names are `None` when the student or book has since been removed; the
/// ledger keeps the historical ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanHistoryEntry {
    pub loan: Transaction,
    pub student_name: Option<String>,
    pub book_title: Option<String>,
}
