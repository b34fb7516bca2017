//! SQLite schema bootstrap.
//!
//! Ledger rows keep the ids of the student and book they reference even
//! after those rows are deleted, so the references are deliberately not
//! declared as foreign keys. Deletion is guarded by the outstanding-loan
//! count instead.

/// Value stored in `PRAGMA user_version` once the schema is in place.
pub const SCHEMA_VERSION: i64 = 1;

pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS Books (
	BookID INTEGER PRIMARY KEY AUTOINCREMENT,
	Title TEXT NOT NULL,
	Author TEXT NOT NULL,
	ISBN TEXT UNIQUE NOT NULL CHECK(length(trim(ISBN)) > 0),
	CopiesAvailable INTEGER NOT NULL CHECK(CopiesAvailable >= 0)
);

CREATE TABLE IF NOT EXISTS Students (
	StudentID INTEGER PRIMARY KEY AUTOINCREMENT,
	Name TEXT NOT NULL,
	Class TEXT NOT NULL,
	RollNo TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS Transactions (
	TransID INTEGER PRIMARY KEY AUTOINCREMENT,
	StudentID INTEGER NOT NULL,
	BookID INTEGER NOT NULL,
	IssueDate TEXT NOT NULL,
	ReturnDate TEXT,
	Fine INTEGER NOT NULL DEFAULT 0 CHECK(Fine >= 0)
);

CREATE UNIQUE INDEX IF NOT EXISTS Transactions_one_outstanding
	ON Transactions(StudentID, BookID) WHERE ReturnDate IS NULL;

CREATE INDEX IF NOT EXISTS Transactions_by_issue_date
	ON Transactions(IssueDate DESC, TransID DESC);
"#;
