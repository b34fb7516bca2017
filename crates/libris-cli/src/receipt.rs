//! Plain-text receipts for issues and returns.
//!
//! Rendering is pure. [`ReceiptWriter`] puts the text on disk and is only
//! called after the loan change has been committed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use libris_loans::{IssueOutcome, ReturnOutcome};

const RULE: &str = "===============================";
const THIN_RULE: &str = "-------------------------------";

fn header(kind: &str) -> String {
    format!("{RULE}\n       School Library\n{RULE}\n{kind} Receipt\n{THIN_RULE}\n")
}

pub fn render_issue(out: &IssueOutcome) -> String {
    let mut text = header("Issue");
    text.push_str(&format!(
        "Student Name: {}\nStudent ID: {}\nBook Title: {}\nBook ID: {}\nISBN: {}\n\
         Issue Date: {}\nDue Date: {}\n\n\
         Please return the book on time to avoid fines.\n{RULE}\n",
        out.student_name,
        out.student_id,
        out.book_title,
        out.book_id,
        out.isbn,
        out.issue_date,
        out.due_date,
    ));
    text
}

pub fn render_return(out: &ReturnOutcome) -> String {
    let mut text = header("Return");
    text.push_str(&format!(
        "Student Name: {}\nStudent ID: {}\nBook Title: {}\nBook ID: {}\nISBN: {}\n\
         Issue Date: {}\nReturn Date: {}\nDays Late: {}\nFine Paid: {} units\n\n\
         Thank you!\n{RULE}\n",
        out.student_name,
        out.student_id,
        out.book_title,
        out.book_id,
        out.isbn,
        out.issue_date,
        out.return_date,
        out.late_days,
        out.fine,
    ));
    text
}

pub fn issue_file_name(out: &IssueOutcome) -> String {
    format!("ISSUE_{}_{}_{}.txt", out.student_id, out.book_id, out.issue_date)
}

pub fn return_file_name(out: &ReturnOutcome) -> String {
    format!("RETURN_{}_{}_{}.txt", out.student_id, out.book_id, out.return_date)
}

/// Writes receipts into one directory, creating it on first use.
#[derive(Clone, Debug)]
pub struct ReceiptWriter {
    dir: PathBuf,
}

impl ReceiptWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_issue(&self, out: &IssueOutcome) -> io::Result<PathBuf> {
        self.write(&issue_file_name(out), &render_issue(out))
    }

    pub fn write_return(&self, out: &ReturnOutcome) -> io::Result<PathBuf> {
        self.write(&return_file_name(out), &render_return(out))
    }

    fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, contents)?;
        Ok(path)
    }
}
