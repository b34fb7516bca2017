use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};

use libris_loans::{Clock, FixedClock, IssueOutcome, LoanEngine, ReturnOutcome, SystemClock};
use libris_store::SqliteLibrary;
use libris_types::{
    Book, BookQuery, BookUpdate, LoanFilter, LoanHistoryEntry, NewBook, NewStudent, Student,
};

use crate::cli::*;
use crate::config::LibraryConfig;
use crate::receipt::ReceiptWriter;

type Engine = LoanEngine<SqliteLibrary>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve the working directory")?;
    let config = LibraryConfig::discover(cli.config.as_deref(), &cwd)?.with_database(cli.db);
    let session = Session {
        config,
        format: cli.format,
    };
    debug!(command = ?cli.command, "dispatching");

    match cli.command {
        Command::Init => session.init(),
        Command::Book(args) => session.book(args.action),
        Command::Student(args) => session.student(args.action),
        Command::Issue(args) => session.issue(args),
        Command::Return(args) => session.return_book(args),
        Command::Loans(args) => session.loans(args),
    }
}

struct Session {
    config: LibraryConfig,
    format: OutputFormat,
}

impl Session {
    fn engine(&self) -> anyhow::Result<Engine> {
        let store = SqliteLibrary::open_with(&self.config.database, &self.config.sqlite_options())
            .with_context(|| {
                format!(
                    "failed to open library database {}",
                    self.config.database.display()
                )
            })?;
        Ok(LoanEngine::new(store))
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
            OutputFormat::Text => text(),
        }
        Ok(())
    }

    fn init(&self) -> anyhow::Result<()> {
        let engine = self.engine()?;
        if self.config.write_receipts {
            std::fs::create_dir_all(&self.config.receipts_dir).with_context(|| {
                format!(
                    "failed to create receipts directory {}",
                    self.config.receipts_dir.display()
                )
            })?;
        }
        let location = engine.store().location().to_string();
        self.emit(&serde_json::json!({ "database": location }), || {
            println!(
                "{} Initialized library database at {}",
                "✓".green().bold(),
                location.bold()
            );
        })
    }

    fn book(&self, action: BookAction) -> anyhow::Result<()> {
        let engine = self.engine()?;
        match action {
            BookAction::Add {
                title,
                author,
                isbn,
                copies,
            } => {
                let book = engine.add_book(&NewBook {
                    title,
                    author,
                    isbn,
                    copies,
                })?;
                self.emit(&book, || {
                    println!("{} Book {:?} added (ID {}).", "✓".green(), book.title, book.id);
                })
            }
            BookAction::Update {
                isbn,
                title,
                author,
                copies,
            } => {
                let book = engine.update_book(
                    &isbn,
                    &BookUpdate {
                        title,
                        author,
                        copies_available: copies,
                    },
                )?;
                self.emit(&book, || {
                    println!("{} Book information updated.", "✓".green());
                    print_books(std::slice::from_ref(&book));
                })
            }
            BookAction::Delete { isbn, yes } => {
                let book = engine.find_book(&isbn)?;
                if !yes && !confirm(&format!("Delete book {:?} ({})?", book.title, book.isbn))? {
                    return self.cancelled("Deletion");
                }
                let book = engine.delete_book(&isbn)?;
                self.emit(&book, || {
                    println!("{} Book {:?} deleted.", "✓".green(), book.title);
                })
            }
            BookAction::Show { isbn } => {
                let book = engine.find_book(&isbn)?;
                self.emit(&book, || print_books(std::slice::from_ref(&book)))
            }
            BookAction::Search { keyword, author } => {
                let query = if author {
                    BookQuery::author(keyword)
                } else {
                    BookQuery::title(keyword)
                };
                let books = engine.search_books(&query)?;
                self.emit(&books, || {
                    if books.is_empty() {
                        println!("No books found matching the search criteria.");
                    } else {
                        print_books(&books);
                    }
                })
            }
        }
    }

    fn student(&self, action: StudentAction) -> anyhow::Result<()> {
        let engine = self.engine()?;
        match action {
            StudentAction::Add {
                name,
                class,
                roll_no,
            } => {
                let student = engine.add_student(&NewStudent {
                    name,
                    class,
                    roll_no,
                })?;
                self.emit(&student, || {
                    println!(
                        "{} Student {:?} added (ID {}).",
                        "✓".green(),
                        student.name,
                        student.id.to_string().yellow()
                    );
                })
            }
            StudentAction::Remove { id, yes } => {
                let student = engine.find_student(id)?;
                if !yes && !confirm(&format!("Remove student {:?} (ID {id})?", student.name))? {
                    return self.cancelled("Removal");
                }
                let student = engine.remove_student(id)?;
                self.emit(&student, || {
                    println!("{} Student {:?} removed.", "✓".green(), student.name);
                })
            }
            StudentAction::Show { id } => {
                let student = engine.find_student(id)?;
                self.emit(&student, || print_students(std::slice::from_ref(&student)))
            }
            StudentAction::List => {
                let students = engine.list_students()?;
                self.emit(&students, || {
                    if students.is_empty() {
                        println!("No students on the roster.");
                    } else {
                        print_students(&students);
                    }
                })
            }
        }
    }

    fn issue(&self, args: LoanArgs) -> anyhow::Result<()> {
        let engine = self.engine()?;
        let today = clock_for(&args).today();
        let out = engine.issue_book(args.student, &args.isbn, today)?;
        let receipt = self.write_receipt("issue", |w| w.write_issue(&out));
        self.emit(&out, || print_issue(&out, receipt.as_deref()))
    }

    fn return_book(&self, args: LoanArgs) -> anyhow::Result<()> {
        let engine = self.engine()?;
        let today = clock_for(&args).today();
        let out = engine.return_book(args.student, &args.isbn, today)?;
        let receipt = self.write_receipt("return", |w| w.write_return(&out));
        self.emit(&out, || print_return(&out, receipt.as_deref()))
    }

    fn loans(&self, args: LoansArgs) -> anyhow::Result<()> {
        let filter = if args.outstanding {
            LoanFilter::Outstanding
        } else if args.returned {
            LoanFilter::Returned
        } else {
            LoanFilter::All
        };
        let entries = self.engine()?.loan_history(filter)?;
        self.emit(&entries, || {
            if entries.is_empty() {
                println!("No transaction records found.");
            } else {
                print_history(&entries);
            }
        })
    }

    /// Receipts are written after the loan change is committed. A failure
    /// here is reported but leaves the loan in place.
    fn write_receipt(
        &self,
        kind: &str,
        write: impl FnOnce(&ReceiptWriter) -> io::Result<PathBuf>,
    ) -> Option<PathBuf> {
        if !self.config.write_receipts {
            return None;
        }
        let writer = ReceiptWriter::new(&self.config.receipts_dir);
        match write(&writer) {
            Ok(path) => {
                debug!(kind, path = %path.display(), "receipt written");
                Some(path)
            }
            Err(err) => {
                warn!(kind, dir = %writer.dir().display(), error = %err, "failed to write receipt");
                None
            }
        }
    }

    fn cancelled(&self, what: &str) -> anyhow::Result<()> {
        self.emit(&serde_json::json!({ "cancelled": true }), || {
            println!("{what} cancelled.");
        })
    }
}

fn clock_for(args: &LoanArgs) -> Box<dyn Clock> {
    match args.date {
        Some(date) => Box::new(FixedClock::new(date)),
        None => Box::new(SystemClock),
    }
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let mut stderr = io::stderr();
    write!(stderr, "{prompt} (y/n): ")?;
    stderr.flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_books(books: &[Book]) {
    println!(
        "{}",
        format!("{:<5} {:<30} {:<20} {:<15} Copies", "ID", "Title", "Author", "ISBN").bold()
    );
    println!("{}", "-".repeat(80));
    for b in books {
        let copies = if b.copies_available == 0 {
            "0".red().to_string()
        } else {
            b.copies_available.to_string()
        };
        println!(
            "{:<5} {:<30} {:<20} {:<15} {}",
            b.id.to_string(),
            b.title,
            b.author,
            b.isbn.as_str(),
            copies
        );
    }
}

fn print_students(students: &[Student]) {
    println!(
        "{}",
        format!("{:<5} {:<25} {:<10} Roll No", "ID", "Name", "Class").bold()
    );
    println!("{}", "-".repeat(55));
    for s in students {
        println!(
            "{:<5} {:<25} {:<10} {}",
            s.id.to_string(),
            s.name,
            s.class,
            s.roll_no
        );
    }
}

fn print_history(entries: &[LoanHistoryEntry]) {
    println!(
        "{}",
        format!(
            "{:<7} {:<20} {:<30} {:<12} {:<12} Fine",
            "TransID", "Student Name", "Book Title", "Issue Date", "Return Date"
        )
        .bold()
    );
    println!("{}", "-".repeat(95));
    for e in entries {
        let student = e
            .student_name
            .clone()
            .unwrap_or_else(|| format!("(student {})", e.loan.student_id));
        let title = e
            .book_title
            .clone()
            .unwrap_or_else(|| format!("(book {})", e.loan.book_id));
        let returned = match e.loan.return_date {
            Some(date) => date.to_string(),
            None => "Not Returned".to_string(),
        };
        println!(
            "{:<7} {:<20} {:<30} {:<12} {:<12} {}",
            e.loan.id.to_string(),
            student,
            title,
            e.loan.issue_date.to_string(),
            returned,
            e.loan.fine
        );
    }
}

fn print_issue(out: &IssueOutcome, receipt: Option<&Path>) {
    println!(
        "{} Book {:?} issued to {:?} on {}.",
        "✓".green().bold(),
        out.book_title,
        out.student_name,
        out.issue_date
    );
    println!("  Due: {}", out.due_date.to_string().yellow());
    println!("  Copies left: {}", out.copies_remaining);
    if let Some(path) = receipt {
        println!("  Receipt: {}", path.display());
    }
}

fn print_return(out: &ReturnOutcome, receipt: Option<&Path>) {
    println!(
        "{} Book {:?} returned by {:?} on {}.",
        "✓".green().bold(),
        out.book_title,
        out.student_name,
        out.return_date
    );
    let fine = format!("{} units", out.fine);
    if out.was_late() {
        println!("  Fine due: {} ({} days late)", fine.red().bold(), out.late_days);
    } else {
        println!("  Fine due: {}", fine.green());
    }
    if let Some(path) = receipt {
        println!("  Receipt: {}", path.display());
    }
}
