use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use libris_types::{Isbn, LoanDate, StudentId};

#[derive(Debug, Parser)]
#[command(
    name = "libris",
    about = "Libris: school library catalog, roster, and loans",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Config file (defaults to ./libris.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Library database, overriding the config file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the library database and receipts directory
    Init,
    /// Manage the book catalog
    Book(BookArgs),
    /// Manage the student roster
    Student(StudentArgs),
    /// Issue a book to a student
    Issue(LoanArgs),
    /// Return a book and settle any fine
    Return(LoanArgs),
    /// Show the transaction history, newest first
    Loans(LoansArgs),
}

#[derive(Debug, Args)]
pub struct BookArgs {
    #[command(subcommand)]
    pub action: BookAction,
}

#[derive(Debug, Subcommand)]
pub enum BookAction {
    /// Add a book to the catalog
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        #[arg(long)]
        isbn: Isbn,
        #[arg(long, default_value = "1")]
        copies: u32,
    },
    /// Change a book's details; omitted fields keep their value
    Update {
        isbn: Isbn,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// New number of copies on the shelf
        #[arg(long)]
        copies: Option<u32>,
    },
    /// Delete a book that is not on loan
    Delete {
        isbn: Isbn,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show one book
    Show { isbn: Isbn },
    /// Search titles (or authors) for a keyword
    Search {
        keyword: String,
        #[arg(long)]
        author: bool,
    },
}

#[derive(Debug, Args)]
pub struct StudentArgs {
    #[command(subcommand)]
    pub action: StudentAction,
}

#[derive(Debug, Subcommand)]
pub enum StudentAction {
    /// Add a student to the roster
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        class: String,
        #[arg(long)]
        roll_no: String,
    },
    /// Remove a student with no books on loan
    Remove {
        id: StudentId,
        #[arg(short, long)]
        yes: bool,
    },
    /// Show one student
    Show { id: StudentId },
    /// List every student
    List,
}

#[derive(Debug, Args)]
pub struct LoanArgs {
    pub student: StudentId,
    pub isbn: Isbn,
    /// Transaction date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<LoanDate>,
}

#[derive(Debug, Args)]
pub struct LoansArgs {
    /// Only loans not yet returned
    #[arg(long, conflicts_with = "returned")]
    pub outstanding: bool,
    /// Only returned loans
    #[arg(long)]
    pub returned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("libris").chain(args.iter().copied()))
    }

    #[test]
    fn issue_takes_typed_arguments() {
        let cli = parse(&["issue", "7", "978-0", "--date", "2024-03-01"]).unwrap();
        match cli.command {
            Command::Issue(args) => {
                assert_eq!(args.student, StudentId::new(7));
                assert_eq!(args.isbn.as_str(), "978-0");
                assert_eq!(args.date, Some(LoanDate::from_ymd(2024, 3, 1).unwrap()));
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(parse(&["issue", "seven", "111"]).is_err());
        assert!(parse(&["return", "1", "111", "--date", "2024-02-30"]).is_err());
        assert!(parse(&["book", "add", "--title", "T", "--author", "A", "--isbn", " "]).is_err());
        assert!(parse(&["book", "add", "--title", "T", "--author", "A", "--isbn", "1", "--copies", "-1"]).is_err());
    }

    #[test]
    fn globals_work_after_subcommand() {
        let cli = parse(&["loans", "--outstanding", "--format", "json", "--db", "x.db"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        assert!(matches!(cli.command, Command::Loans(LoansArgs { outstanding: true, .. })));
    }

    #[test]
    fn loan_filters_conflict() {
        assert!(parse(&["loans", "--outstanding", "--returned"]).is_err());
    }

    #[test]
    fn book_update_fields_are_optional() {
        let cli = parse(&["book", "update", "111", "--copies", "0"]).unwrap();
        match cli.command {
            Command::Book(BookArgs {
                action: BookAction::Update { title, copies, .. },
            }) => {
                assert_eq!(title, None);
                assert_eq!(copies, Some(0));
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
