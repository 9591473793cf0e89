//! Command-line front end for `lendlib_core` snapshots.
//!
//! # Responsibility
//! - Convert snapshots between JSON and XML by file extension.
//! - Print a summary of a snapshot for quick inspection.
//! - Write the sample lending system to disk.
//!
//! # Invariants
//! - Without a subcommand, output is the deterministic core probe.
//! - Errors go to stderr and map to a non-zero exit code.

use chrono::{Days, Local};
use clap::{Parser, Subcommand};
use lendlib_core::{
    default_log_level, init_logging, load_from_path_with_options, save_to_path_with_options, Book,
    DanglingPolicy, LendingError, LendingService, Librarian, LibrarySystem, LoggingError, Reader,
    SnapshotError, SnapshotFormat, SnapshotOptions, ValidationError,
};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Lending-library snapshot tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Write log files to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Write snapshots without indentation
    #[arg(long, global = true)]
    compact: bool,

    /// Drop dangling references on load instead of failing
    #[arg(long, global = true)]
    skip_dangling: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load INPUT and save it as OUTPUT; formats follow the file extensions
    Convert { input: PathBuf, output: PathBuf },
    /// Print entity counts and one line per book and loan
    Inspect { input: PathBuf },
    /// Write the sample system as library_system.json and library_system.xml
    Demo { dir: PathBuf },
}

#[derive(Debug)]
enum CliError {
    UnknownFormat(PathBuf),
    CurrentDir(std::io::Error),
    Logging(LoggingError),
    Snapshot(SnapshotError),
    Validation(ValidationError),
    Lending(LendingError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFormat(path) => write!(
                f,
                "cannot infer snapshot format of `{}`; expected a .json or .xml extension",
                path.display()
            ),
            Self::CurrentDir(err) => write!(f, "cannot resolve current directory: {err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Lending(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CurrentDir(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Lending(err) => Some(err),
            Self::UnknownFormat(_) => None,
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(err: LoggingError) -> Self {
        Self::Logging(err)
    }
}

impl From<SnapshotError> for CliError {
    fn from(err: SnapshotError) -> Self {
        Self::Snapshot(err)
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<LendingError> for CliError {
    fn from(err: LendingError) -> Self {
        Self::Lending(err)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    if let Some(log_dir) = &args.log_dir {
        init_logging(log_level(&args), absolute(log_dir)?)?;
    }

    let options = SnapshotOptions {
        pretty: !args.compact,
        dangling: if args.skip_dangling {
            DanglingPolicy::Skip
        } else {
            DanglingPolicy::FailFast
        },
    };

    match args.command {
        None => {
            println!("lendlib_core ping={}", lendlib_core::ping());
            println!("lendlib_core version={}", lendlib_core::core_version());
            Ok(())
        }
        Some(Command::Convert { input, output }) => convert(&input, &output, &options),
        Some(Command::Inspect { input }) => inspect(&input, &options),
        Some(Command::Demo { dir }) => demo(&dir, &options),
    }
}

fn convert(input: &Path, output: &Path, options: &SnapshotOptions) -> Result<(), CliError> {
    let from = format_of(input)?;
    let to = format_of(output)?;

    let system = load_from_path_with_options(input, from, options)?;
    save_to_path_with_options(&system, output, to, options)?;

    info!(
        "event=cli_convert module=cli status=ok from={} to={} loans={}",
        from.as_str(),
        to.as_str(),
        system.loans.len()
    );
    println!(
        "converted {} -> {} ({} -> {})",
        input.display(),
        output.display(),
        from.as_str(),
        to.as_str()
    );
    Ok(())
}

fn inspect(input: &Path, options: &SnapshotOptions) -> Result<(), CliError> {
    let format = format_of(input)?;
    let system = load_from_path_with_options(input, format, options)?;
    print_summary(&system);
    Ok(())
}

fn demo(dir: &Path, options: &SnapshotOptions) -> Result<(), CliError> {
    if let Err(err) = Book::fiction(10, "Bad Book", "Author", -2024, "science fiction") {
        println!("rejected: {err}");
    }

    let system = sample_system()?;
    std::fs::create_dir_all(dir).map_err(SnapshotError::Io)?;

    for format in [SnapshotFormat::Json, SnapshotFormat::Xml] {
        let path = dir.join(format!("library_system.{}", format.as_str()));
        save_to_path_with_options(&system, &path, format, options)?;
        println!("saved {}", path.display());
    }

    let reloaded = load_from_path_with_options(
        dir.join("library_system.json"),
        SnapshotFormat::Json,
        options,
    )?;
    print_summary(&reloaded);
    Ok(())
}

/// Three books, one librarian, one reader and a two-week loan starting today.
fn sample_system() -> Result<LibrarySystem, CliError> {
    let mut system = LibrarySystem::default();
    let library = &mut system.library;
    library.add_book(Book::fiction(
        1,
        "Master and Margarita",
        "Mikhail Bulgakov",
        1966,
        "novel",
    )?);
    library.add_book(Book::scientific(
        2,
        "A Brief History of Time",
        "Stephen Hawking",
        1988,
        "physics",
    )?);
    library.add_book(Book::textbook(
        3,
        "Python for Beginners",
        "John Smith",
        2023,
        "programming",
    )?);
    library.add_librarian(Librarian::new(1, "Anna Petrova", "LIB001"));
    system.add_reader(Reader::new(1, "Sergey Ivanov", "+79991234567"));

    let today = Local::now().date_naive();
    let due = today + Days::new(14);
    LendingService::new(&mut system).borrow_book(1, 1, 1, today, due)?;
    Ok(system)
}

fn print_summary(system: &LibrarySystem) {
    println!("books: {}", system.library.books.len());
    println!("librarians: {}", system.library.librarians.len());
    println!("readers: {}", system.readers.len());
    println!("loans: {}", system.loans.len());
    for book in &system.library.books {
        println!("  {}", book.borrow().describe());
    }
    for loan in &system.loans {
        println!("  {}", loan.borrow().describe());
    }
}

/// `--log-level` when given, else the build-profile default.
fn log_level(args: &Args) -> &str {
    args.log_level.as_deref().unwrap_or(default_log_level())
}

fn format_of(path: &Path) -> Result<SnapshotFormat, CliError> {
    SnapshotFormat::from_path(path).ok_or_else(|| CliError::UnknownFormat(path.to_path_buf()))
}

fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(CliError::CurrentDir)?;
    Ok(cwd.join(path))
}
