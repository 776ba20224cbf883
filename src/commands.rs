//! Command handlers.
//!
//! Thin wrappers that bridge CLI subcommands to the domains: build clients
//! from settings, call one domain operation, print the result. The scan
//! flow lives in pipeline.rs.

use crate::books::isbn::{normalize_isbn, IsbnError};
use crate::books::{self, BookRecord, ResolveError};
use crate::capture::{self, CaptureError};
use crate::cli::{Cli, Command, KeyCommand, LibraryCommand, OcrArgs, OutputArgs};
use crate::library::{BlobStore, FileBlobStore, Library, LibraryError, StoreError};
use crate::ocr::heuristics::build_search_query;
use crate::ocr::RecognizeError;
use crate::pipeline::{self, PipelineError, ScanOutcome};
use crate::settings::{self, Settings, SettingsError};
use std::io::Write;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;

const NO_TEXT_MESSAGE: &str =
    "No text detected: Please try again with a clearer image of the book cover.";
const NOT_FOUND_MESSAGE: &str =
    "Book not found: We couldn't find information about this book. Please try again.";
const SCAN_ERROR_MESSAGE: &str = "Error: There was an error scanning the book. Please try again.";

/// Exit status for "no text detected".
const EXIT_NO_TEXT: u8 = 2;
/// Exit status for "book not found".
const EXIT_NOT_FOUND: u8 = 3;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Isbn(#[from] IsbnError),
    #[error("No saved book with id '{0}'")]
    NotSaved(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ResolveError> for CommandError {
    fn from(e: ResolveError) -> Self {
        CommandError::Pipeline(e.into())
    }
}

impl From<RecognizeError> for CommandError {
    fn from(e: RecognizeError) -> Self {
        CommandError::Pipeline(e.into())
    }
}

impl From<CaptureError> for CommandError {
    fn from(e: CaptureError) -> Self {
        CommandError::Pipeline(e.into())
    }
}

impl From<StoreError> for CommandError {
    fn from(e: StoreError) -> Self {
        CommandError::Library(e.into())
    }
}

/// Run a parsed command line to completion and map the result to an exit code.
pub async fn dispatch(cli: Cli) -> ExitCode {
    match run_command(cli).await {
        Ok(code) => code,
        Err(CommandError::Pipeline(e)) => {
            log::error!("[COMMAND] {}", e);
            eprintln!("{}", SCAN_ERROR_MESSAGE);
            eprintln!("  ({})", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("[COMMAND] {}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_command(cli: Cli) -> Result<ExitCode, CommandError> {
    let mut settings = Settings::from_env()?;
    if let Some(dir) = cli.library_dir {
        settings.library_dir = dir;
    }

    match cli.command {
        Command::Scan { image, ocr, output } => scan(&settings, &image, &ocr, &output).await,
        Command::Ocr { image, ocr } => recognize(&settings, &image, &ocr).await,
        Command::Query { text } => query(text).await,
        Command::Search { query, output } => {
            let http = settings.http_client()?;
            let found = settings.books_client(http).search(&query.join(" ")).await?;
            show_lookup(&settings, found, &output).await
        }
        Command::Isbn { isbn, output } => {
            let isbn = normalize_isbn(&isbn)?;
            let http = settings.http_client()?;
            let found = settings.books_client(http).search_by_isbn(&isbn).await?;
            show_lookup(&settings, found, &output).await
        }
        Command::Lookup {
            title,
            author,
            output,
        } => {
            let http = settings.http_client()?;
            let found = settings
                .books_client(http)
                .search_by_title_and_author(&title, author.as_deref())
                .await?;
            show_lookup(&settings, found, &output).await
        }
        Command::Library { action } => library(&settings, action).await,
        Command::Share { id, copy } => share(&settings, &id, copy).await,
        Command::Key {
            action: KeyCommand::Set { service, key },
        } => {
            settings::save_api_key(service, &key)?;
            println!("Saved {} API key to the OS keychain.", service);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn scan(
    settings: &Settings,
    image: &std::path::Path,
    ocr: &OcrArgs,
    output: &OutputArgs,
) -> Result<ExitCode, CommandError> {
    let provider = ocr.provider.unwrap_or(settings.ocr_provider);
    let http = settings.http_client()?;
    let recognizer = settings.recognizer(provider, http.clone())?;
    let books = settings.books_client(http);

    let outcome = pipeline::scan_file(recognizer.as_ref(), &books, image, ocr.crop).await?;
    match outcome {
        ScanOutcome::NoText => {
            eprintln!("{}", NO_TEXT_MESSAGE);
            Ok(ExitCode::from(EXIT_NO_TEXT))
        }
        ScanOutcome::NotFound { query, .. } => {
            eprintln!("{}", NOT_FOUND_MESSAGE);
            eprintln!("  (searched for {:?})", query);
            Ok(ExitCode::from(EXIT_NOT_FOUND))
        }
        ScanOutcome::Found { book, .. } => show_lookup(settings, Some(book), output).await,
    }
}

async fn recognize(
    settings: &Settings,
    image: &std::path::Path,
    ocr: &OcrArgs,
) -> Result<ExitCode, CommandError> {
    let provider = ocr.provider.unwrap_or(settings.ocr_provider);
    let recognizer = settings.recognizer(provider, settings.http_client()?)?;

    let text = match ocr.crop {
        Some(region) => {
            let bytes = capture::load_cover(image, Some(region)).await?;
            recognizer.recognize(&bytes).await?
        }
        None => recognizer.recognize_file(image).await?,
    };

    match text.filter(|t| !t.trim().is_empty()) {
        Some(text) => {
            println!("{}", text.trim_end());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{}", NO_TEXT_MESSAGE);
            Ok(ExitCode::from(EXIT_NO_TEXT))
        }
    }
}

async fn query(text: Option<String>) -> Result<ExitCode, CommandError> {
    let text = match text {
        Some(t) => t,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    println!("{}", build_search_query(Some(&text)));
    Ok(ExitCode::SUCCESS)
}

/// Print a lookup result and apply `--save` / `--toggle`.
async fn show_lookup(
    settings: &Settings,
    found: Option<BookRecord>,
    output: &OutputArgs,
) -> Result<ExitCode, CommandError> {
    let Some(book) = found else {
        eprintln!("{}", NOT_FOUND_MESSAGE);
        return Ok(ExitCode::from(EXIT_NOT_FOUND));
    };

    print_book(&book, output.json)?;

    if output.save || output.toggle {
        let library = open_library(settings).await?;
        if output.toggle {
            let saved = library.toggle(&book).await?;
            eprintln!(
                "{} '{}'",
                if saved { "Saved" } else { "Removed" },
                book.title
            );
        } else if library.save(&book).await? {
            eprintln!("Saved '{}'", book.title);
        } else {
            eprintln!("'{}' is already in your library", book.title);
        }
        library.close().await?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn library(settings: &Settings, action: LibraryCommand) -> Result<ExitCode, CommandError> {
    let library = open_library(settings).await?;
    run_library_command(library, action).await
}

/// Run one library subcommand, then close the store whether or not it failed.
async fn run_library_command<S: BlobStore>(
    library: Library<S>,
    action: LibraryCommand,
) -> Result<ExitCode, CommandError> {
    let result = library_action(&library, action).await;
    let closed = library.close().await;
    let code = result?;
    closed?;
    Ok(code)
}

async fn library_action<S: BlobStore>(
    library: &Library<S>,
    action: LibraryCommand,
) -> Result<ExitCode, CommandError> {
    match action {
        LibraryCommand::List { json } => {
            let books = library.get_all().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&books)?);
            } else if books.is_empty() {
                println!("Your library is empty. Scan a book to get started.");
            } else {
                for book in &books {
                    println!("{}  {} by {}", book.id, book.title, book.author_line());
                }
                println!("\n{} book(s)", books.len());
            }
            Ok(ExitCode::SUCCESS)
        }
        LibraryCommand::Show { id, json } => match library.get(&id).await {
            Some(book) => {
                print_book(&book, json)?;
                Ok(ExitCode::SUCCESS)
            }
            None => Err(CommandError::NotSaved(id)),
        },
        LibraryCommand::Remove { id } => {
            if library.remove(&id).await? {
                println!("Removed '{}'", id);
            } else {
                println!("'{}' was not in your library", id);
            }
            Ok(ExitCode::SUCCESS)
        }
        LibraryCommand::Clear { yes } => {
            if !yes && !confirm("Are you sure you want to remove all saved books?")? {
                println!("Cancelled.");
            } else {
                library.clear_all().await?;
                println!("Library cleared.");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn share(settings: &Settings, id: &str, copy: bool) -> Result<ExitCode, CommandError> {
    let library = open_library(settings).await?;
    let book = library.get(id).await;
    library.close().await?;
    let book = book.ok_or_else(|| CommandError::NotSaved(id.to_string()))?;

    let message = books::share_message(&book);
    if copy {
        copy_to_clipboard(&message)?;
        println!("Copied share message for '{}' to the clipboard.", book.title);
    } else {
        println!("{}", message);
    }
    Ok(ExitCode::SUCCESS)
}

async fn open_library(settings: &Settings) -> Result<Library<FileBlobStore>, CommandError> {
    let store = FileBlobStore::open(&settings.library_dir).await?;
    Ok(Library::new(store))
}

/// Copy text to the system clipboard via arboard.
fn copy_to_clipboard(text: &str) -> Result<(), CommandError> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| CommandError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text)
        .map_err(|e| CommandError::Clipboard(e.to_string()))?;
    log::info!("[SHARE] Copied {} chars to clipboard", text.len());
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, std::io::Error> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_book(book: &BookRecord, json: bool) -> Result<(), CommandError> {
    if json {
        println!("{}", serde_json::to_string_pretty(book)?);
    } else {
        print!("{}", format_book(book));
    }
    Ok(())
}

/// Human-readable details block, laid out like the details screen.
pub fn format_book(book: &BookRecord) -> String {
    let mut out = String::new();
    out.push_str(&book.title);
    out.push('\n');
    if !book.subtitle.is_empty() {
        out.push_str(&book.subtitle);
        out.push('\n');
    }
    out.push_str(&format!("by {}\n", book.author_line()));
    if book.average_rating > 0.0 {
        out.push_str(&format!(
            "Rating: {:.1}/5 ({} ratings)\n",
            book.average_rating, book.ratings_count
        ));
    }
    out.push('\n');

    let mut detail = |label: &str, value: String| {
        if !value.is_empty() {
            out.push_str(&format!("{:<11}{}\n", format!("{}:", label), value));
        }
    };
    detail("Publisher", book.publisher.clone());
    detail("Published", book.published_date.clone());
    detail(
        "Pages",
        if book.page_count > 0 { book.page_count.to_string() } else { String::new() },
    );
    detail("Language", book.language.to_uppercase());
    detail("Categories", book.categories.join(", "));
    detail("ID", book.id.clone());
    detail("Preview", book.preview_link.clone());
    detail("Info", book.info_link.clone());
    detail(
        "Cover",
        book.image_links.thumbnail.clone().unwrap_or_default(),
    );

    out.push_str(&format!("\nDescription\n{}\n", book.description));
    out
}
