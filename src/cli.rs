//! Command-line surface.
//!
//! Subcommands stand in for the app's screens: `scan` is the camera view,
//! `library` the saved-books list, `library show` the details view.

use crate::capture::CropRegion;
use crate::ocr::OcrProvider;
use crate::settings::ApiService;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "book-scanner", version, about = "Scan book covers into a personal library")]
pub struct Cli {
    /// Directory holding the saved library (overrides BOOK_SCANNER_LIBRARY_DIR).
    #[arg(long, global = true, value_name = "DIR")]
    pub library_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recognize a cover image and look the book up.
    Scan {
        image: PathBuf,
        #[command(flatten)]
        ocr: OcrArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the text recognized on an image.
    Ocr {
        image: PathBuf,
        #[command(flatten)]
        ocr: OcrArgs,
    },
    /// Print the search query derived from OCR text (reads stdin when omitted).
    Query { text: Option<String> },
    /// Free-text book search.
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Look a book up by ISBN-10 or ISBN-13.
    Isbn {
        isbn: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Look a book up by title and optional author.
    Lookup {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Browse and edit saved books.
    Library {
        #[command(subcommand)]
        action: LibraryCommand,
    },
    /// Print (or copy) a share message for a saved book.
    Share {
        id: String,
        /// Copy the message to the clipboard instead of printing it.
        #[arg(long)]
        copy: bool,
    },
    /// Manage API keys stored in the OS keychain.
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum LibraryCommand {
    /// List saved books in the order they were saved.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show one saved book.
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Remove a saved book.
    Remove { id: String },
    /// Remove every saved book.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum KeyCommand {
    /// Store an API key for books, vision or ocr-space.
    Set { service: ApiService, key: String },
}

#[derive(Debug, Clone, Args)]
pub struct OcrArgs {
    /// OCR service to use (vision or ocr-space). Defaults to OCR_PROVIDER.
    #[arg(long)]
    pub provider: Option<OcrProvider>,
    /// Crop the image from its origin before OCR, e.g. 900x900.
    #[arg(long, value_name = "WxH")]
    pub crop: Option<CropRegion>,
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Save the found book to the library.
    #[arg(long, conflicts_with = "toggle")]
    pub save: bool,
    /// Save the found book if it isn't saved yet, remove it if it is.
    #[arg(long)]
    pub toggle: bool,
    /// Print the book as JSON.
    #[arg(long)]
    pub json: bool,
}
