//! Book Scanner library entry point.
//!
//! Wires the domains together behind the CLI. No business logic lives
//! here, only module declarations and runtime startup.
//!
//! Domains:
//!   - capture:   load and crop cover images
//!   - ocr:       text recognizers + the search-query heuristic
//!   - books:     Google Books resolver and the book record
//!   - library:   saved-books collection over a blob store
//!   - pipeline:  scan orchestration (image → text → query → book)
//!   - commands:  CLI handlers

pub mod books;
pub mod capture;
pub mod cli;
mod commands;
pub mod library;
pub mod ocr;
pub mod pipeline;
pub mod settings;

use clap::Parser;
use std::process::ExitCode;

pub use commands::format_book;

/// Entry point, called by the binary.
pub fn run() -> ExitCode {
    // .env.local → .env, before logging so RUST_LOG from the file applies.
    let env_file = settings::load_dotenv();

    env_logger::init();

    if let Some(path) = env_file {
        log::info!("[STARTUP] Loaded {}", path.display());
    }

    let cli = cli::Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[STARTUP] Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(commands::dispatch(cli))
}
