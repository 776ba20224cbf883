//! Books domain: metadata resolution against Google Books.
//!
//! External code should only use what is exported here:
//!   - types.rs:  `BookRecord` and the volumes response shapes
//!   - google.rs: `BooksClient` (text / ISBN / title+author lookups)
//!   - isbn.rs:   ISBN input normalization

mod google;
pub mod isbn;
pub mod types;

pub use google::{
    title_author_query, BooksClient, Operation, ResolveError, DEFAULT_BOOKS_API_URL,
    TEXT_SEARCH_MAX_RESULTS,
};
pub use types::{BookRecord, ImageLinks};

/// Text used when sharing a book, matching the details view's share action.
pub fn share_message(book: &BookRecord) -> String {
    let mut message = format!("Check out this book: {} by {}", book.title, book.author_line());
    if !book.info_link.is_empty() {
        message.push('\n');
        message.push_str(&book.info_link);
    }
    message
}
