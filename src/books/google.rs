//! Google Books volumes client.
//!
//! Every lookup is one GET against the volumes endpoint, and the first hit
//! is normalized into a `BookRecord`. Differences between operations are
//! only in how `q` is built:
//! - free text: `q=<query>&maxResults=5`
//! - ISBN: `q=isbn:<isbn>`
//! - title/author: `q=<title>+inauthor:<author>`

use super::types::{BookRecord, VolumeSearchResponse};
use std::fmt;

pub const DEFAULT_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// Candidate cap for free-text searches.
pub const TEXT_SEARCH_MAX_RESULTS: u32 = 5;

/// Which lookup failed. This is the only detail a `ResolveError` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Search,
    Isbn,
    TitleAuthor,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Search => "search",
            Operation::Isbn => "isbn",
            Operation::TitleAuthor => "title_author",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Failed to fetch book information ({operation})")]
    FetchFailed { operation: Operation },
}

/// Client for the volumes search endpoint.
#[derive(Debug, Clone)]
pub struct BooksClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl BooksClient {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Free-text search, capped at five candidates.
    pub async fn search(&self, query: &str) -> Result<Option<BookRecord>, ResolveError> {
        self.fetch_first(Operation::Search, query.to_string(), Some(TEXT_SEARCH_MAX_RESULTS))
            .await
    }

    /// Search scoped to a standardized book number.
    pub async fn search_by_isbn(&self, isbn: &str) -> Result<Option<BookRecord>, ResolveError> {
        self.fetch_first(Operation::Isbn, format!("isbn:{}", isbn), None)
            .await
    }

    /// Title search with an optional `inauthor:` filter. An empty author
    /// counts as no author.
    pub async fn search_by_title_and_author(
        &self,
        title: &str,
        author: Option<&str>,
    ) -> Result<Option<BookRecord>, ResolveError> {
        let query = title_author_query(title, author);
        self.fetch_first(Operation::TitleAuthor, query, None).await
    }

    async fn fetch_first(
        &self,
        operation: Operation,
        query: String,
        max_results: Option<u32>,
    ) -> Result<Option<BookRecord>, ResolveError> {
        let start = std::time::Instant::now();
        log::info!("[BOOKS] {} q={:?}", operation, query);

        let mut params: Vec<(&str, String)> = vec![("q", query)];
        if let Some(key) = &self.api_key {
            params.push(("key", key.clone()));
        }
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }

        let response = self
            .http
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                log::error!("[BOOKS] HTTP request failed: {}", e);
                ResolveError::FetchFailed { operation }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[BOOKS] API returned {}: {}", status, body);
            return Err(ResolveError::FetchFailed { operation });
        }

        let parsed: VolumeSearchResponse = response.json().await.map_err(|e| {
            log::error!("[BOOKS] Failed to decode response: {}", e);
            ResolveError::FetchFailed { operation }
        })?;

        log::info!(
            "[BOOKS] {} returned {} item(s) (totalItems={:?}) in {}ms",
            operation,
            parsed.items.len(),
            parsed.total_items,
            start.elapsed().as_millis()
        );

        Ok(parsed.into_first_record())
    }
}

/// `title` alone, or `title+inauthor:author`.
pub fn title_author_query(title: &str, author: Option<&str>) -> String {
    match author {
        Some(author) if !author.is_empty() => format!("{}+inauthor:{}", title, author),
        _ => title.to_string(),
    }
}
