//! Personal library: saved books over an injected blob store.
//!
//! The whole collection is one JSON array under the `savedBooks` key. Every
//! mutation reads the array, changes it and writes it back. That is fine at
//! personal-library scale (tens to low hundreds of records).
//!
//! Readers (`get_all`, `get`, `is_saved`) log read failures and treat the
//! library as empty. Mutators refuse to write over a blob they could not
//! read, so a failed read never replaces saved books.

mod store;

pub use store::{BlobStore, FileBlobStore, MemoryBlobStore, StoreError};

use crate::books::BookRecord;

/// Storage key holding the serialized library.
pub const STORAGE_KEY: &str = "savedBooks";

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Failed to serialize library: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Saved books are not valid JSON ({0}); fix the file or run `book-scanner library clear`")]
    Corrupt(#[source] serde_json::Error),
}

/// The user's saved books, in insertion order, unique by id.
pub struct Library<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> Library<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Idempotent insert: a record whose id is already saved is left alone.
    /// Returns whether the record was added.
    pub async fn save(&self, book: &BookRecord) -> Result<bool, LibraryError> {
        let mut books = self.load().await?;
        if books.iter().any(|b| b.id == book.id) {
            log::info!("[LIBRARY] '{}' already saved", book.id);
            return Ok(false);
        }
        books.push(book.clone());
        self.write(&books).await?;
        log::info!("[LIBRARY] Saved '{}' ({} total)", book.id, books.len());
        Ok(true)
    }

    /// Every saved book. Empty when nothing is stored or the blob can't be read.
    pub async fn get_all(&self) -> Vec<BookRecord> {
        self.load().await.unwrap_or_else(|e| {
            log::warn!("[LIBRARY] Failed to read saved books: {}", e);
            Vec::new()
        })
    }

    /// Single saved book by id.
    pub async fn get(&self, id: &str) -> Option<BookRecord> {
        self.get_all().await.into_iter().find(|b| b.id == id)
    }

    /// Drop a book by id. Removing an id that isn't saved is a no-op.
    /// Returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> Result<bool, LibraryError> {
        let books = self.load().await?;
        let before = books.len();
        let remaining: Vec<BookRecord> = books.into_iter().filter(|b| b.id != id).collect();
        if remaining.len() == before {
            log::info!("[LIBRARY] Remove '{}': not saved", id);
            return Ok(false);
        }
        self.write(&remaining).await?;
        log::info!("[LIBRARY] Removed '{}' ({} left)", id, remaining.len());
        Ok(true)
    }

    pub async fn is_saved(&self, id: &str) -> bool {
        self.get_all().await.iter().any(|b| b.id == id)
    }

    /// Save when not saved, remove otherwise. Returns the new saved state.
    pub async fn toggle(&self, book: &BookRecord) -> Result<bool, LibraryError> {
        if self.load().await?.iter().any(|b| b.id == book.id) {
            self.remove(&book.id).await?;
            Ok(false)
        } else {
            self.save(book).await?;
            Ok(true)
        }
    }

    /// Empty the library entirely.
    pub async fn clear_all(&self) -> Result<(), LibraryError> {
        self.store.delete(STORAGE_KEY).await?;
        log::info!("[LIBRARY] Cleared all saved books");
        Ok(())
    }

    /// Close the underlying store.
    pub async fn close(self) -> Result<(), LibraryError> {
        self.store.close().await?;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored books, or the read/parse error. Missing blob is an empty library.
    async fn load(&self) -> Result<Vec<BookRecord>, LibraryError> {
        match self.store.get(STORAGE_KEY).await? {
            Some(raw) => serde_json::from_str(&raw).map_err(LibraryError::Corrupt),
            None => Ok(Vec::new()),
        }
    }

    async fn write(&self, books: &[BookRecord]) -> Result<(), LibraryError> {
        let json = serde_json::to_string(books)?;
        self.store.set(STORAGE_KEY, &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::types::{Volume, VolumeInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn book(id: &str, title: &str) -> BookRecord {
        BookRecord::from_volume(Volume {
            id: id.to_string(),
            volume_info: VolumeInfo {
                title: Some(title.to_string()),
                ..Default::default()
            },
        })
    }

    fn ids(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.id.as_str()).collect()
    }

    /// Memory store whose reads can be made to fail.
    struct FlakyReads {
        inner: MemoryBlobStore,
        fail_reads: AtomicBool,
    }

    #[async_trait]
    impl BlobStore for FlakyReads {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StoreError::Io {
                    action: "read",
                    path: key.to_string(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "stream did not contain valid UTF-8",
                    ),
                });
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let library = Library::new(MemoryBlobStore::new());
        assert!(library.get_all().await.is_empty());
        assert!(!library.is_saved("any").await);
    }

    #[tokio::test]
    async fn save_is_idempotent_and_keeps_order() {
        let library = Library::new(MemoryBlobStore::new());
        assert!(library.save(&book("b", "Second")).await.unwrap());
        assert!(library.save(&book("a", "First")).await.unwrap());
        assert!(!library.save(&book("b", "Changed title")).await.unwrap());

        let all = library.get_all().await;
        assert_eq!(ids(&all), vec!["b", "a"]);
        // the original record is kept, not replaced
        assert_eq!(all[0].title, "Second");
    }

    #[tokio::test]
    async fn remove_missing_id_leaves_library_unchanged() {
        let library = Library::new(MemoryBlobStore::new());
        library.save(&book("a", "A")).await.unwrap();
        library.save(&book("b", "B")).await.unwrap();

        assert!(!library.remove("zzz").await.unwrap());
        assert_eq!(ids(&library.get_all().await), vec!["a", "b"]);

        assert!(library.remove("a").await.unwrap());
        assert_eq!(ids(&library.get_all().await), vec!["b"]);
    }

    #[tokio::test]
    async fn clear_all_then_get_all_is_empty() {
        let library = Library::new(MemoryBlobStore::new());
        library.save(&book("a", "A")).await.unwrap();
        library.clear_all().await.unwrap();
        assert!(library.get_all().await.is_empty());
        // clearing an empty library is fine too
        library.clear_all().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_blob_reads_as_empty_but_is_not_overwritten() {
        let library = Library::new(MemoryBlobStore::with_blobs([(STORAGE_KEY, "{not json")]));
        assert!(library.get_all().await.is_empty());
        assert!(!library.is_saved("a").await);

        assert!(matches!(
            library.save(&book("a", "A")).await,
            Err(LibraryError::Corrupt(_))
        ));
        assert!(matches!(library.remove("a").await, Err(LibraryError::Corrupt(_))));
        assert_eq!(
            library.store().get(STORAGE_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );

        // clearing is the way out
        library.clear_all().await.unwrap();
        assert!(library.save(&book("a", "A")).await.unwrap());
        assert_eq!(ids(&library.get_all().await), vec!["a"]);
    }

    #[tokio::test]
    async fn reads_records_written_with_sparse_fields() {
        let blob = r#"[{"id": "old", "title": "Legacy", "authors": ["Someone"], "language": "en"}]"#;
        let library = Library::new(MemoryBlobStore::with_blobs([(STORAGE_KEY, blob)]));
        let saved = library.get("old").await.unwrap();
        assert_eq!(saved.title, "Legacy");
        assert_eq!(saved.page_count, 0);
        assert_eq!(saved.image_links.thumbnail, None);
    }

    #[tokio::test]
    async fn toggle_flips_saved_state() {
        let library = Library::new(MemoryBlobStore::new());
        let gatsby = book("g", "Gatsby");
        assert!(library.toggle(&gatsby).await.unwrap());
        assert!(library.is_saved("g").await);
        assert!(!library.toggle(&gatsby).await.unwrap());
        assert!(!library.is_saved("g").await);
    }

    #[tokio::test]
    async fn write_failure_propagates_but_read_failure_does_not() {
        let library = Library::new(MemoryBlobStore::new());
        library.store().close().await.unwrap();
        assert!(library.get_all().await.is_empty());
        assert!(matches!(
            library.save(&book("a", "A")).await,
            Err(LibraryError::Store(StoreError::Closed))
        ));
    }

    #[tokio::test]
    async fn failed_read_never_overwrites_saved_books() {
        let library = Library::new(FlakyReads {
            inner: MemoryBlobStore::new(),
            fail_reads: AtomicBool::new(false),
        });
        library.save(&book("a", "A")).await.unwrap();
        library.save(&book("b", "B")).await.unwrap();

        library.store().fail_reads.store(true, Ordering::SeqCst);
        assert!(matches!(
            library.remove("zzz").await,
            Err(LibraryError::Store(StoreError::Io { .. }))
        ));
        assert!(library.save(&book("c", "C")).await.is_err());
        assert!(library.toggle(&book("a", "A")).await.is_err());

        library.store().fail_reads.store(false, Ordering::SeqCst);
        assert_eq!(ids(&library.get_all().await), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn removing_unsaved_id_does_not_rewrite() {
        let blob = r#"[{"id": "a", "title": "A", "authors": ["X"]}]"#;
        let library = Library::new(MemoryBlobStore::with_blobs([(STORAGE_KEY, blob)]));

        assert!(!library.remove("zzz").await.unwrap());
        // untouched byte for byte
        assert_eq!(library.store().get(STORAGE_KEY).await.unwrap().as_deref(), Some(blob));
    }
}
