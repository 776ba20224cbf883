//! Integration tests for the Google Books resolver against a local stub.
//!
//! The last test hits the real API and only runs when BOOKS_LIVE_TEST is set
//! (key loaded from .env.local the same way the binary does).

mod http_stub;

use book_scanner_lib::books::{BooksClient, Operation, ResolveError};

const GATSBY_RESPONSE: &str = r#"{
  "kind": "books#volumes",
  "totalItems": 2,
  "items": [
    {
      "id": "iXn5U2IzVH0C",
      "volumeInfo": {
        "title": "The Great Gatsby",
        "authors": ["F. Scott Fitzgerald"],
        "publisher": "Scribner",
        "publishedDate": "2004-09-30",
        "pageCount": 180,
        "categories": ["Fiction"],
        "averageRating": 4.0,
        "ratingsCount": 2231,
        "imageLinks": {
          "smallThumbnail": "http://books.google.com/small.jpg",
          "thumbnail": "http://books.google.com/thumb.jpg"
        },
        "language": "en",
        "previewLink": "http://books.google.com/preview",
        "infoLink": "http://books.google.com/info"
      }
    },
    {
      "id": "second",
      "volumeInfo": { "title": "Gatsby Study Guide" }
    }
  ]
}"#;

fn client(url: &str, key: Option<&str>) -> BooksClient {
    BooksClient::new(reqwest::Client::new(), url, key.map(str::to_string))
}

#[tokio::test]
async fn search_sends_query_and_cap_and_takes_first_item() {
    let stub = http_stub::serve("/books/v1/volumes", 200, GATSBY_RESPONSE).await;

    let book = client(&stub.url, Some("books-key"))
        .search("THE GREAT GATSBY F. Scott Fitzgerald")
        .await
        .unwrap()
        .expect("expected a book");

    assert_eq!(book.id, "iXn5U2IzVH0C");
    assert_eq!(book.title, "The Great Gatsby");
    assert_eq!(book.authors, vec!["F. Scott Fitzgerald"]);
    assert_eq!(book.page_count, 180);
    assert_eq!(book.description, "No description available");
    assert_eq!(
        book.image_links.thumbnail.as_deref(),
        Some("http://books.google.com/thumb.jpg")
    );

    let req = stub.single_request();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path(), "/books/v1/volumes");
    assert_eq!(
        req.query_param("q").as_deref(),
        Some("THE GREAT GATSBY F. Scott Fitzgerald")
    );
    assert_eq!(req.query_param("maxResults").as_deref(), Some("5"));
    assert_eq!(req.query_param("key").as_deref(), Some("books-key"));
}

#[tokio::test]
async fn isbn_lookup_uses_filter_token_without_cap() {
    let stub = http_stub::serve("/volumes", 200, GATSBY_RESPONSE).await;

    let book = client(&stub.url, None)
        .search_by_isbn("9780743273565")
        .await
        .unwrap();
    assert!(book.is_some());

    let req = stub.single_request();
    assert_eq!(req.query_param("q").as_deref(), Some("isbn:9780743273565"));
    assert_eq!(req.query_param("maxResults"), None);
    assert_eq!(req.query_param("key"), None);
}

#[tokio::test]
async fn title_author_lookup_embeds_inauthor() {
    let stub = http_stub::serve("/volumes", 200, GATSBY_RESPONSE).await;
    let books = client(&stub.url, None);

    books
        .search_by_title_and_author("Emma", Some("Jane Austen"))
        .await
        .unwrap();
    books.search_by_title_and_author("Emma", Some("")).await.unwrap();

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[0].query_param("q").as_deref(),
        Some("Emma+inauthor:Jane Austen")
    );
    assert_eq!(requests[1].query_param("q").as_deref(), Some("Emma"));
}

#[tokio::test]
async fn zero_items_is_not_found() {
    let stub = http_stub::serve("/volumes", 200, r#"{"kind": "books#volumes", "totalItems": 0}"#).await;
    let found = client(&stub.url, None).search("zzzz qqqq").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn sparse_volume_gets_placeholders() {
    let stub = http_stub::serve(
        "/volumes",
        200,
        r#"{"items": [{"id": "abc", "volumeInfo": {"title": "", "authors": []}}]}"#,
    )
    .await;

    let book = client(&stub.url, None).search("x").await.unwrap().unwrap();
    assert_eq!(book.title, "Unknown Title");
    assert_eq!(book.authors, vec!["Unknown Author"]);
    assert_eq!(book.publisher, "Unknown Publisher");
    assert_eq!(book.language, "en");
    assert_eq!(book.average_rating, 0.0);
}

#[tokio::test]
async fn server_error_names_the_operation() {
    let stub = http_stub::serve("/volumes", 500, r#"{"error": {"code": 500}}"#).await;
    let books = client(&stub.url, None);

    let err = books.search("x").await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::FetchFailed {
            operation: Operation::Search
        }
    ));

    let err = books.search_by_isbn("0804429578").await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch book information (isbn)");

    let err = books
        .search_by_title_and_author("Emma", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::FetchFailed {
            operation: Operation::TitleAuthor
        }
    ));
}

#[tokio::test]
async fn malformed_body_is_fetch_failure() {
    let stub = http_stub::serve("/volumes", 200, "<html>not json</html>").await;
    let err = client(&stub.url, None).search("x").await.unwrap_err();
    assert!(matches!(err, ResolveError::FetchFailed { .. }));
}

#[tokio::test]
async fn unreachable_host_is_fetch_failure() {
    // Bind then drop to get a port with nothing listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}/volumes", addr), None)
        .search_by_isbn("0804429578")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::FetchFailed {
            operation: Operation::Isbn
        }
    ));
}

fn load_env() {
    let manifest_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"));
    let env_path = manifest_dir.join(".env.local");
    if env_path.exists() {
        dotenvy::from_path(&env_path).expect("Failed to load .env.local");
        eprintln!("[TEST] Loaded .env.local");
    }
}

#[tokio::test]
async fn live_isbn_lookup() {
    load_env();
    if std::env::var("BOOKS_LIVE_TEST").is_err() {
        eprintln!("SKIP: BOOKS_LIVE_TEST not set");
        return;
    }

    let key = std::env::var("GOOGLE_BOOKS_API_KEY").ok();
    let books = BooksClient::new(
        reqwest::Client::new(),
        book_scanner_lib::books::DEFAULT_BOOKS_API_URL,
        key,
    );

    let start = std::time::Instant::now();
    let book = books
        .search_by_isbn("9780743273565")
        .await
        .expect("live lookup failed")
        .expect("no volume for a well-known ISBN");
    eprintln!("[TEST] '{}' in {}ms", book.title, start.elapsed().as_millis());

    assert!(book.title.to_lowercase().contains("gatsby"));
}
