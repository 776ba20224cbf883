//! ISBN input normalization for `isbn:` lookups.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IsbnError {
    #[error("'{0}' is not an ISBN-10 or ISBN-13")]
    Malformed(String),
    #[error("'{0}' has an invalid check digit")]
    Checksum(String),
}

fn isbn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:\d{9}[\dX]|\d{13})$").expect("static regex"))
}

/// Strip separators, validate the format and check digit, and return the
/// bare ISBN (uppercase `X` for an ISBN-10 check digit of ten).
pub fn normalize_isbn(input: &str) -> Result<String, IsbnError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '\t'))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if !isbn_pattern().is_match(&cleaned) {
        return Err(IsbnError::Malformed(input.to_string()));
    }

    let valid = if cleaned.len() == 10 {
        isbn10_checksum_ok(&cleaned)
    } else {
        isbn13_checksum_ok(&cleaned)
    };
    if !valid {
        return Err(IsbnError::Checksum(input.to_string()));
    }
    Ok(cleaned)
}

fn isbn10_checksum_ok(isbn: &str) -> bool {
    let sum: u32 = isbn
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let digit = if c == 'X' { 10 } else { c.to_digit(10).unwrap_or(0) };
            (10 - i as u32) * digit
        })
        .sum();
    sum % 11 == 0
}

fn isbn13_checksum_ok(isbn: &str) -> bool {
    let sum: u32 = isbn
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let digit = c.to_digit(10).unwrap_or(0);
            if i % 2 == 0 { digit } else { digit * 3 }
        })
        .sum();
    sum % 10 == 0
}
