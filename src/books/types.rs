//! Book record types: the normalized `BookRecord` and the Google Books
//! volume shapes it is built from.
//!
//! The source types mirror the volumes API response. Every field the API may
//! omit is optional here and gets its default in `BookRecord::from_volume`,
//! so nothing downstream ever sees a partial record.

use serde::{Deserialize, Serialize};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_PUBLISHER: &str = "Unknown Publisher";
pub const NO_DESCRIPTION: &str = "No description available";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Upper bound of the Google Books rating scale.
const MAX_RATING: f64 = 5.0;

/// Normalized book metadata, as displayed and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    pub authors: Vec<String>,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub ratings_count: u32,
    #[serde(default)]
    pub image_links: ImageLinks,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub preview_link: String,
    #[serde(default)]
    pub info_link: String,
}

/// Cover image URLs. Either may be missing independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small_thumbnail: Option<String>,
}

/// Top-level volumes search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeSearchResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

/// One search hit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub id: String,
    #[serde(default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    pub image_links: Option<VolumeImageLinks>,
    pub language: Option<String>,
    pub preview_link: Option<String>,
    pub info_link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeImageLinks {
    pub thumbnail: Option<String>,
    pub small_thumbnail: Option<String>,
}

impl VolumeSearchResponse {
    /// First hit wins. No ranking, no scoring.
    pub fn into_first_record(self) -> Option<BookRecord> {
        self.items.into_iter().next().map(BookRecord::from_volume)
    }
}

impl BookRecord {
    /// Normalize a source volume. Empty strings count as missing.
    pub fn from_volume(volume: Volume) -> Self {
        let info = volume.volume_info;
        let links = info.image_links.unwrap_or_default();

        Self {
            id: volume.id,
            title: or_default(info.title, UNKNOWN_TITLE),
            subtitle: or_default(info.subtitle, ""),
            authors: match info.authors {
                Some(authors) if !authors.is_empty() => authors,
                _ => vec![UNKNOWN_AUTHOR.to_string()],
            },
            publisher: or_default(info.publisher, UNKNOWN_PUBLISHER),
            published_date: or_default(info.published_date, ""),
            description: or_default(info.description, NO_DESCRIPTION),
            page_count: info.page_count.unwrap_or(0),
            categories: info.categories.unwrap_or_default(),
            average_rating: info
                .average_rating
                .filter(|r| r.is_finite())
                .map(|r| r.clamp(0.0, MAX_RATING))
                .unwrap_or(0.0),
            ratings_count: info.ratings_count.unwrap_or(0),
            image_links: ImageLinks {
                thumbnail: links.thumbnail.filter(|s| !s.is_empty()),
                small_thumbnail: links.small_thumbnail.filter(|s| !s.is_empty()),
            },
            language: or_default(info.language, DEFAULT_LANGUAGE),
            preview_link: or_default(info.preview_link, ""),
            info_link: or_default(info.info_link, ""),
        }
    }

    /// Authors joined for display ("A, B").
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}
