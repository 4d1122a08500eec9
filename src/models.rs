//! Data model for collected videos.
//!
//! A [`VideoRecord`] is one row of the exported table. Serde renames keep the
//! CSV header exactly `URL,Thumbnail,Views,Likes,Comments,Description`.

use serde::{Deserialize, Serialize};

/// Count written when a page shows no like/comment figure.
pub const DEFAULT_COUNT: &str = "0";

/// Metadata for one video on the account page.
///
/// Every field is filled opportunistically. A value that could not be found
/// is an empty string (or [`DEFAULT_COUNT`] for likes and comments), never an
/// error.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VideoRecord {
    /// Absolute URL of the video page.
    #[serde(rename = "URL")]
    pub url: String,
    /// Best thumbnail image URL, or empty.
    #[serde(rename = "Thumbnail")]
    pub thumbnail: String,
    /// View count as displayed on the account grid (e.g. `"1.2M"`).
    #[serde(rename = "Views")]
    pub views: String,
    #[serde(rename = "Likes")]
    pub likes: String,
    #[serde(rename = "Comments")]
    pub comments: String,
    /// Quoted part of the caption when present, otherwise the caption.
    #[serde(rename = "Description")]
    pub description: String,
}

impl VideoRecord {
    /// A record for `url` with every other field at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            thumbnail: String::new(),
            views: String::new(),
            likes: DEFAULT_COUNT.to_string(),
            comments: DEFAULT_COUNT.to_string(),
            description: String::new(),
        }
    }

    /// Column names, in export order.
    pub const HEADERS: [&'static str; 6] =
        ["URL", "Thumbnail", "Views", "Likes", "Comments", "Description"];

    /// Field values, in export order.
    pub fn cells(&self) -> [&str; 6] {
        [
            self.url.as_str(),
            self.thumbnail.as_str(),
            self.views.as_str(),
            self.likes.as_str(),
            self.comments.as_str(),
            self.description.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = VideoRecord::new("https://www.tiktok.com/@a/video/1");
        assert_eq!(record.url, "https://www.tiktok.com/@a/video/1");
        assert_eq!(record.likes, "0");
        assert_eq!(record.comments, "0");
        assert!(record.thumbnail.is_empty());
        assert!(record.views.is_empty());
        assert!(record.description.is_empty());
    }

    #[test]
    fn test_serialization_uses_column_names() {
        let record = VideoRecord::new("u");
        let json = serde_json::to_string(&record).unwrap();
        for header in VideoRecord::HEADERS {
            assert!(json.contains(&format!("\"{header}\"")), "missing {header}");
        }
    }

    #[test]
    fn test_cells_follow_header_order() {
        let mut record = VideoRecord::new("u");
        record.views = "12K".into();
        record.description = "d".into();
        assert_eq!(record.cells(), ["u", "", "12K", "0", "0", "d"]);
    }
}
