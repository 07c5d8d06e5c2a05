//! Wallpaper catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wallpaper_types::NonEmptyText;

/// A stored catalog entry.
///
/// Field names follow the JSON contract served to clients (`image_url`,
/// `file_name`, ...), so this type serialises as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallpaper {
    pub id: i64,
    pub name: String,
    /// Insertion-ordered, never empty.
    pub tags: Vec<String>,
    /// Public URL of the stored image, unique per record.
    pub image_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    /// Equal to `created_at`; there is no update path.
    pub updated_at: DateTime<Utc>,
}

/// A validated record ready to be inserted.
///
/// The repository assigns `id` and the timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallpaper {
    pub name: NonEmptyText,
    pub tags: Vec<NonEmptyText>,
    pub image_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
}

impl NewWallpaper {
    pub(crate) fn tag_strings(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.as_str().to_string()).collect()
    }
}
