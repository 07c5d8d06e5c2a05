//! Wire types for the wallpaper catalog API.
//!
//! Field names are snake_case on the wire (`image_url`, `created_at`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use wallpaper_core::Wallpaper;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every error response, and of successful deletes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A catalog entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WallpaperRes {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Mountain Lake")]
    pub name: String,
    #[schema(example = json!(["nature", "water"]))]
    pub tags: Vec<String>,
    #[schema(example = "/uploads/image-1718000000000-482913377.png")]
    pub image_url: String,
    pub file_name: String,
    /// Size of the stored image in bytes.
    pub file_size: u64,
    #[schema(example = "image/png")]
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallpaper> for WallpaperRes {
    fn from(w: Wallpaper) -> Self {
        Self {
            id: w.id,
            name: w.name,
            tags: w.tags,
            image_url: w.image_url,
            file_name: w.file_name,
            file_size: w.file_size,
            mime_type: w.mime_type,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Matched against names (substring) and tags (exact), ignoring case.
    pub q: Option<String>,
}

/// Multipart form accepted by the upload endpoint.
///
/// Only used for the OpenAPI document; the handler reads the form field by
/// field.
#[derive(Debug, ToSchema)]
pub struct UploadForm {
    pub name: String,
    /// Comma-separated tags.
    #[schema(example = "nature, water")]
    pub tags: String,
    /// JPEG, PNG, GIF or WebP image, at most 10 MiB.
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}
