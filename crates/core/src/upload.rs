//! Typed upload requests.
//!
//! Transport layers decode their wire format (multipart, CLI arguments) into an
//! [`UploadRequest`] whose fields are all optional, then call
//! [`UploadRequest::validate`]. Presence and shape checks live here, in one
//! place, instead of in each transport.

use crate::validation::{normalise_tags, validate_name};
use crate::wallpaper::NewWallpaper;
use crate::{CatalogError, CatalogResult};
use wallpaper_files::{check, CheckedImage, StoredAsset};
use wallpaper_types::NonEmptyText;

/// An image file as received from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Name of the file on the client; only its extension is ever used.
    pub original_file_name: String,
    /// Media type declared by the client.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Raw upload input with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadRequest {
    pub name: Option<String>,
    /// Comma-separated tags.
    pub tags: Option<String>,
    pub image: Option<ImageUpload>,
}

/// An upload that passed every check and may be stored.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub name: NonEmptyText,
    pub tags: Vec<NonEmptyText>,
    pub image: ImageUpload,
    pub checked: CheckedImage,
}

impl UploadRequest {
    /// Validate presence and shape of every field.
    ///
    /// Checks run in this order: image present, name and tags present, name
    /// well-formed, at least one tag after normalisation, image size and type.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for missing or malformed fields and
    /// [`CatalogError::UploadLimit`] when the image is empty, too large, or not
    /// an allowed image type.
    pub fn validate(self) -> CatalogResult<ValidatedUpload> {
        let image = self
            .image
            .ok_or_else(|| CatalogError::Validation("No image file provided".into()))?;

        let (Some(name), Some(tags)) = (self.name, self.tags) else {
            return Err(CatalogError::Validation(
                "Name and tags are required".into(),
            ));
        };

        // An empty field counts as absent; whitespace-only tags are present
        // but normalise to nothing.
        if name.is_empty() || tags.is_empty() {
            return Err(CatalogError::Validation(
                "Name and tags are required".into(),
            ));
        }

        let name = validate_name(&name)?;
        let tags = normalise_tags(&tags)?;

        let checked = check(
            image.bytes.len() as u64,
            &image.mime_type,
            &image.original_file_name,
        )?;

        Ok(ValidatedUpload {
            name,
            tags,
            image,
            checked,
        })
    }
}

impl ValidatedUpload {
    /// Combine the validated metadata with the stored file's details.
    pub fn into_new_wallpaper(self, stored: &StoredAsset) -> NewWallpaper {
        NewWallpaper {
            name: self.name,
            tags: self.tags,
            image_url: stored.image_url.clone(),
            file_name: stored.file_name.clone(),
            file_size: stored.size_bytes,
            mime_type: stored.mime_type.clone(),
        }
    }
}
