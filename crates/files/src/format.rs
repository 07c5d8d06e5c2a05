//! Image type allow-list.
//!
//! An upload is accepted only when its file extension and its declared media
//! type are both on the allow-list and name the same format.

use crate::{FilesError, MAX_FILE_SIZE_BYTES};
use std::path::Path;

/// Image formats the catalog accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    /// Resolves a file extension (without the dot, any case).
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Resolves a declared media type.
    ///
    /// Parameters (`; charset=...`) and case are ignored. `image/jpg` is
    /// accepted as a common non-standard spelling of `image/jpeg`.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Canonical media type recorded for stored files.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }
}

/// Result of a successful [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedImage {
    pub format: ImageFormat,
    /// Lower-cased extension of the original file name, used for the stored name.
    pub extension: String,
}

/// Validates an upload's size and type without touching the filesystem.
///
/// # Errors
///
/// Returns `FilesError` if:
/// - `len` is zero ([`FilesError::Empty`])
/// - `len` exceeds [`MAX_FILE_SIZE_BYTES`] ([`FilesError::TooLarge`])
/// - the extension or media type is not an allowed image type ([`FilesError::UnsupportedType`])
/// - extension and media type name different formats ([`FilesError::TypeMismatch`])
pub fn check(
    len: u64,
    declared_mime_type: &str,
    original_file_name: &str,
) -> Result<CheckedImage, FilesError> {
    if len == 0 {
        return Err(FilesError::Empty);
    }
    if len > MAX_FILE_SIZE_BYTES {
        return Err(FilesError::TooLarge {
            size: len,
            max: MAX_FILE_SIZE_BYTES,
        });
    }

    let extension = Path::new(original_file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            FilesError::UnsupportedType(format!("no file extension in '{original_file_name}'"))
        })?;

    let by_extension = ImageFormat::from_extension(&extension)
        .ok_or_else(|| FilesError::UnsupportedType(format!("extension '{extension}'")))?;

    let by_mime = ImageFormat::from_mime_type(declared_mime_type)
        .ok_or_else(|| FilesError::UnsupportedType(format!("media type '{declared_mime_type}'")))?;

    if by_extension != by_mime {
        return Err(FilesError::TypeMismatch {
            extension,
            mime_type: declared_mime_type.to_string(),
        });
    }

    Ok(CheckedImage {
        format: by_extension,
        extension,
    })
}
