//! Decoding of the upload form into a typed [`UploadRequest`].
//!
//! Recognised fields are `name`, `tags` and `image`; anything else is skipped.
//! The image is streamed chunk by chunk and reading stops as soon as it grows
//! past [`MAX_FILE_SIZE_BYTES`].

use crate::error::{ApiError, FILE_TOO_LARGE};
use axum::extract::multipart::Field;
use axum::extract::Multipart;
use wallpaper_core::{ImageUpload, UploadRequest, MAX_FILE_SIZE_BYTES};

const NAME_FIELD: &str = "name";
const TAGS_FIELD: &str = "tags";
const IMAGE_FIELD: &str = "image";

/// Read a multipart upload form.
///
/// An `image` part with no file name and no content (an empty file input)
/// counts as no image at all. Only the first `image` part is kept.
///
/// # Errors
///
/// Returns an [`ApiError`] if the body is malformed or the image exceeds the
/// size limit.
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some(NAME_FIELD) => {
                request.name = Some(field.text().await.map_err(ApiError::multipart)?);
            }
            Some(TAGS_FIELD) => {
                request.tags = Some(field.text().await.map_err(ApiError::multipart)?);
            }
            Some(IMAGE_FIELD) if request.image.is_none() => {
                request.image = read_image(field).await?;
            }
            _ => {}
        }
    }

    Ok(request)
}

async fn read_image(mut field: Field<'_>) -> Result<Option<ImageUpload>, ApiError> {
    let original_file_name = field.file_name().unwrap_or_default().to_string();
    let mime_type = field.content_type().unwrap_or_default().to_string();

    let mut bytes = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(ApiError::multipart)? {
        if (bytes.len() + chunk.len()) as u64 > MAX_FILE_SIZE_BYTES {
            return Err(ApiError::bad_request(FILE_TOO_LARGE));
        }
        bytes.extend_from_slice(&chunk);
    }

    if original_file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(ImageUpload {
        original_file_name,
        mime_type,
        bytes,
    }))
}
