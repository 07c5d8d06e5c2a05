//! Wallpaper File Storage
//!
//! This crate owns the binary side of the wallpaper catalog: it writes uploaded
//! images under a single storage root and removes them again when their catalog
//! entry is deleted or could not be persisted.
//!
//! ## Design Principles
//!
//! - Stored names are generated, never taken from the client. Only the
//!   extension of the original name survives, after it has been checked
//!   against the allow-list.
//! - Size and type are validated before a single byte is written.
//! - Deleting is idempotent and never fails the caller. A missing file must not
//!   block removal of its metadata.
//! - No other component touches the storage root.
//!
//! ## Storage Layout
//!
//! ```text
//! public/
//! └── uploads/
//!     ├── image-1718000000000-482913377.png
//!     └── image-1718000004211-17311.jpg
//! ```
//!
//! Each file is served at `/uploads/<file_name>`.
//!
//! ## Example Usage
//!
//! ```no_run
//! use wallpaper_files::AssetStore;
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = AssetStore::open(Path::new("public/uploads"))?;
//! let stored = store.store(b"\x89PNG...", "image/png", "beach.png").await?;
//! println!("served at {}", stored.image_url);
//! store.delete(&stored.file_name).await;
//! # Ok(())
//! # }
//! ```

mod constants;
mod format;
mod store;

pub use constants::{MAX_FILE_SIZE_BYTES, UPLOADS_FOLDER_NAME, UPLOADS_URL_PREFIX};
pub use format::{check, CheckedImage, ImageFormat};
pub use store::{AssetStore, StoredAsset, StoredFile};

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Storage root could not be created or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Content exceeds the configured maximum size
    #[error("File of {size} bytes exceeds the maximum of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    /// Content is zero bytes long
    #[error("File is empty")]
    Empty,

    /// Extension or declared media type is outside the image allow-list
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Extension and declared media type are both allowed but disagree
    #[error("File extension '{extension}' does not match media type '{mime_type}'")]
    TypeMismatch { extension: String, mime_type: String },

    /// A file reference is not a plain file name (potential directory traversal)
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    /// No free file name could be allocated
    #[error("Could not allocate a unique file name after {0} attempts")]
    NameExhausted(usize),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FilesError {
    /// Returns true when the error rejects the upload itself (size or type),
    /// as opposed to a failure of the storage backend.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            FilesError::TooLarge { .. }
                | FilesError::Empty
                | FilesError::UnsupportedType(_)
                | FilesError::TypeMismatch { .. }
        )
    }
}
