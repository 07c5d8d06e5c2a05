use wallpaper_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Missing or malformed input; the message is safe to show to clients.
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("wallpaper {0} not found")]
    NotFound(i64),
    /// The image was refused on size or type.
    #[error("upload rejected: {0}")]
    UploadLimit(#[source] FilesError),
    #[error("file storage failed: {0}")]
    Storage(#[source] FilesError),
    #[error("database operation failed: {0}")]
    Persistence(#[from] rusqlite::Error),
    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<FilesError> for CatalogError {
    fn from(err: FilesError) -> Self {
        if err.is_rejection() {
            CatalogError::UploadLimit(err)
        } else {
            CatalogError::Storage(err)
        }
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
