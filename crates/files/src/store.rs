//! Filesystem-backed image storage.
//!
//! [`AssetStore`] is bound to one storage root. Every stored file gets a fresh
//! name of the form `image-<unix-millis>-<random>.<ext>`, so client-supplied
//! names never reach the filesystem and two uploads of the same name never
//! collide.
//!
//! # Security Model
//!
//! - The storage root is canonicalised once, at construction time
//! - File references handed to [`AssetStore::delete`] must be plain file names;
//!   anything containing a separator or `..` is refused
//! - New files are opened with `create_new`, so an existing file is never
//!   overwritten

use crate::constants::{FILE_NAME_PREFIX, MAX_NAME_ATTEMPTS, RANDOM_SUFFIX_BOUND};
use crate::{check, FilesError, UPLOADS_URL_PREFIX};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Record of a file written by [`AssetStore::store`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredAsset {
    /// Generated name of the file within the storage root
    pub file_name: String,

    /// Public URL the file is served at (`/uploads/<file_name>`)
    pub image_url: String,

    /// Size of the file in bytes
    pub size_bytes: u64,

    /// Canonical media type of the stored image
    pub mime_type: String,
}

/// A file found in the storage root by [`AssetStore::list_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub modified_at: DateTime<Utc>,
}

/// Service owning the image storage root.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root_directory: PathBuf,
}

impl AssetStore {
    /// Opens the store at `root_directory`, creating the directory if missing.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidRootDirectory`] if the directory cannot be
    /// created, is not a directory, or cannot be canonicalised.
    pub fn open(root_directory: &Path) -> Result<Self, FilesError> {
        std::fs::create_dir_all(root_directory).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create directory {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Returns the canonicalised storage root.
    #[must_use]
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Writes `bytes` under a freshly generated name.
    ///
    /// Size and type are validated with [`check`] first; nothing is written if
    /// validation fails. A partially written file is removed before the write
    /// error is returned.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - the content is empty, too large or not an allowed image type
    /// - no unused name could be allocated ([`FilesError::NameExhausted`])
    /// - creating or writing the file fails ([`FilesError::Io`])
    pub async fn store(
        &self,
        bytes: &[u8],
        declared_mime_type: &str,
        original_file_name: &str,
    ) -> Result<StoredAsset, FilesError> {
        let checked = check(bytes.len() as u64, declared_mime_type, original_file_name)?;

        let (file_name, path, mut file) = self.create_unique(&checked.extension).await?;

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;

        if let Err(write_error) = written {
            drop(file);
            if let Err(cleanup_error) = tokio::fs::remove_file(&path).await {
                tracing::warn!(
                    file_name = %file_name,
                    error = %cleanup_error,
                    "failed to remove partially written file"
                );
            }
            return Err(FilesError::Io(write_error));
        }

        tracing::debug!(file_name = %file_name, size = bytes.len(), "stored image");

        Ok(StoredAsset {
            image_url: image_url_for(&file_name),
            file_name,
            size_bytes: bytes.len() as u64,
            mime_type: checked.format.mime_type().to_string(),
        })
    }

    /// Removes a stored file, returning whether this call removed it.
    ///
    /// Missing files are not an error. Any failure, including a reference that
    /// is not a plain file name, is logged and swallowed so that callers can
    /// always finish removing the matching metadata.
    pub async fn delete(&self, file_name: &str) -> bool {
        let path = match self.path_of(file_name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(file_name = %file_name, error = %e, "refusing to delete file");
                return false;
            }
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(file_name = %file_name, "deleted image");
                true
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(file_name = %file_name, "image already absent");
                false
            }
            Err(e) => {
                tracing::warn!(file_name = %file_name, error = %e, "failed to delete image");
                false
            }
        }
    }

    /// Lists regular files in the storage root.
    ///
    /// Hidden files and names that are not valid UTF-8 are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::Io`] if the directory cannot be read.
    pub async fn list_files(&self) -> Result<Vec<StoredFile>, FilesError> {
        let mut entries = tokio::fs::read_dir(&self.root_directory).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if file_name.starts_with('.') {
                continue;
            }

            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let modified_at = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());

            files.push(StoredFile {
                file_name,
                modified_at,
            });
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(files)
    }

    /// Resolves a stored file name to its absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidFileName`] unless `file_name` is a single,
    /// normal path component.
    pub fn path_of(&self, file_name: &str) -> Result<PathBuf, FilesError> {
        if !is_plain_file_name(file_name) {
            return Err(FilesError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.root_directory.join(file_name))
    }

    /// Creates a new empty file with a generated name, retrying on collision.
    async fn create_unique(
        &self,
        extension: &str,
    ) -> Result<(String, PathBuf, tokio::fs::File), FilesError> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = generate_file_name(extension);
            let path = self.root_directory.join(&file_name);

            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((file_name, path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(FilesError::Io(e)),
            }
        }

        Err(FilesError::NameExhausted(MAX_NAME_ATTEMPTS))
    }
}

/// Public URL for a stored file name.
pub(crate) fn image_url_for(file_name: &str) -> String {
    format!("{UPLOADS_URL_PREFIX}/{file_name}")
}

fn generate_file_name(extension: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = rand::thread_rng().gen_range(0..RANDOM_SUFFIX_BOUND);
    format!("{FILE_NAME_PREFIX}-{millis}-{suffix}.{extension}")
}

fn is_plain_file_name(file_name: &str) -> bool {
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return false;
    }
    if file_name.contains(['/', '\\', '\0']) {
        return false;
    }
    Path::new(file_name).file_name().and_then(|n| n.to_str()) == Some(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_FILE_SIZE_BYTES;
    use tempfile::TempDir;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn open_store(temp: &TempDir) -> AssetStore {
        AssetStore::open(&temp.path().join("uploads")).expect("store should open")
    }

    fn count_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_open_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("public").join("uploads");

        let store = AssetStore::open(&root).unwrap();

        assert!(root.is_dir());
        assert!(store.root_directory().ends_with("uploads"));
    }

    #[test]
    fn test_open_rejects_file_as_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("file.txt");
        std::fs::write(&root, "not a directory").unwrap();

        let store = AssetStore::open(&root);

        assert!(matches!(store, Err(FilesError::InvalidRootDirectory(_))));
    }

    #[tokio::test]
    async fn test_store_writes_content_under_generated_name() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let stored = store
            .store(PNG_HEADER, "image/png", "My Beach.PNG")
            .await
            .unwrap();

        assert!(stored.file_name.starts_with("image-"));
        assert!(stored.file_name.ends_with(".png"));
        assert!(!stored.file_name.contains("Beach"));
        assert_eq!(stored.image_url, format!("/uploads/{}", stored.file_name));
        assert_eq!(stored.size_bytes, PNG_HEADER.len() as u64);
        assert_eq!(stored.mime_type, "image/png");

        let on_disk = std::fs::read(store.path_of(&stored.file_name).unwrap()).unwrap();
        assert_eq!(on_disk, PNG_HEADER);
    }

    #[tokio::test]
    async fn test_store_same_name_twice_yields_distinct_files() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let first = store.store(PNG_HEADER, "image/png", "a.png").await.unwrap();
        let second = store.store(PNG_HEADER, "image/png", "a.png").await.unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert_eq!(count_files(store.root_directory()), 2);
    }

    #[tokio::test]
    async fn test_store_ignores_path_components_in_original_name() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let stored = store
            .store(PNG_HEADER, "image/png", "../../etc/passwd.png")
            .await
            .unwrap();

        assert!(store.path_of(&stored.file_name).unwrap().exists());
        assert!(!temp.path().join("etc").exists());
    }

    #[tokio::test]
    async fn test_store_rejections_leave_no_file() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let oversized = vec![0u8; (MAX_FILE_SIZE_BYTES + 1) as usize];

        assert!(matches!(
            store.store(&oversized, "image/png", "big.png").await,
            Err(FilesError::TooLarge { .. })
        ));
        assert!(matches!(
            store.store(b"text", "text/plain", "notes.txt").await,
            Err(FilesError::UnsupportedType(_))
        ));
        assert!(matches!(
            store.store(PNG_HEADER, "image/gif", "a.png").await,
            Err(FilesError::TypeMismatch { .. })
        ));
        assert!(matches!(
            store.store(&[], "image/png", "a.png").await,
            Err(FilesError::Empty)
        ));

        assert_eq!(count_files(store.root_directory()), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let stored = store.store(PNG_HEADER, "image/png", "a.png").await.unwrap();

        assert!(store.delete(&stored.file_name).await);
        assert_eq!(count_files(store.root_directory()), 0);

        // Second delete finds nothing and must not panic or error.
        assert!(!store.delete(&stored.file_name).await);
    }

    #[tokio::test]
    async fn test_delete_reports_failure_as_not_removed() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let subdir = store.root_directory().join("not-a-file");
        std::fs::create_dir(&subdir).unwrap();

        assert!(!store.delete("not-a-file").await);
        assert!(subdir.is_dir());
    }

    #[tokio::test]
    async fn test_delete_refuses_traversal() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let outside = temp.path().join("keep.png");
        std::fs::write(&outside, PNG_HEADER).unwrap();

        assert!(!store.delete("../keep.png").await);

        assert!(outside.exists());
    }

    #[test]
    fn test_path_of_validation() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        assert!(store.path_of("image-1-2.png").is_ok());
        for bad in ["", ".", "..", "a/b.png", "..\\b.png", "/etc/passwd"] {
            assert!(
                matches!(store.path_of(bad), Err(FilesError::InvalidFileName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_list_files_skips_hidden_and_directories() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);
        let stored = store.store(PNG_HEADER, "image/png", "a.png").await.unwrap();
        std::fs::write(store.root_directory().join(".gitkeep"), "").unwrap();
        std::fs::create_dir(store.root_directory().join("nested")).unwrap();

        let files = store.list_files().await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, stored.file_name);
    }
}
