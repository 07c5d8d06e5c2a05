//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core
//! services, so request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_DATABASE_PATH, DEFAULT_PUBLIC_DIR};
use crate::{CatalogError, CatalogResult};
use std::path::{Path, PathBuf};
use wallpaper_files::UPLOADS_FOLDER_NAME;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: PathBuf,
    public_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(database_path: PathBuf, public_dir: PathBuf) -> CatalogResult<Self> {
        if database_path.as_os_str().is_empty() {
            return Err(CatalogError::Validation(
                "database path cannot be empty".into(),
            ));
        }
        if public_dir.as_os_str().is_empty() {
            return Err(CatalogError::Validation(
                "public directory cannot be empty".into(),
            ));
        }

        Ok(Self {
            database_path,
            public_dir,
        })
    }

    /// Build a config from optional raw values, typically environment variables.
    ///
    /// Missing or whitespace-only values fall back to the defaults.
    pub fn from_env_values(
        database_path: Option<String>,
        public_dir: Option<String>,
    ) -> CatalogResult<Self> {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let database_path =
            non_blank(database_path).unwrap_or_else(|| DEFAULT_DATABASE_PATH.into());
        let public_dir = non_blank(public_dir).unwrap_or_else(|| DEFAULT_PUBLIC_DIR.into());

        Self::new(PathBuf::from(database_path), PathBuf::from(public_dir))
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Directory holding stored images.
    pub fn uploads_dir(&self) -> PathBuf {
        self.public_dir.join(UPLOADS_FOLDER_NAME)
    }
}
