//! Catalog service.
//!
//! Orchestrates the asset store and the catalog repository. There is no
//! transaction spanning the filesystem and the database, so uploads follow a
//! store-then-insert sequence and delete the stored file again if the insert
//! fails.

use crate::config::CoreConfig;
use crate::repository::CatalogRepository;
use crate::snapshot::CatalogSnapshot;
use crate::sqlite::SqliteCatalogRepository;
use crate::upload::UploadRequest;
use crate::validation::validate_search_query;
use crate::wallpaper::Wallpaper;
use crate::{CatalogError, CatalogResult};
use chrono::{Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use wallpaper_files::AssetStore;

/// Wallpaper catalog operations - no transport concerns.
///
/// Stateless between calls; every operation re-reads the repository.
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn CatalogRepository>,
    assets: AssetStore,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn CatalogRepository>, assets: AssetStore) -> Self {
        Self { repository, assets }
    }

    /// Opens the SQLite catalog and asset store described by `cfg` and
    /// initialises the schema.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if the database cannot be opened or
    /// initialised, or the uploads directory cannot be created.
    pub async fn open(cfg: &CoreConfig) -> CatalogResult<Self> {
        let repository = SqliteCatalogRepository::open(cfg.database_path())?;
        let assets = AssetStore::open(&cfg.uploads_dir())?;

        let service = Self::new(Arc::new(repository), assets);
        service.repository.initialise().await?;
        Ok(service)
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// All wallpapers, newest first.
    pub async fn list(&self) -> CatalogResult<Vec<Wallpaper>> {
        self.repository.list_all().await
    }

    /// Wallpapers whose name contains `query` or that carry it as a tag.
    ///
    /// The query is matched exactly as given, surrounding whitespace included.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] if the query is blank.
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<Wallpaper>> {
        validate_search_query(Some(query))?;
        self.repository.search(query).await
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no wallpaper has this id.
    pub async fn get(&self, id: i64) -> CatalogResult<Wallpaper> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(id))
    }

    /// Immutable snapshot of the current listing, for client-side filtering.
    pub async fn snapshot(&self) -> CatalogResult<CatalogSnapshot> {
        Ok(CatalogSnapshot::new(self.list().await?))
    }

    /// Validate, store and persist a new wallpaper.
    ///
    /// Validation completes before anything is written. If persisting the row
    /// fails after the file was stored, the file is deleted again and the
    /// persistence error is returned. That cleanup is best-effort: a failure is
    /// logged by the asset store and never replaces the original error.
    ///
    /// # Errors
    ///
    /// Returns a `CatalogError` if:
    /// - a field is missing or malformed ([`CatalogError::Validation`])
    /// - the image is refused on size or type ([`CatalogError::UploadLimit`])
    /// - writing the file fails ([`CatalogError::Storage`])
    /// - inserting the row fails ([`CatalogError::Persistence`])
    pub async fn upload(&self, request: UploadRequest) -> CatalogResult<Wallpaper> {
        let validated = request.validate()?;

        let stored = self
            .assets
            .store(
                &validated.image.bytes,
                &validated.image.mime_type,
                &validated.image.original_file_name,
            )
            .await?;

        let new_wallpaper = validated.into_new_wallpaper(&stored);
        match self.repository.insert(new_wallpaper).await {
            Ok(wallpaper) => {
                tracing::info!(
                    id = wallpaper.id,
                    file_name = %wallpaper.file_name,
                    "wallpaper uploaded"
                );
                Ok(wallpaper)
            }
            Err(insert_error) => {
                tracing::error!(
                    file_name = %stored.file_name,
                    error = %insert_error,
                    "insert failed after storing image; removing stored file"
                );
                self.assets.delete(&stored.file_name).await;
                Err(insert_error)
            }
        }
    }

    /// Delete a wallpaper row and then its stored file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if the row does not exist, in which
    /// case no file is touched. A concurrent delete that removed the row first
    /// is also reported as not found.
    pub async fn delete(&self, id: i64) -> CatalogResult<()> {
        let wallpaper = self.get(id).await?;

        if !self.repository.delete_by_id(id).await? {
            return Err(CatalogError::NotFound(id));
        }

        self.assets.delete(&wallpaper.file_name).await;
        tracing::info!(id, file_name = %wallpaper.file_name, "wallpaper deleted");
        Ok(())
    }

    /// Remove stored files that no row references.
    ///
    /// Only files last modified at least `min_age` ago are considered, so an
    /// upload between its store and insert steps is left alone. Returns the
    /// names of the files this sweep actually removed; files that could not be
    /// deleted are logged by the asset store and left out.
    pub async fn sweep_orphans(&self, min_age: Duration) -> CatalogResult<Vec<String>> {
        let referenced: HashSet<String> =
            self.repository.file_names().await?.into_iter().collect();
        let cutoff = Utc::now() - min_age;

        let mut removed = Vec::new();
        for file in self.assets.list_files().await? {
            if referenced.contains(&file.file_name) || file.modified_at > cutoff {
                continue;
            }
            if self.assets.delete(&file.file_name).await {
                removed.push(file.file_name);
            }
        }

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "removed orphaned images");
        }
        Ok(removed)
    }
}
