//! Catalog repository port.

use crate::wallpaper::{NewWallpaper, Wallpaper};
use crate::CatalogResult;
use async_trait::async_trait;

/// Relational persistence for wallpaper metadata.
///
/// No SQL types appear in signatures. Listing and search results are ordered
/// newest first (`created_at` descending, then `id` descending) and are
/// recomputed on every call.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Ensure the backing table exists. Safe to call on every startup.
    async fn initialise(&self) -> CatalogResult<()>;

    /// Persist a new row, assigning `id`, `created_at` and `updated_at`.
    async fn insert(&self, wallpaper: NewWallpaper) -> CatalogResult<Wallpaper>;

    async fn list_all(&self) -> CatalogResult<Vec<Wallpaper>>;

    /// Rows whose name contains `query` or that carry `query` as a tag,
    /// both compared case-insensitively. See [`crate::search`].
    async fn search(&self, query: &str) -> CatalogResult<Vec<Wallpaper>>;

    async fn find_by_id(&self, id: i64) -> CatalogResult<Option<Wallpaper>>;

    /// Remove a row, returning whether it existed.
    async fn delete_by_id(&self, id: i64) -> CatalogResult<bool>;

    /// Stored file names referenced by any row.
    async fn file_names(&self) -> CatalogResult<Vec<String>>;
}
