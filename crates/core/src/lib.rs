//! # Wallpaper Core
//!
//! Core business logic for the wallpaper catalog.
//!
//! This crate contains the catalog's data operations:
//! - Validation of upload and search input
//! - Wallpaper metadata persistence in SQLite
//! - Coordination of the metadata store with the image files held by
//!   `wallpaper_files`
//!
//! **No API concerns**: HTTP servers, multipart decoding and CLI parsing belong in
//! `api-rest`, `api-shared` or `cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod repository;
pub mod search;
pub mod service;
pub mod snapshot;
pub mod sqlite;
pub mod upload;
pub mod validation;
pub mod wallpaper;

pub use config::CoreConfig;
pub use error::{CatalogError, CatalogResult};
pub use repository::CatalogRepository;
pub use search::matches_query;
pub use service::CatalogService;
pub use snapshot::CatalogSnapshot;
pub use sqlite::SqliteCatalogRepository;
pub use upload::{ImageUpload, UploadRequest};
pub use wallpaper::{NewWallpaper, Wallpaper};

pub use wallpaper_files::{FilesError, ImageFormat, MAX_FILE_SIZE_BYTES};
pub use wallpaper_types::NonEmptyText;
