//! # API REST
//!
//! REST API implementation for the wallpaper catalog.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (multipart decoding, JSON errors, CORS, static files,
//!   rate limiting and protective response headers)
//!
//! Uses `api-shared` for wire types and `wallpaper-core` for every catalog
//! operation.

#![warn(rust_2018_idioms)]

mod config;
mod error;
mod routes;
mod security;
mod upload;

pub use config::ServerConfig;
pub use error::ApiError;
pub use routes::{router, ApiDoc, AppState};
pub use security::RateLimiter;
