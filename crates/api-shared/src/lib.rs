//! # API Shared
//!
//! Shared definitions for the wallpaper catalog APIs.
//!
//! Contains:
//! - JSON request/response types with their OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` for its handlers and OpenAPI document.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
