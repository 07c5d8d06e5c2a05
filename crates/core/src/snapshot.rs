//! Point-in-time catalog listings.
//!
//! A browsing client loads the full listing once and filters it locally as the
//! user types. [`CatalogSnapshot`] is that listing: immutable, cheap to clone,
//! and filtered with the same rules the repository uses for server-side search.

use crate::search::{fold_case, matches_folded};
use crate::wallpaper::Wallpaper;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    wallpapers: Arc<[Wallpaper]>,
    taken_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    /// Wraps a listing that is already ordered newest first.
    pub fn new(wallpapers: Vec<Wallpaper>) -> Self {
        Self {
            wallpapers: wallpapers.into(),
            taken_at: Utc::now(),
        }
    }

    pub fn all(&self) -> &[Wallpaper] {
        &self.wallpapers
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.wallpapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallpapers.is_empty()
    }

    /// Wallpapers matching `query`, in listing order.
    ///
    /// A blank query returns the whole listing rather than an error, so a
    /// cleared search box shows everything again. Any other query is matched
    /// as given, like a server-side search.
    pub fn filter(&self, query: &str) -> Vec<&Wallpaper> {
        if query.trim().is_empty() {
            return self.wallpapers.iter().collect();
        }

        let folded = fold_case(query);
        self.wallpapers
            .iter()
            .filter(|w| matches_folded(w, &folded))
            .collect()
    }
}
