//! Search semantics shared by the SQLite repository and client-side snapshots.
//!
//! A wallpaper matches a query when either
//! - its name contains the query as a case-insensitive literal substring, or
//! - one of its tags equals the query, case-insensitively.
//!
//! The two predicates are independent: a tag hit does not need a name match.

use crate::wallpaper::Wallpaper;

/// Case folding used on both sides of every comparison.
///
/// Registered with SQLite under the same name so the database and Rust agree
/// on non-ASCII input.
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Returns true if `wallpaper` matches an already folded query.
pub(crate) fn matches_folded(wallpaper: &Wallpaper, folded_query: &str) -> bool {
    fold_case(&wallpaper.name).contains(folded_query)
        || wallpaper.tags.iter().any(|tag| fold_case(tag) == folded_query)
}

/// Returns true if `wallpaper` matches `query`.
pub fn matches_query(wallpaper: &Wallpaper, query: &str) -> bool {
    matches_folded(wallpaper, &fold_case(query))
}
