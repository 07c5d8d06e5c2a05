//! Input validation utilities.
//!
//! Functions here are pure: they never touch storage, so a request that fails
//! validation has no side effects.

use crate::constants::{MAX_NAME_LEN, TAG_SEPARATOR};
use crate::{CatalogError, CatalogResult};
use wallpaper_types::{NonEmptyText, TextError};

/// Split a raw comma-separated tag field into its tags.
///
/// Each tag is trimmed, empty entries are dropped and exact duplicates are
/// removed, keeping the first occurrence. Case is preserved: `" cat, , Dog "`
/// becomes `["cat", "Dog"]`.
///
/// # Errors
///
/// Returns [`CatalogError::Validation`] if no tag survives.
pub fn normalise_tags(raw: &str) -> CatalogResult<Vec<NonEmptyText>> {
    let mut tags: Vec<NonEmptyText> = Vec::new();

    for tag in raw.split(TAG_SEPARATOR).filter_map(|t| NonEmptyText::new(t).ok()) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.is_empty() {
        return Err(CatalogError::Validation(
            "At least one tag is required".into(),
        ));
    }

    Ok(tags)
}

/// Validate a wallpaper display name.
///
/// # Errors
///
/// Returns [`CatalogError::Validation`] if the name is blank or longer than
/// [`MAX_NAME_LEN`] characters.
pub fn validate_name(raw: &str) -> CatalogResult<NonEmptyText> {
    NonEmptyText::bounded(raw, MAX_NAME_LEN).map_err(|e| match e {
        TextError::Empty => CatalogError::Validation("Name and tags are required".into()),
        TextError::TooLong { max } => {
            CatalogError::Validation(format!("Name must be at most {max} characters"))
        }
    })
}

/// Validate a search query, returning it trimmed.
///
/// # Errors
///
/// Returns [`CatalogError::Validation`] if the query is missing or blank.
pub fn validate_search_query(raw: Option<&str>) -> CatalogResult<NonEmptyText> {
    raw.and_then(|q| NonEmptyText::new(q).ok())
        .ok_or_else(|| CatalogError::Validation("Search query is required".into()))
}
