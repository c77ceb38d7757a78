//! # Catalog Filter
//!
//! Search-as-you-type filtering over an in-memory catalog list.

use super::models::{CatalogList, Movie};

/// Filter `list` down to movies whose title contains `query`, ignoring case.
///
/// An empty query returns the list unchanged. Movies without a title never
/// match a non-empty query.
pub fn apply(list: &CatalogList, query: &str) -> CatalogList {
    if query.is_empty() {
        return list.clone();
    }

    let needle = query.to_lowercase();
    list.iter()
        .filter(|movie| title_matches(movie, &needle))
        .cloned()
        .collect()
}

fn title_matches(movie: &Movie, needle: &str) -> bool {
    movie
        .title()
        .is_some_and(|title| title.to_lowercase().contains(needle))
}
