//! # Catalog Services
//!
//! Remote data sources for the catalog. The coordinator talks to them only
//! through [`CatalogService`], so tests and alternative backends can stand in
//! for the HTTP client.

pub mod http;

use super::error::FetchError;
use super::models::CatalogList;
use async_trait::async_trait;
use bytes::Bytes;

pub use http::HttpCatalogService;

/// A remote source of upcoming movies
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// One round trip for the current upcoming list. No retries.
    async fn fetch_upcoming(&self) -> Result<CatalogList, FetchError>;

    /// Download the image behind a poster path from the catalog
    async fn fetch_poster(&self, poster_path: &str) -> Result<Bytes, FetchError>;
}
