//! # HTTP Catalog Service
//!
//! Fetches the upcoming-movies list and poster images over HTTP.

use super::CatalogService;
use crate::catalog::error::FetchError;
use crate::catalog::models::{CatalogList, MovieListResponse, MovieResult};
use crate::config::CatalogProfile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Url};

/// Path of the upcoming-movies endpoint below the API base
pub const UPCOMING_PATH: &str = "movie/upcoming";

#[derive(Debug, Clone)]
enum Credentials {
    /// v3 style `api_key` query parameter
    ApiKey(String),
    /// v4 style read access token
    Bearer(String),
    None,
}

/// Catalog service backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpCatalogService {
    client: Client,
    upcoming_url: Url,
    image_base: String,
    credentials: Credentials,
    language: String,
    region: Option<String>,
}

impl HttpCatalogService {
    /// Create a service from a profile
    pub fn new(profile: &CatalogProfile) -> Result<Self> {
        tracing::debug!("Creating HttpCatalogService for {}", profile.api_base());

        let client = Client::builder()
            .timeout(profile.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let upcoming_url = endpoint(profile.api_base(), UPCOMING_PATH)?;

        let credentials = match (profile.access_token(), profile.api_key()) {
            (Some(token), _) => Credentials::Bearer(token.to_string()),
            (None, Some(key)) => Credentials::ApiKey(key.to_string()),
            (None, None) => {
                tracing::warn!("Profile has no api_key or access_token; the catalog will likely refuse requests");
                Credentials::None
            }
        };

        Ok(Self {
            client,
            upcoming_url,
            image_base: profile.image_base().trim_end_matches('/').to_string(),
            credentials,
            language: profile.language().to_string(),
            region: profile.region().map(str::to_string),
        })
    }

    pub fn upcoming_url(&self) -> &Url {
        &self.upcoming_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::ApiKey(key) => request.query(&[("api_key", key)]),
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::None => request,
        }
    }

    fn poster_url(&self, poster_path: &str) -> String {
        format!("{}/{}", self.image_base, poster_path.trim_start_matches('/'))
    }

    async fn get_bytes(&self, request: RequestBuilder) -> Result<Bytes, FetchError> {
        let start_time = std::time::Instant::now();
        let response = request.send().await.map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Catalog answered {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            );
            return Err(FetchError::ServerError(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::from_body_read)?;
        tracing::debug!(
            "Catalog response: status={}, length={}, duration={}ms",
            status.as_u16(),
            body.len(),
            start_time.elapsed().as_millis()
        );
        Ok(body)
    }
}

/// Join `path` below `base`, keeping any path prefix `base` already has
fn endpoint(base: &str, path: &str) -> Result<Url> {
    let base = format!("{}/", base.trim_end_matches('/'));
    let base = Url::parse(&base).with_context(|| format!("Invalid api_base '{base}'"))?;
    base.join(path)
        .with_context(|| format!("Invalid endpoint path '{path}'"))
}

/// Decode an upcoming-movies body into a catalog list
pub fn parse_upcoming(body: &[u8]) -> Result<CatalogList, FetchError> {
    let response: MovieListResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let results = response
        .results
        .ok_or_else(|| FetchError::MalformedResponse("missing 'results' array".to_string()))?;

    let total = results.len();
    let list: CatalogList = results
        .into_iter()
        .filter_map(MovieResult::into_movie)
        .collect();
    if list.len() != total {
        tracing::debug!("Skipped {} unusable catalog entries", total - list.len());
    }
    Ok(list)
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn fetch_upcoming(&self) -> Result<CatalogList, FetchError> {
        tracing::debug!("Fetching upcoming movies from {}", self.upcoming_url);

        let mut params = vec![("language", self.language.as_str()), ("page", "1")];
        if let Some(region) = &self.region {
            params.push(("region", region.as_str()));
        }
        let request = self
            .authorize(self.client.get(self.upcoming_url.clone()))
            .query(&params);

        let body = self.get_bytes(request).await?;
        let list = parse_upcoming(&body)?;
        tracing::info!("Fetched {} upcoming movies", list.len());
        Ok(list)
    }

    async fn fetch_poster(&self, poster_path: &str) -> Result<Bytes, FetchError> {
        let url = self.poster_url(poster_path);
        tracing::debug!("Fetching poster {url}");
        self.get_bytes(self.client.get(url)).await
    }
}
