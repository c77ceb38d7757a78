//! # Catalog Models
//!
//! Domain types for the movie catalog and the wire DTOs they are built from.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

/// Highest score the catalog reports
pub const MAX_VOTE_AVERAGE: f64 = 10.0;

/// Reference to a movie poster.
///
/// Remote lists carry the catalog's image path; cached lists may carry the
/// image bytes themselves so they can be shown without a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PosterRef {
    Url(String),
    Image(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl PosterRef {
    pub fn url(&self) -> Option<&str> {
        match self {
            PosterRef::Url(path) => Some(path),
            PosterRef::Image(_) => None,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, PosterRef::Image(_))
    }
}

/// A single catalog entry. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    id: u64,
    title: Option<String>,
    overview: String,
    release_date: Option<String>,
    #[serde(deserialize_with = "clamped_vote")]
    vote_average: f64,
    poster: Option<PosterRef>,
}

impl Movie {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            overview: String::new(),
            release_date: None,
            vote_average: 0.0,
            poster: None,
        }
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = overview.into();
        self
    }

    pub fn with_release_date(mut self, release_date: impl Into<String>) -> Self {
        self.release_date = Some(release_date.into());
        self
    }

    /// Scores outside 0.0..=10.0 are clamped, NaN becomes 0.0
    pub fn with_vote_average(mut self, vote_average: f64) -> Self {
        self.vote_average = clamp_vote(vote_average);
        self
    }

    pub fn with_poster(mut self, poster: PosterRef) -> Self {
        self.poster = Some(poster);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn overview(&self) -> &str {
        &self.overview
    }

    pub fn release_date(&self) -> Option<&str> {
        self.release_date.as_deref()
    }

    pub fn vote_average(&self) -> f64 {
        self.vote_average
    }

    pub fn poster(&self) -> Option<&PosterRef> {
        self.poster.as_ref()
    }
}

fn clamped_vote<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_vote)
}

fn clamp_vote(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_VOTE_AVERAGE)
    }
}

/// Ordered list of movies with unique identifiers.
///
/// Order is the order the source delivered. Lists are replaced wholesale,
/// never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CatalogList {
    movies: Vec<Movie>,
}

impl CatalogList {
    /// Build a list, keeping the first occurrence of each identifier
    pub fn new(movies: impl IntoIterator<Item = Movie>) -> Self {
        let mut seen = HashSet::new();
        let movies = movies
            .into_iter()
            .filter(|movie| {
                let fresh = seen.insert(movie.id);
                if !fresh {
                    tracing::debug!("Dropping duplicate movie id {}", movie.id);
                }
                fresh
            })
            .collect();
        Self { movies }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn into_movies(self) -> Vec<Movie> {
        self.movies
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Movie> {
        self.movies.iter()
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Movie> {
        self.movies.iter().find(|movie| movie.id == id)
    }
}

impl<'de> Deserialize<'de> for CatalogList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let movies = Vec::<Movie>::deserialize(deserializer)?;
        Ok(Self::new(movies))
    }
}

impl FromIterator<Movie> for CatalogList {
    fn from_iter<I: IntoIterator<Item = Movie>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a> IntoIterator for &'a CatalogList {
    type Item = &'a Movie;
    type IntoIter = std::slice::Iter<'a, Movie>;

    fn into_iter(self) -> Self::IntoIter {
        self.movies.iter()
    }
}

/// Body of the upcoming-movies endpoint
#[derive(Debug, Deserialize)]
pub struct MovieListResponse {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub results: Option<Vec<MovieResult>>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_results: Option<u32>,
}

/// One entry of `results`; the catalog omits or nulls fields freely
#[derive(Debug, Deserialize)]
pub struct MovieResult {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl MovieResult {
    /// Convert to a domain movie; entries without an id are unusable
    pub fn into_movie(self) -> Option<Movie> {
        let id = self.id?;
        Some(Movie {
            id,
            title: self.title,
            overview: self.overview.unwrap_or_default(),
            release_date: self.release_date.filter(|date| !date.is_empty()),
            vote_average: clamp_vote(self.vote_average.unwrap_or_default()),
            poster: self
                .poster_path
                .filter(|path| !path.is_empty())
                .map(PosterRef::Url),
        })
    }
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
