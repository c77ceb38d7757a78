//! Test doubles for catalog services.

use super::error::FetchError;
use super::models::CatalogList;
use super::services::CatalogService;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// What the mock answers for `fetch_upcoming`
pub enum MockOutcome {
    List(CatalogList),
    Fail(fn() -> FetchError),
}

/// In-memory catalog service that counts its calls
pub struct MockCatalogService {
    outcome: Mutex<MockOutcome>,
    posters: HashMap<String, Vec<u8>>,
    latency: Option<Duration>,
    fetch_calls: AtomicUsize,
    poster_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockCatalogService {
    pub fn returning(list: CatalogList) -> Self {
        Self::with_outcome(MockOutcome::List(list))
    }

    pub fn failing(error: fn() -> FetchError) -> Self {
        Self::with_outcome(MockOutcome::Fail(error))
    }

    fn with_outcome(outcome: MockOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            posters: HashMap::new(),
            latency: None,
            fetch_calls: AtomicUsize::new(0),
            poster_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_poster(mut self, path: &str, bytes: &[u8]) -> Self {
        self.posters.insert(path.to_string(), bytes.to_vec());
        self
    }

    /// Make every `fetch_upcoming` take at least `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn poster_calls(&self) -> usize {
        self.poster_calls.load(Ordering::SeqCst)
    }

    /// Highest number of `fetch_upcoming` calls seen running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogService for MockCatalogService {
    async fn fetch_upcoming(&self) -> Result<CatalogList, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let result = match &*self.outcome.lock().unwrap() {
            MockOutcome::List(list) => Ok(list.clone()),
            MockOutcome::Fail(error) => Err(error()),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn fetch_poster(&self, poster_path: &str) -> Result<Bytes, FetchError> {
        self.poster_calls.fetch_add(1, Ordering::SeqCst);
        self.posters
            .get(poster_path)
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or(FetchError::ServerError(404))
    }
}
