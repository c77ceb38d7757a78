//! # Catalog Access Coordinator
//!
//! Picks the catalog source for each refresh:
//!
//! ```text
//!              ┌──────────────┐  satisfied   ┌────────────────┐  ok   ┌──────────────┐
//! refresh() ──▶│ Reachability │─────────────▶│ CatalogService │──────▶│ store.save() │──▶ remote list
//!              └──────────────┘              └────────────────┘       └──────────────┘
//!                     │ unsatisfied                  │ error
//!                     ▼                              ▼
//!              ┌──────────────┐               ┌──────────────┐
//!              │ store.load() │──▶ cached     │ store.load() │──▶ cached list or empty
//!              └──────────────┘    or empty   └──────────────┘
//! ```
//!
//! Exactly one source is consulted per branch; the store is never read
//! speculatively alongside the network.

use super::models::{CatalogList, Movie, PosterRef};
use super::reachability::{ReachabilityMonitor, ReachabilityState};
use super::services::CatalogService;
use super::store::CatalogStore;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Where the current list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    /// Fresh from the catalog service
    Remote,
    /// Read back from the local store
    Cache,
    /// Nothing available
    Empty,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Remote => write!(f, "remote"),
            CatalogSource::Cache => write!(f, "cache"),
            CatalogSource::Empty => write!(f, "empty"),
        }
    }
}

/// The current list together with its origin
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub list: CatalogList,
    pub source: CatalogSource,
}

impl CatalogSnapshot {
    fn empty() -> Self {
        Self {
            list: CatalogList::empty(),
            source: CatalogSource::Empty,
        }
    }
}

/// Cache-first access to the upcoming catalog
pub struct CatalogCoordinator<C, S> {
    service: C,
    store: S,
    monitor: Arc<ReachabilityMonitor>,
    embed_posters: bool,
    current: watch::Sender<CatalogSnapshot>,
    refresh_lock: Mutex<()>,
}

impl<C: CatalogService, S: CatalogStore> CatalogCoordinator<C, S> {
    pub fn new(service: C, store: S, monitor: Arc<ReachabilityMonitor>) -> Self {
        let (current, _) = watch::channel(CatalogSnapshot::empty());
        Self {
            service,
            store,
            monitor,
            embed_posters: false,
            current,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Download poster images before writing a remote list through to the store
    pub fn with_embedded_posters(mut self, embed_posters: bool) -> Self {
        self.embed_posters = embed_posters;
        self
    }

    pub fn service(&self) -> &C {
        &self.service
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn monitor(&self) -> &Arc<ReachabilityMonitor> {
        &self.monitor
    }

    /// Fetch the best available list and make it current.
    ///
    /// Never fails: remote and storage errors degrade to the cached list or
    /// to an empty one. Concurrent calls run one at a time.
    pub async fn refresh(&self) -> CatalogList {
        let _guard = self.refresh_lock.lock().await;

        let snapshot = match self.monitor.current_status() {
            ReachabilityState::Satisfied => match self.service.fetch_upcoming().await {
                Ok(list) => {
                    let list = if self.embed_posters {
                        self.attach_posters(list).await
                    } else {
                        list
                    };
                    self.write_through(&list).await;
                    CatalogSnapshot {
                        list,
                        source: CatalogSource::Remote,
                    }
                }
                Err(e) => {
                    tracing::warn!("Catalog fetch failed, falling back to cache: {e}");
                    self.load_cached().await
                }
            },
            ReachabilityState::Unsatisfied => {
                tracing::info!("Catalog host unreachable, reading cache");
                self.load_cached().await
            }
        };

        tracing::info!(
            "Current catalog: {} movies from {}",
            snapshot.list.len(),
            snapshot.source
        );
        let list = snapshot.list.clone();
        self.current.send_replace(snapshot);
        list
    }

    async fn write_through(&self, list: &CatalogList) {
        if let Err(e) = self.store.save(list).await {
            tracing::warn!("Failed to update catalog cache: {e}");
        }
    }

    async fn load_cached(&self) -> CatalogSnapshot {
        match self.store.load().await {
            Ok(Some(list)) => CatalogSnapshot {
                list,
                source: CatalogSource::Cache,
            },
            Ok(None) => {
                tracing::debug!("Catalog cache is empty");
                CatalogSnapshot::empty()
            }
            Err(e) => {
                tracing::warn!("Catalog cache unavailable: {e}");
                CatalogSnapshot::empty()
            }
        }
    }

    /// Replace poster paths with image bytes; failed downloads keep the path
    async fn attach_posters(&self, list: CatalogList) -> CatalogList {
        let mut movies = Vec::with_capacity(list.len());
        for movie in list.into_movies() {
            let path = movie.poster().and_then(PosterRef::url).map(str::to_string);
            let movie = match path {
                Some(path) => match self.service.fetch_poster(&path).await {
                    Ok(bytes) => movie.with_poster(PosterRef::Image(bytes.to_vec())),
                    Err(e) => {
                        tracing::debug!("Keeping poster path {path}: {e}");
                        movie
                    }
                },
                None => movie,
            };
            movies.push(movie);
        }
        CatalogList::new(movies)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.current.borrow().clone()
    }

    pub fn current(&self) -> CatalogList {
        self.current.borrow().list.clone()
    }

    pub fn source(&self) -> CatalogSource {
        self.current.borrow().source
    }

    /// Receiver that observes every replacement of the current list
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.current.subscribe()
    }

    /// Look up a movie in the current list
    pub fn find(&self, id: u64) -> Option<Movie> {
        self.current.borrow().list.get(id).cloned()
    }
}
