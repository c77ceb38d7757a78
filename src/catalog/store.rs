//! # Local Catalog Store
//!
//! Durable copy of the last catalog fetched from the network, read back when
//! the catalog host is unreachable.

use super::error::StoreError;
use super::models::CatalogList;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Persistence for the last known catalog list
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Replace any previously stored list. Readers never see a partial list.
    async fn save(&self, list: &CatalogList) -> Result<(), StoreError>;

    /// Stored list, or `None` when nothing has been saved yet
    async fn load(&self) -> Result<Option<CatalogList>, StoreError>;
}

#[async_trait]
impl<T: CatalogStore + ?Sized> CatalogStore for Box<T> {
    async fn save(&self, list: &CatalogList) -> Result<(), StoreError> {
        (**self).save(list).await
    }

    async fn load(&self) -> Result<Option<CatalogList>, StoreError> {
        (**self).load().await
    }
}

#[derive(Serialize)]
struct CacheDocumentRef<'a> {
    saved_at: DateTime<Utc>,
    movies: &'a CatalogList,
}

#[derive(Deserialize)]
struct CacheDocument {
    #[allow(dead_code)] // kept in the file for humans inspecting the cache
    saved_at: DateTime<Utc>,
    movies: CatalogList,
}

/// JSON file store with atomic replace-on-save
#[derive(Debug, Clone)]
pub struct FileCatalogStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn unavailable(&self, source: io::Error) -> StoreError {
        StoreError::StorageUnavailable {
            path: self.path.clone(),
            source,
        }
    }

    /// Write `bytes` to a sibling temp file and rename it over the target
    fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(bytes)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for FileCatalogStore {
    async fn save(&self, list: &CatalogList) -> Result<(), StoreError> {
        let document = CacheDocumentRef {
            saved_at: Utc::now(),
            movies: list,
        };
        let bytes = serde_json::to_vec(&document).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let path = self.path.clone();
        let write_lock = Arc::clone(&self.write_lock);
        tokio::task::spawn_blocking(move || {
            let _guard = write_lock.lock().unwrap_or_else(|e| e.into_inner());
            FileCatalogStore::write_atomically(&path, &bytes)
        })
        .await
        .map_err(|e| self.unavailable(io::Error::other(e)))?
        .map_err(|e| self.unavailable(e))?;

        tracing::debug!(
            "Saved {} movies to catalog cache {}",
            list.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<CatalogList>, StoreError> {
        let path = self.path.clone();
        let read = tokio::task::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|e| self.unavailable(io::Error::other(e)))?;

        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No catalog cache at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(self.unavailable(e)),
        };

        let document: CacheDocument =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            "Loaded {} movies from catalog cache {}",
            document.movies.len(),
            self.path.display()
        );
        Ok(Some(document.movies))
    }
}

/// Process-local store for sessions that run with the cache turned off
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    list: Mutex<Option<CatalogList>>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(list: CatalogList) -> Self {
        Self {
            list: Mutex::new(Some(list)),
        }
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn save(&self, list: &CatalogList) -> Result<(), StoreError> {
        *self.list.lock().unwrap_or_else(|e| e.into_inner()) = Some(list.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<CatalogList>, StoreError> {
        Ok(self.list.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::{Movie, PosterRef};

    fn sample() -> CatalogList {
        CatalogList::new(vec![
            Movie::new(10, "Dune")
                .with_overview("Spice")
                .with_release_date("2024-03-01")
                .with_vote_average(8.4)
                .with_poster(PosterRef::Url("/dune.jpg".to_string())),
            Movie::new(11, "Alien").with_poster(PosterRef::Image(vec![1, 2, 3])),
        ])
    }

    #[tokio::test]
    async fn load_should_return_none_when_nothing_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCatalogStore::new(dir.path().join("catalog.json"));

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_should_return_equal_list_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCatalogStore::new(dir.path().join("nested/cache/catalog.json"));

        store.save(&sample()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded, sample());
    }

    #[tokio::test]
    async fn save_should_replace_previous_list_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCatalogStore::new(dir.path().join("catalog.json"));

        store.save(&sample()).await.unwrap();
        let replacement = CatalogList::new(vec![Movie::new(99, "Heat")]);
        store.save(&replacement).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap(), replacement);
    }

    #[tokio::test]
    async fn save_should_not_leave_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCatalogStore::new(dir.path().join("catalog.json"));

        store.save(&sample()).await.unwrap();
        store.save(&sample()).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn stores_sharing_a_file_should_serialize_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCatalogStore::new(dir.path().join("catalog.json"));
        let other = store.clone();

        let first = CatalogList::new(vec![Movie::new(1, "One")]);
        let second = CatalogList::new(vec![Movie::new(2, "Two")]);
        let (a, b) = tokio::join!(store.save(&first), other.save(&second));
        a.unwrap();
        b.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert!(loaded == first || loaded == second);
    }

    #[tokio::test]
    async fn load_should_report_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = FileCatalogStore::new(&path);
        let result = store.load().await;

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn load_should_report_unreadable_cache() {
        let dir = tempfile::tempdir().unwrap();
        // a directory where the file should be
        let store = FileCatalogStore::new(dir.path());

        let result = store.load().await;

        assert!(matches!(result, Err(StoreError::StorageUnavailable { .. })));
    }

    #[tokio::test]
    async fn memory_store_should_round_trip() {
        let store = MemoryCatalogStore::new();
        assert!(store.load().await.unwrap().is_none());

        store.save(&sample()).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap(), sample());
    }
}
