//! # Catalog
//!
//! Cache-first access to the upcoming-movies catalog:
//!
//! - **services**: remote catalog clients
//! - **store**: durable copy of the last fetched list
//! - **reachability**: online/offline status and change notification
//! - **coordinator**: source selection and write-through
//! - **filter**: title search over a list

pub mod coordinator;
pub mod error;
pub mod filter;
pub mod models;
pub mod reachability;
pub mod services;
pub mod store;

#[cfg(test)]
pub mod testing;

pub use coordinator::{CatalogCoordinator, CatalogSnapshot, CatalogSource};
pub use error::{FetchError, StoreError};
pub use models::{CatalogList, Movie, PosterRef};
pub use reachability::{ReachabilityMonitor, ReachabilityProbe, ReachabilityState, Subscription};
pub use services::{CatalogService, HttpCatalogService};
pub use store::{CatalogStore, FileCatalogStore, MemoryCatalogStore};
