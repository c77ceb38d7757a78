//! # movielist - Upcoming Movie Catalog with an Offline Cache
//!
//! Lists upcoming movies from a TMDB-style catalog API, keeps the last good
//! list on disk for when the network is gone, and filters it by title.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  refresh()  ┌─────────────────────┐  fetch   ┌────────────────┐
//! │  CLI / View  │────────────▶│ CatalogCoordinator  │─────────▶│ CatalogService │
//! │              │◀────────────│                     │          └────────────────┘
//! │ - filter     │   list      │ - source selection  │  save/load ┌──────────────┐
//! │ - rendering  │             │ - write-through     │───────────▶│ CatalogStore │
//! └──────────────┘             └─────────────────────┘            └──────────────┘
//!        ▲                               │ current_status()
//!        │ transitions        ┌─────────────────────┐
//!        └────────────────────│ ReachabilityMonitor │◀── ReachabilityProbe
//!                             └─────────────────────┘
//! ```

pub mod catalog;
pub mod cmd_args;
pub mod config;
pub mod controller;
pub mod view;

// Re-export main types for easy access
pub use catalog::*;
