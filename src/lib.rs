//! Library browsing state for Jellyfin TV clients.
//!
//! [`LibraryQueryState`] owns the filters, sort order, letter jump and paging
//! of one catalog section and publishes [`ViewState`] snapshots for a UI to
//! draw. The catalog and filter persistence are reached through the
//! [`CatalogClient`] and [`FilterStore`] traits.

pub mod backends;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod services;
pub mod utils;

pub use backends::{CatalogClient, ItemPage, ItemQuery, JellyfinCatalog, NamePrefix};
pub use config::Config;
pub use crate::core::{LibraryQueryOptions, LibraryQueryState, ViewModel};
pub use models::{CatalogEntry, FilterState, ViewState};
pub use services::{ConfigFilterStore, FilterStore, MemoryFilterStore};
pub use utils::{AppError, AppResult};
