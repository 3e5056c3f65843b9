use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{FilterState, SectionId};
use crate::utils::{AppError, AppResult};

/// Remembers the last filter selection of each catalog section.
#[async_trait]
pub trait FilterStore: Send + Sync + std::fmt::Debug {
    /// `None` when nothing was saved for the section.
    async fn load_filter_state(&self, section_id: &SectionId) -> Option<FilterState>;

    async fn save_filter_state(&self, section_id: &SectionId, state: &FilterState)
    -> AppResult<()>;
}

/// Keeps filters in the `[library.filters]` table of the config file.
#[derive(Debug)]
pub struct ConfigFilterStore {
    config: Arc<RwLock<Config>>,
    path: PathBuf,
}

impl ConfigFilterStore {
    pub fn new(config: Arc<RwLock<Config>>, path: PathBuf) -> Self {
        Self { config, path }
    }

    pub fn config(&self) -> Arc<RwLock<Config>> {
        self.config.clone()
    }
}

#[async_trait]
impl FilterStore for ConfigFilterStore {
    async fn load_filter_state(&self, section_id: &SectionId) -> Option<FilterState> {
        let config = self.config.read().await;
        if !config.library.persist_filters {
            return None;
        }
        config.library.filters.get(section_id.as_str()).cloned()
    }

    async fn save_filter_state(
        &self,
        section_id: &SectionId,
        state: &FilterState,
    ) -> AppResult<()> {
        let mut config = self.config.write().await;
        if !config.library.persist_filters {
            debug!("Filter persistence disabled, not saving {}", section_id);
            return Ok(());
        }

        config
            .library
            .filters
            .insert(section_id.to_string(), state.clone());
        config
            .save_to(&self.path)
            .map_err(|e| AppError::Configuration(format!("{:#}", e)))?;

        info!("Saved filter state for section {}", section_id);
        Ok(())
    }
}

/// Process-local store, for sessions that should not touch disk.
#[derive(Debug, Default)]
pub struct MemoryFilterStore {
    states: RwLock<HashMap<SectionId, FilterState>>,
}

impl MemoryFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_state(self, section_id: SectionId, state: FilterState) -> Self {
        self.states.write().await.insert(section_id, state);
        self
    }
}

#[async_trait]
impl FilterStore for MemoryFilterStore {
    async fn load_filter_state(&self, section_id: &SectionId) -> Option<FilterState> {
        self.states.read().await.get(section_id).cloned()
    }

    async fn save_filter_state(
        &self,
        section_id: &SectionId,
        state: &FilterState,
    ) -> AppResult<()> {
        self.states
            .write()
            .await
            .insert(section_id.clone(), state.clone());
        Ok(())
    }
}
