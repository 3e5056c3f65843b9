mod api;


pub use api::JellyfinApi;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{CatalogClient, ItemPage, ItemQuery};
use crate::config::JellyfinConfig;
use crate::models::{Genre, ItemId, SectionId, UserId};

/// Jellyfin server as a paged, filterable catalog.
#[derive(Debug, Clone)]
pub struct JellyfinCatalog {
    api: JellyfinApi,
}

impl JellyfinCatalog {
    pub fn new(api: JellyfinApi) -> Self {
        Self { api }
    }

    pub fn from_config(config: &JellyfinConfig) -> Result<Self> {
        if config.server_url.is_empty() {
            return Err(anyhow!("Jellyfin server_url is not configured"));
        }
        let access_token = config
            .access_token
            .clone()
            .ok_or_else(|| anyhow!("Jellyfin access_token is not configured"))?;
        let user_id = config
            .user_id
            .clone()
            .ok_or_else(|| anyhow!("Jellyfin user_id is not configured"))?;

        let api = JellyfinApi::new(
            config.server_url.clone(),
            access_token,
            UserId::new(user_id),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        Ok(Self::new(api))
    }
}

#[async_trait]
impl CatalogClient for JellyfinCatalog {
    async fn fetch_entries(&self, query: &ItemQuery) -> Result<ItemPage> {
        self.api.get_items(query).await
    }

    async fn fetch_genres(&self, section_id: &SectionId) -> Result<Vec<Genre>> {
        let genres = self.api.get_genres(section_id).await.inspect_err(|e| {
            warn!("Failed to load genres for {}: {}", section_id, e);
        })?;
        debug!("Loaded {} genres for {}", genres.len(), section_id);
        Ok(genres)
    }

    async fn set_favorite(&self, item_id: &ItemId, favorite: bool) -> Result<()> {
        self.api.set_favorite(item_id, favorite).await
    }

    async fn set_played(&self, item_id: &ItemId, played: bool) -> Result<()> {
        self.api.set_played(item_id, played).await
    }
}
