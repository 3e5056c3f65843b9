use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::backends::traits::{ItemPage, ItemQuery, NamePrefix};
use crate::constants::{
    ITEM_FIELDS, JELLYFIN_CLIENT_NAME, JELLYFIN_VERSION, NON_LETTER_UPPER_BOUND,
};
use crate::models::{CatalogEntry, Genre, ItemId, ItemKind, SectionId, UserId, UserState};

#[derive(Clone)]
pub struct JellyfinApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    user_id: UserId,
    device_id: String,
}

impl std::fmt::Debug for JellyfinApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JellyfinApi")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl JellyfinApi {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        user_id: UserId,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            user_id,
            device_id: Uuid::new_v4().to_string(),
        })
    }

    fn get_auth_header(&self) -> String {
        format!(
            r#"MediaBrowser Client="{}", Device="Linux", DeviceId="{}", Version="{}", Token="{}""#,
            JELLYFIN_CLIENT_NAME, self.device_id, JELLYFIN_VERSION, self.api_key
        )
    }

    /// Query string for `/Users/{id}/Items`. Unset constraints are left out.
    pub fn item_query_params(query: &ItemQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ParentId", query.section_id.to_string()),
            ("Limit", query.limit.to_string()),
            ("StartIndex", query.start_index.to_string()),
            ("SortBy", query.sort_by.as_api_str().to_string()),
            ("SortOrder", query.sort_order.as_api_str().to_string()),
            ("Recursive", "true".to_string()),
            ("Fields", ITEM_FIELDS.to_string()),
            ("EnableTotalRecordCount", "true".to_string()),
        ];

        if !query.include_item_types.is_empty() {
            let types: Vec<&str> = query
                .include_item_types
                .iter()
                .map(|kind| kind.as_api_str())
                .collect();
            params.push(("IncludeItemTypes", types.join(",")));
        }
        if !query.genres.is_empty() {
            params.push(("Genres", query.genres.join("|")));
        }
        if let Some(played) = query.is_played {
            params.push(("IsPlayed", played.to_string()));
        }
        if let Some(rating) = query.min_community_rating {
            params.push(("MinCommunityRating", rating.to_string()));
        }
        if let Some(range) = query.years {
            let years: Vec<String> = range.years().map(|year| year.to_string()).collect();
            if !years.is_empty() {
                params.push(("Years", years.join(",")));
            }
        }
        if !query.parental_ratings.is_empty() {
            params.push(("OfficialRatings", query.parental_ratings.join("|")));
        }
        match query.name_prefix {
            Some(NamePrefix::Letter(letter)) => {
                params.push(("NameStartsWith", letter.to_string()));
            }
            Some(NamePrefix::NonLetter) => {
                params.push(("NameLessThan", NON_LETTER_UPPER_BOUND.to_string()));
            }
            None => {}
        }
        if let Some(favorite) = query.is_favorite {
            params.push(("IsFavorite", favorite.to_string()));
        }

        params
    }

    pub async fn get_items(&self, query: &ItemQuery) -> Result<ItemPage> {
        let url = format!("{}/Users/{}/Items", self.base_url, self.user_id);
        let params = Self::item_query_params(query);

        debug!("Fetching items from {} with {:?}", url, params);
        let response = self
            .client
            .get(&url)
            .query(&params)
            .header("X-Emby-Authorization", self.get_auth_header())
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send request to Jellyfin: {}", e);
                anyhow!("Failed to send request to Jellyfin: {}", e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Failed to get items from Jellyfin: {} - {}", status, error_text);
            return Err(anyhow!("Failed to get items: {} - {}", status, error_text));
        }

        let items_response: ItemsResponse = response.json().await.map_err(|e| {
            error!("Failed to parse items response from Jellyfin: {}", e);
            anyhow!("Failed to parse items response: {}", e)
        })?;

        let total_record_count = items_response.total_record_count;
        let entries: Vec<CatalogEntry> = items_response
            .items
            .into_iter()
            .map(JellyfinItem::into_entry)
            .collect();

        info!(
            "Fetched {} of {} items for section {} (start {})",
            entries.len(),
            total_record_count,
            query.section_id,
            query.start_index
        );
        Ok(ItemPage {
            entries,
            total_record_count,
        })
    }

    pub async fn get_genres(&self, section_id: &SectionId) -> Result<Vec<Genre>> {
        let url = format!("{}/Genres", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("ParentId", section_id.as_str()),
                ("UserId", self.user_id.as_str()),
                ("SortBy", "SortName"),
            ])
            .header("X-Emby-Authorization", self.get_auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to get genres: {}", response.status()));
        }

        let genres: GenresResponse = response.json().await?;
        Ok(genres
            .items
            .into_iter()
            .map(|genre| Genre {
                id: genre.id,
                name: genre.name,
            })
            .collect())
    }

    pub async fn set_favorite(&self, item_id: &ItemId, favorite: bool) -> Result<()> {
        let url = format!(
            "{}/Users/{}/FavoriteItems/{}",
            self.base_url, self.user_id, item_id
        );
        self.send_toggle(&url, favorite, "favorite").await
    }

    pub async fn set_played(&self, item_id: &ItemId, played: bool) -> Result<()> {
        let url = format!(
            "{}/Users/{}/PlayedItems/{}",
            self.base_url, self.user_id, item_id
        );
        self.send_toggle(&url, played, "played").await
    }

    // POST marks, DELETE unmarks
    async fn send_toggle(&self, url: &str, enabled: bool, what: &str) -> Result<()> {
        let request = if enabled {
            self.client.post(url)
        } else {
            self.client.delete(url)
        };

        let response = request
            .header("X-Emby-Authorization", self.get_auth_header())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to update {} state: {}",
                what,
                response.status()
            ));
        }

        debug!("Set {} = {} via {}", what, enabled, url);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<JellyfinItem>,
    #[serde(default)]
    total_record_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinItem {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "Type")]
    item_type: Option<ItemKind>,
    #[serde(default)]
    is_folder: bool,
    production_year: Option<i32>,
    community_rating: Option<f32>,
    official_rating: Option<String>,
    genres: Option<Vec<String>>,
    #[serde(default)]
    image_tags: BTreeMap<String, String>,
    #[serde(default)]
    backdrop_image_tags: Vec<String>,
    #[serde(default)]
    media_sources: Vec<MediaSourceRef>,
    user_data: Option<UserData>,
}

impl JellyfinItem {
    fn into_entry(self) -> CatalogEntry {
        let user_state = self
            .user_data
            .map(|ud| UserState {
                is_favorite: ud.is_favorite,
                played: ud.played,
                play_count: ud.play_count,
            })
            .unwrap_or_default();

        CatalogEntry {
            id: ItemId::new(self.id),
            name: self.name,
            kind: self.item_type.unwrap_or(ItemKind::Other),
            is_folder: self.is_folder,
            production_year: self.production_year,
            community_rating: self.community_rating,
            official_rating: self.official_rating,
            genres: self.genres.unwrap_or_default(),
            image_tags: self.image_tags,
            backdrop_image_tags: self.backdrop_image_tags,
            media_source_count: self.media_sources.len(),
            user_state,
        }
    }
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MediaSourceRef {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UserData {
    #[serde(default)]
    played: bool,
    #[serde(default)]
    play_count: u32,
    #[serde(default)]
    is_favorite: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GenresResponse {
    #[serde(default)]
    items: Vec<JellyfinGenre>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinGenre {
    id: String,
    name: String,
}
