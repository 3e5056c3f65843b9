use anyhow::Result;
use async_trait::async_trait;

use crate::constants::NON_LETTER;
use crate::models::{
    CatalogEntry, FilterState, Genre, ItemId, ItemKind, SectionId, SortBy, SortOrder, YearRange,
};

#[async_trait]
pub trait CatalogClient: Send + Sync + std::fmt::Debug {
    /// Fetch one page of a section's children matching `query`.
    async fn fetch_entries(&self, query: &ItemQuery) -> Result<ItemPage>;

    async fn fetch_genres(&self, section_id: &SectionId) -> Result<Vec<Genre>>;

    async fn set_favorite(&self, item_id: &ItemId, favorite: bool) -> Result<()>;

    async fn set_played(&self, item_id: &ItemId, played: bool) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPage {
    pub entries: Vec<CatalogEntry>,
    pub total_record_count: usize,
}

/// Name constraint used by the alphabet jump bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePrefix {
    Letter(char),
    /// Titles starting with a digit or symbol.
    NonLetter,
}

impl NamePrefix {
    pub fn from_letter(letter: char) -> Self {
        if letter == NON_LETTER {
            NamePrefix::NonLetter
        } else {
            NamePrefix::Letter(letter.to_ascii_uppercase())
        }
    }
}

/// A fully resolved item query. `None` and empty collections mean the
/// constraint is left out of the request, never "match nothing".
#[derive(Debug, Clone, PartialEq)]
pub struct ItemQuery {
    pub section_id: SectionId,
    pub limit: u32,
    pub start_index: usize,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub include_item_types: Vec<ItemKind>,
    pub genres: Vec<String>,
    pub is_played: Option<bool>,
    pub min_community_rating: Option<f32>,
    pub years: Option<YearRange>,
    pub parental_ratings: Vec<String>,
    pub name_prefix: Option<NamePrefix>,
    pub is_favorite: Option<bool>,
}

impl ItemQuery {
    pub fn from_filter(
        section_id: &SectionId,
        filter: &FilterState,
        letter: Option<char>,
        start_index: usize,
        limit: u32,
        include_item_types: &[ItemKind],
    ) -> Self {
        Self {
            section_id: section_id.clone(),
            limit,
            start_index,
            sort_by: filter.sort_by,
            sort_order: filter.sort_order,
            include_item_types: include_item_types.to_vec(),
            genres: filter.selected_genres.iter().cloned().collect(),
            is_played: filter.watched_filter.is_played(),
            min_community_rating: filter.rating_filter,
            years: filter.year_range,
            parental_ratings: filter.selected_parental_ratings.iter().cloned().collect(),
            name_prefix: letter.map(NamePrefix::from_letter),
            is_favorite: filter.favorites_only.then_some(true),
        }
    }
}
