use super::{CatalogEntry, FilterState, Genre, ItemId};

/// Snapshot of a library section as the UI should draw it.
///
/// Every transition publishes a fresh value; readers never observe a
/// half-applied update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub items: Vec<CatalogEntry>,
    /// Server-reported count for the current filter, before local filtering.
    pub total_record_count: usize,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub error: Option<String>,
    pub current_letter: Option<char>,
    pub filter_state: FilterState,
    pub available_genres: Vec<Genre>,
}

impl ViewState {
    pub fn is_empty(&self) -> bool {
        !self.is_loading && self.error.is_none() && self.items.is_empty()
    }

    pub fn can_load_more(&self) -> bool {
        self.items.len() < self.total_record_count && !self.is_loading && !self.is_loading_more
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&CatalogEntry> {
        self.items.iter().find(|item| &item.id == id)
    }
}
