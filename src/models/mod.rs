pub mod filter;
mod identifiers;
pub mod view_state;

pub use filter::{
    FilterChanges, FilterState, SortBy, SortOrder, ViewMode, WatchedFilter, YearRange,
};
pub use identifiers::{ItemId, SectionId, UserId};
pub use view_state::ViewState;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Movie,
    Series,
    Season,
    Episode,
    BoxSet,
    Folder,
    CollectionFolder,
    MusicAlbum,
    Video,
    #[serde(other)]
    Other,
}

impl ItemKind {
    /// Name used for `IncludeItemTypes`.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ItemKind::Movie => "Movie",
            ItemKind::Series => "Series",
            ItemKind::Season => "Season",
            ItemKind::Episode => "Episode",
            ItemKind::BoxSet => "BoxSet",
            ItemKind::Folder => "Folder",
            ItemKind::CollectionFolder => "CollectionFolder",
            ItemKind::MusicAlbum => "MusicAlbum",
            ItemKind::Video => "Video",
            ItemKind::Other => "Other",
        }
    }
}

/// Per-user state attached to a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserState {
    pub is_favorite: bool,
    pub played: bool,
    pub play_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    pub is_folder: bool,
    pub production_year: Option<i32>,
    pub community_rating: Option<f32>,
    pub official_rating: Option<String>,
    pub genres: Vec<String>,
    /// Image type ("Primary", "Thumb", ...) to tag.
    pub image_tags: BTreeMap<String, String>,
    pub backdrop_image_tags: Vec<String>,
    pub media_source_count: usize,
    pub user_state: UserState,
}

impl CatalogEntry {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            is_folder: matches!(
                kind,
                ItemKind::Series
                    | ItemKind::Season
                    | ItemKind::BoxSet
                    | ItemKind::Folder
                    | ItemKind::CollectionFolder
                    | ItemKind::MusicAlbum
            ),
            production_year: None,
            community_rating: None,
            official_rating: None,
            genres: Vec::new(),
            image_tags: BTreeMap::new(),
            backdrop_image_tags: Vec::new(),
            media_source_count: 0,
            user_state: UserState::default(),
        }
    }

    pub fn has_any_image(&self) -> bool {
        !self.image_tags.is_empty() || !self.backdrop_image_tags.is_empty()
    }

    /// Bare folder nodes the server returns for directory structure; they
    /// cannot be played or opened as a title.
    pub fn is_placeholder_folder(&self) -> bool {
        self.is_folder && self.kind == ItemKind::Folder
    }

    /// Movie stubs with nothing to play and nothing to show.
    pub fn is_unresolved_movie(&self) -> bool {
        self.kind == ItemKind::Movie && self.media_source_count == 0 && !self.has_any_image()
    }

    /// Whether the entry should be shown in a library grid.
    pub fn is_displayable(&self) -> bool {
        !self.is_placeholder_folder() && !self.is_unresolved_movie()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    pub name: String,
}
