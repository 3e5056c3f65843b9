use reel_library::backends::ItemPage;
use reel_library::models::{CatalogEntry, ItemKind};

pub struct EntryBuilder {
    entry: CatalogEntry,
}

impl EntryBuilder {
    pub fn movie(id: &str) -> Self {
        let mut entry = CatalogEntry::new(id, format!("Movie {}", id), ItemKind::Movie);
        entry.media_source_count = 1;
        entry
            .image_tags
            .insert("Primary".to_string(), format!("{}-primary", id));
        Self { entry }
    }

    pub fn series(id: &str) -> Self {
        Self {
            entry: CatalogEntry::new(id, format!("Series {}", id), ItemKind::Series),
        }
    }

    /// Movie with no media sources and no artwork.
    pub fn movie_stub(id: &str) -> Self {
        Self {
            entry: CatalogEntry::new(id, format!("Stub {}", id), ItemKind::Movie),
        }
    }

    pub fn folder(id: &str) -> Self {
        Self {
            entry: CatalogEntry::new(id, format!("Folder {}", id), ItemKind::Folder),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.entry.name = name.to_string();
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.entry.user_state.is_favorite = favorite;
        self
    }

    pub fn played(mut self, played: bool) -> Self {
        self.entry.user_state.played = played;
        self
    }

    pub fn build(self) -> CatalogEntry {
        self.entry
    }
}

/// Page of movies `item-{start}`..`item-{end - 1}`.
pub fn movie_page(range: std::ops::Range<usize>, total: usize) -> ItemPage {
    ItemPage {
        entries: range
            .map(|i| EntryBuilder::movie(&format!("item-{}", i)).build())
            .collect(),
        total_record_count: total,
    }
}

pub fn page_of(entries: Vec<CatalogEntry>, total: usize) -> ItemPage {
    ItemPage {
        entries,
        total_record_count: total,
    }
}
