#![allow(dead_code)]

pub mod builders;
pub mod mocks;

use reel_library::models::SectionId;
use reel_library::{LibraryQueryOptions, LibraryQueryState};
use std::sync::Arc;
use std::time::Duration;

pub use builders::{EntryBuilder, movie_page, page_of};
pub use mocks::{MockCatalog, RecordingFilterStore};

pub const SECTION: &str = "library-1";

pub struct TestContext {
    pub catalog: Arc<MockCatalog>,
    pub store: Arc<RecordingFilterStore>,
    pub library: Arc<LibraryQueryState>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(RecordingFilterStore::new())
    }

    pub fn with_store(store: RecordingFilterStore) -> Self {
        let catalog = Arc::new(MockCatalog::new());
        let store = Arc::new(store);
        let library = Arc::new(LibraryQueryState::new(
            catalog.clone(),
            store.clone(),
            LibraryQueryOptions::default(),
        ));
        Self {
            catalog,
            store,
            library,
        }
    }

    pub fn section() -> SectionId {
        SectionId::new(SECTION)
    }

    pub async fn initialize(&self) {
        self.library.initialize(Self::section()).await;
    }

    /// Yield until the catalog has seen `count` item queries.
    pub async fn wait_for_queries(&self, count: usize) {
        self.wait_until(|| self.catalog.query_count() >= count).await;
    }

    /// Yield until `condition` holds, failing the test after five seconds.
    pub async fn wait_until(&self, condition: impl Fn() -> bool) {
        let wait = async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for condition");
    }
}
