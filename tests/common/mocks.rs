use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reel_library::backends::{CatalogClient, ItemPage, ItemQuery};
use reel_library::models::{FilterState, Genre, ItemId, SectionId};
use reel_library::services::{FilterStore, MemoryFilterStore};
use reel_library::utils::{AppError, AppResult};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

/// Catalog double. Item queries are answered from a script in call order and
/// recorded; individual calls can be held until released by the test.
#[derive(Debug, Default)]
pub struct MockCatalog {
    queries: Mutex<Vec<ItemQuery>>,
    responses: Mutex<VecDeque<Result<ItemPage, String>>>,
    gates: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
    genres: Mutex<Option<Result<Vec<Genre>, String>>>,
    genre_gate: Mutex<Option<oneshot::Receiver<()>>>,
    toggle_error: Mutex<Option<String>>,
    toggles: Mutex<Vec<(ItemId, &'static str, bool)>>,
    genre_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: ItemPage) {
        self.responses.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_error(&self, error: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(error.to_string()));
    }

    /// Hold the `index`-th item query (0-based) until the returned sender fires.
    pub fn hold_call(&self, index: usize) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(index, rx);
        tx
    }

    /// Hold the next genre fetch until the returned sender fires.
    pub fn hold_genres(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.genre_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn set_genres(&self, genres: Vec<&str>) {
        let genres = genres
            .into_iter()
            .enumerate()
            .map(|(i, name)| Genre {
                id: format!("genre-{}", i),
                name: name.to_string(),
            })
            .collect();
        *self.genres.lock().unwrap() = Some(Ok(genres));
    }

    pub fn fail_genres(&self, error: &str) {
        *self.genres.lock().unwrap() = Some(Err(error.to_string()));
    }

    pub fn fail_toggles(&self, error: &str) {
        *self.toggle_error.lock().unwrap() = Some(error.to_string());
    }

    pub fn queries(&self) -> Vec<ItemQuery> {
        self.queries.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> ItemQuery {
        self.queries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no query dispatched")
    }

    pub fn query_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn genre_calls(&self) -> usize {
        self.genre_calls.load(Ordering::SeqCst)
    }

    pub fn toggles(&self) -> Vec<(ItemId, &'static str, bool)> {
        self.toggles.lock().unwrap().clone()
    }

    fn record_toggle(&self, item_id: &ItemId, what: &'static str, value: bool) -> Result<()> {
        self.toggles
            .lock()
            .unwrap()
            .push((item_id.clone(), what, value));
        match self.toggle_error.lock().unwrap().clone() {
            Some(error) => Err(anyhow!(error)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn fetch_entries(&self, query: &ItemQuery) -> Result<ItemPage> {
        let (index, response) = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.clone());
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(ItemPage::default()));
            (queries.len() - 1, response)
        };

        let gate = self.gates.lock().unwrap().remove(&index);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        response.map_err(|e| anyhow!(e))
    }

    async fn fetch_genres(&self, _section_id: &SectionId) -> Result<Vec<Genre>> {
        self.genre_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.genre_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.genres.lock().unwrap().clone() {
            Some(Ok(genres)) => Ok(genres),
            Some(Err(error)) => Err(anyhow!(error)),
            None => Ok(Vec::new()),
        }
    }

    async fn set_favorite(&self, item_id: &ItemId, favorite: bool) -> Result<()> {
        self.record_toggle(item_id, "favorite", favorite)
    }

    async fn set_played(&self, item_id: &ItemId, played: bool) -> Result<()> {
        self.record_toggle(item_id, "played", played)
    }
}

/// In-memory filter store that counts saves and can be told to fail them.
#[derive(Debug, Default)]
pub struct RecordingFilterStore {
    inner: MemoryFilterStore,
    saves: AtomicUsize,
    fail_saves: Mutex<bool>,
    gates: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
}

impl RecordingFilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_saved(section_id: SectionId, state: FilterState) -> Self {
        Self {
            inner: MemoryFilterStore::new().with_state(section_id, state).await,
            ..Self::default()
        }
    }

    /// Hold the `index`-th save (0-based) until the returned sender fires.
    pub fn hold_save(&self, index: usize) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(index, rx);
        tx
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn saved(&self, section_id: &SectionId) -> Option<FilterState> {
        self.inner.load_filter_state(section_id).await
    }
}

#[async_trait]
impl FilterStore for RecordingFilterStore {
    async fn load_filter_state(&self, section_id: &SectionId) -> Option<FilterState> {
        self.inner.load_filter_state(section_id).await
    }

    async fn save_filter_state(
        &self,
        section_id: &SectionId,
        state: &FilterState,
    ) -> AppResult<()> {
        let index = self.saves.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().remove(&index);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if *self.fail_saves.lock().unwrap() {
            return Err(AppError::Configuration("disk full".to_string()));
        }
        self.inner.save_filter_state(section_id, state).await
    }
}
