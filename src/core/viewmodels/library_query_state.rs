use anyhow::Result;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{Property, PropertySubscriber, ViewModel};
use crate::backends::traits::{CatalogClient, ItemPage, ItemQuery};
use crate::config::LibraryConfig;
use crate::constants::{DEFAULT_PAGE_SIZE, NON_LETTER};
use crate::models::{
    CatalogEntry, FilterState, Genre, ItemId, ItemKind, SectionId, SortBy, SortOrder, UserState,
    ViewMode, ViewState, WatchedFilter, YearRange,
};
use crate::services::FilterStore;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct LibraryQueryOptions {
    pub page_size: u32,
    /// Restricts results to these kinds; empty means whatever the section holds.
    pub include_item_types: Vec<ItemKind>,
}

impl Default for LibraryQueryOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            include_item_types: Vec::new(),
        }
    }
}

impl LibraryQueryOptions {
    pub fn from_config(config: &LibraryConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_item_types(mut self, kinds: Vec<ItemKind>) -> Self {
        self.include_item_types = kinds;
        self
    }
}

/// Per-user flag that can be flipped optimistically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFlag {
    Favorite,
    Played,
}

impl UserFlag {
    fn get(&self, state: &UserState) -> bool {
        match self {
            UserFlag::Favorite => state.is_favorite,
            UserFlag::Played => state.played,
        }
    }

    fn set(&self, state: &mut UserState, value: bool) {
        match self {
            UserFlag::Favorite => state.is_favorite = value,
            UserFlag::Played => state.played = value,
        }
    }
}

/// First phase of an optimistic update. Holds the value seen before the
/// tentative write so a failed server call restores exactly that value.
#[derive(Debug, Clone)]
struct Tentative {
    item_id: ItemId,
    flag: UserFlag,
    previous: bool,
    applied: bool,
}

impl Tentative {
    fn begin(state: &ViewState, item_id: &ItemId, flag: UserFlag) -> Option<Self> {
        let item = state.item(item_id)?;
        let previous = flag.get(&item.user_state);
        Some(Self {
            item_id: item_id.clone(),
            flag,
            previous,
            applied: !previous,
        })
    }

    fn apply(&self, state: &mut ViewState) {
        self.write(state, self.applied);
    }

    fn rollback(&self, state: &mut ViewState) {
        self.write(state, self.previous);
    }

    fn write(&self, state: &mut ViewState, value: bool) {
        if let Some(item) = state.items.iter_mut().find(|it| it.id == self.item_id) {
            self.flag.set(&mut item.user_state, value);
        }
    }
}

#[derive(Debug, Default)]
struct QueryTracker {
    section_id: Option<SectionId>,
}

/// A dispatched first-page query and the generation it belongs to.
#[derive(Debug)]
struct PendingQuery {
    generation: u64,
    query: ItemQuery,
    started: Instant,
}

/// Filter, sort, letter and paging state for one catalog section.
///
/// All transitions are serialized through an internal lock and published as
/// whole [`ViewState`] snapshots. Every full query (initialize, filter change,
/// letter jump, refresh) starts a new generation; responses from an older
/// generation are dropped on arrival.
pub struct LibraryQueryState {
    catalog: Arc<dyn CatalogClient>,
    filter_store: Arc<dyn FilterStore>,
    options: LibraryQueryOptions,
    view_state: Property<ViewState>,
    tracker: Mutex<QueryTracker>,
    generation: AtomicU64,
    // Filter saves are numbered in transition order; the store only ever
    // moves forward to a newer number.
    save_sequence: AtomicU64,
    last_saved: Mutex<u64>,
    disposed: AtomicBool,
}

impl std::fmt::Debug for LibraryQueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryQueryState")
            .field("options", &self.options)
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl LibraryQueryState {
    pub fn new(
        catalog: Arc<dyn CatalogClient>,
        filter_store: Arc<dyn FilterStore>,
        options: LibraryQueryOptions,
    ) -> Self {
        Self {
            catalog,
            filter_store,
            options,
            view_state: Property::new(ViewState::default(), "view_state"),
            tracker: Mutex::new(QueryTracker::default()),
            generation: AtomicU64::new(0),
            save_sequence: AtomicU64::new(0),
            last_saved: Mutex::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> ViewState {
        self.view_state.get()
    }

    pub fn subscribe(&self) -> PropertySubscriber<ViewState> {
        self.view_state.subscribe()
    }

    pub fn filter_state(&self) -> FilterState {
        self.view_state.get().filter_state
    }

    pub async fn section_id(&self) -> Option<SectionId> {
        self.tracker.lock().await.section_id.clone()
    }

    /// Bind to `section_id`, restore its saved filters and load the first page.
    pub async fn initialize(&self, section_id: SectionId) {
        if self.is_disposed() {
            return;
        }
        info!("Initializing library state for section {}", section_id);

        let filter_state = self
            .filter_store
            .load_filter_state(&section_id)
            .await
            .unwrap_or_default();

        let pending = {
            let mut tracker = self.tracker.lock().await;
            tracker.section_id = Some(section_id.clone());
            self.view_state.set(ViewState {
                filter_state,
                ..ViewState::default()
            });
            self.begin_full_query(&section_id, |_| {})
        };

        // Each result is published as soon as it arrives; a slow genre list
        // never holds back the first page.
        let entries = async {
            let result = self.catalog.fetch_entries(&pending.query).await;
            self.finish_full_query(&pending, result).await;
        };
        let genres = async {
            let result = self.catalog.fetch_genres(&section_id).await;
            self.apply_genres(pending.generation, &section_id, result)
                .await;
        };
        tokio::join!(entries, genres);
    }

    /// Fetch the next page and append it. No-op unless `can_load_more()`.
    pub async fn load_more(&self) {
        if self.is_disposed() {
            return;
        }

        let (generation, query) = {
            let tracker = self.tracker.lock().await;
            let Some(section_id) = tracker.section_id.clone() else {
                debug!("load_more called before initialize");
                return;
            };

            let current = self.view_state.get();
            if !current.can_load_more() {
                debug!(
                    "load_more skipped: {} of {} loaded, loading={}, loading_more={}",
                    current.items.len(),
                    current.total_record_count,
                    current.is_loading,
                    current.is_loading_more
                );
                return;
            }

            let query = ItemQuery::from_filter(
                &section_id,
                &current.filter_state,
                current.current_letter,
                current.items.len(),
                self.options.page_size,
                &self.options.include_item_types,
            );
            self.view_state.update(|state| {
                state.is_loading_more = true;
                state.error = None;
            });
            (self.generation.load(Ordering::SeqCst), query)
        };

        debug!(
            "Loading page at {} for section {}",
            query.start_index, query.section_id
        );
        let result = self.catalog.fetch_entries(&query).await;

        let _tracker = self.tracker.lock().await;
        if !self.is_current(generation) {
            debug!(
                "Discarding stale page at {} (generation {})",
                query.start_index, generation
            );
            return;
        }

        match result {
            Ok(page) => {
                self.view_state.update(|state| {
                    let appended = append_unique(&mut state.items, page.entries);
                    state.total_record_count = page.total_record_count;
                    state.is_loading_more = false;
                    debug!(
                        "Appended {} items, {} of {} loaded",
                        appended,
                        state.items.len(),
                        state.total_record_count
                    );
                });
            }
            Err(e) => {
                error!("Failed to load more items: {}", e);
                self.view_state.update(|state| {
                    state.error = Some(AppError::query_failed(&e).to_string());
                    state.is_loading_more = false;
                });
            }
        }
    }

    /// Apply `transform` to the current filters. Re-queries from the first page
    /// unless nothing but the view mode changed.
    pub async fn update_filter<F>(&self, transform: F)
    where
        F: FnOnce(&FilterState) -> FilterState,
    {
        if self.is_disposed() {
            return;
        }

        let (section_id, candidate, save_sequence, pending) = {
            let tracker = self.tracker.lock().await;
            let Some(section_id) = tracker.section_id.clone() else {
                warn!("Filter change ignored, no section initialized");
                return;
            };

            let current = self.view_state.get().filter_state;
            let mut candidate = transform(&current);
            if candidate.rating_filter.is_some_and(|rating| !rating.is_finite()) {
                warn!("Dropping non-finite rating filter");
                candidate.rating_filter = None;
            }
            let changes = current.diff(&candidate);
            if changes.is_empty() {
                debug!("Filter unchanged, skipping query");
                return;
            }
            debug!("Filter changed: {:?}", changes.changed_fields());
            let save_sequence = self.save_sequence.fetch_add(1, Ordering::SeqCst) + 1;

            if changes.requires_requery() {
                let next = candidate.clone();
                let pending = self.begin_full_query(&section_id, move |state| {
                    state.filter_state = next;
                    state.current_letter = None;
                });
                (section_id, candidate, save_sequence, Some(pending))
            } else {
                let next = candidate.clone();
                self.view_state.update(move |state| state.filter_state = next);
                (section_id, candidate, save_sequence, None)
            }
        };

        self.persist(&section_id, &candidate, save_sequence).await;

        if let Some(pending) = pending {
            let result = self.catalog.fetch_entries(&pending.query).await;
            self.finish_full_query(&pending, result).await;
        }
    }

    pub async fn update_sort(&self, sort_by: SortBy, sort_order: SortOrder) {
        self.update_filter(|current| FilterState {
            sort_by,
            sort_order,
            ..current.clone()
        })
        .await
    }

    pub async fn toggle_genre(&self, genre: &str) {
        self.update_filter(|current| current.with_genre_toggled(genre))
            .await
    }

    pub async fn toggle_parental_rating(&self, rating: &str) {
        self.update_filter(|current| current.with_parental_rating_toggled(rating))
            .await
    }

    pub async fn update_watched_filter(&self, watched_filter: WatchedFilter) {
        self.update_filter(|current| FilterState {
            watched_filter,
            ..current.clone()
        })
        .await
    }

    /// Minimum community rating. Non-finite values are rejected.
    pub async fn update_rating_filter(&self, rating_filter: Option<f32>) {
        if rating_filter.is_some_and(|rating| !rating.is_finite()) {
            warn!("Ignoring non-finite rating filter {:?}", rating_filter);
            return;
        }
        self.update_filter(|current| FilterState {
            rating_filter,
            ..current.clone()
        })
        .await
    }

    pub async fn update_year_range(&self, year_range: Option<YearRange>) {
        self.update_filter(|current| FilterState {
            year_range,
            ..current.clone()
        })
        .await
    }

    pub async fn toggle_favorites_only(&self) {
        self.update_filter(|current| FilterState {
            favorites_only: !current.favorites_only,
            ..current.clone()
        })
        .await
    }

    /// Replace every filter at once, e.g. when a filter dialog is confirmed.
    /// The current view mode is kept.
    pub async fn apply_filters(&self, filters: FilterState) {
        self.update_filter(move |current| FilterState {
            view_mode: current.view_mode,
            ..filters
        })
        .await
    }

    pub async fn clear_filters(&self) {
        self.update_filter(FilterState::cleared).await
    }

    pub async fn set_view_mode(&self, view_mode: ViewMode) {
        self.update_filter(|current| FilterState {
            view_mode,
            ..current.clone()
        })
        .await
    }

    /// Show only titles starting with `letter` (`'#'` for digits and symbols).
    /// Always re-queries.
    pub async fn jump_to_letter(&self, letter: char) {
        let letter = if letter == NON_LETTER {
            NON_LETTER
        } else {
            letter.to_ascii_uppercase()
        };
        self.requery_with_letter(Some(letter)).await
    }

    pub async fn clear_letter_filter(&self) {
        self.requery_with_letter(None).await
    }

    /// Reload from the first page with the current filters. Also the retry
    /// path after an error.
    pub async fn refresh(&self) {
        if self.is_disposed() {
            return;
        }

        let pending = {
            let tracker = self.tracker.lock().await;
            let Some(section_id) = tracker.section_id.clone() else {
                debug!("refresh called before initialize");
                return;
            };
            self.begin_full_query(&section_id, |_| {})
        };

        let result = self.catalog.fetch_entries(&pending.query).await;
        self.finish_full_query(&pending, result).await;
    }

    /// Random id among the loaded items only; unloaded pages are not considered.
    pub fn shuffle_item_id(&self) -> Option<ItemId> {
        self.view_state
            .get()
            .items
            .choose(&mut rand::rng())
            .map(|item| item.id.clone())
    }

    /// Flip the favorite flag optimistically. Returns the new value, or the
    /// error after the flag has been put back.
    pub async fn toggle_favorite(&self, item_id: &ItemId) -> AppResult<bool> {
        self.toggle_user_flag(item_id, UserFlag::Favorite).await
    }

    pub async fn toggle_played(&self, item_id: &ItemId) -> AppResult<bool> {
        self.toggle_user_flag(item_id, UserFlag::Played).await
    }

    async fn toggle_user_flag(&self, item_id: &ItemId, flag: UserFlag) -> AppResult<bool> {
        let tentative = {
            let _tracker = self.tracker.lock().await;
            let current = self.view_state.get();
            let tentative = Tentative::begin(&current, item_id, flag)
                .ok_or_else(|| AppError::ItemNotFound(item_id.to_string()))?;
            self.view_state.update(|state| tentative.apply(state));
            tentative
        };

        let result = match flag {
            UserFlag::Favorite => self.catalog.set_favorite(item_id, tentative.applied).await,
            UserFlag::Played => self.catalog.set_played(item_id, tentative.applied).await,
        };

        match result {
            Ok(()) => Ok(tentative.applied),
            Err(e) => {
                warn!(
                    "Failed to set {:?}={} on {}, rolling back: {}",
                    flag, tentative.applied, item_id, e
                );
                let _tracker = self.tracker.lock().await;
                self.view_state.update(|state| tentative.rollback(state));
                Err(AppError::query_failed(e))
            }
        }
    }

    async fn requery_with_letter(&self, letter: Option<char>) {
        if self.is_disposed() {
            return;
        }

        let pending = {
            let tracker = self.tracker.lock().await;
            let Some(section_id) = tracker.section_id.clone() else {
                warn!("Letter filter ignored, no section initialized");
                return;
            };
            info!("Letter filter for {} set to {:?}", section_id, letter);
            self.begin_full_query(&section_id, move |state| {
                state.current_letter = letter;
                state.items.clear();
                state.total_record_count = 0;
            })
        };

        let result = self.catalog.fetch_entries(&pending.query).await;
        self.finish_full_query(&pending, result).await;
    }

    /// Start a new generation: apply `prepare`, mark loading, clear the error
    /// and build the first-page query. Caller holds the tracker lock.
    fn begin_full_query<F>(&self, section_id: &SectionId, prepare: F) -> PendingQuery
    where
        F: FnOnce(&mut ViewState),
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut next = self.view_state.get();
        prepare(&mut next);
        next.is_loading = true;
        next.is_loading_more = false;
        next.error = None;

        let query = ItemQuery::from_filter(
            section_id,
            &next.filter_state,
            next.current_letter,
            0,
            self.options.page_size,
            &self.options.include_item_types,
        );
        self.view_state.set(next);

        debug!(
            "Dispatching query generation {} for section {}",
            generation, section_id
        );
        PendingQuery {
            generation,
            query,
            started: Instant::now(),
        }
    }

    async fn finish_full_query(&self, pending: &PendingQuery, result: Result<ItemPage>) {
        let PendingQuery {
            generation,
            ref query,
            started,
        } = *pending;
        let _tracker = self.tracker.lock().await;
        if !self.is_current(generation) {
            debug!(
                "Discarding stale response for section {} (generation {})",
                query.section_id, generation
            );
            return;
        }

        match result {
            Ok(page) => {
                self.view_state.update(|state| {
                    state.items.clear();
                    append_unique(&mut state.items, page.entries);
                    state.total_record_count = page.total_record_count;
                    state.is_loading = false;
                });
                debug!(
                    "Applied generation {} for section {} in {:?}",
                    generation,
                    query.section_id,
                    started.elapsed()
                );
            }
            Err(e) => {
                error!("Failed to load items for {}: {}", query.section_id, e);
                self.view_state.update(|state| {
                    state.error = Some(AppError::query_failed(&e).to_string());
                    state.is_loading = false;
                });
            }
        }
    }

    // Genre failures leave the list as it was; they never reach `error`.
    async fn apply_genres(&self, generation: u64, section_id: &SectionId, genres: Result<Vec<Genre>>) {
        let tracker = self.tracker.lock().await;
        if tracker.section_id.as_ref() != Some(section_id) || self.is_disposed() {
            return;
        }

        match genres {
            Ok(genres) => {
                debug!(
                    "Loaded {} genres for {} (generation {})",
                    genres.len(),
                    section_id,
                    generation
                );
                self.view_state
                    .update(move |state| state.available_genres = genres);
            }
            Err(e) => {
                warn!("Ignoring genre load failure for {}: {}", section_id, e);
            }
        }
    }

    async fn persist(&self, section_id: &SectionId, state: &FilterState, sequence: u64) {
        let mut last_saved = self.last_saved.lock().await;
        if *last_saved > sequence {
            debug!(
                "Skipping filter save {} for {}, {} already stored",
                sequence, section_id, *last_saved
            );
            return;
        }

        if let Err(e) = self
            .filter_store
            .save_filter_state(section_id, state)
            .await
        {
            warn!("Failed to persist filters for {}: {}", section_id, e);
        }
        *last_saved = sequence;
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_disposed() && self.generation.load(Ordering::SeqCst) == generation
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

/// Append displayable entries whose id is not present yet. Returns how many
/// were added.
fn append_unique(items: &mut Vec<CatalogEntry>, entries: Vec<CatalogEntry>) -> usize {
    let mut seen: HashSet<ItemId> = items.iter().map(|item| item.id.clone()).collect();
    let before = items.len();
    items.extend(
        entries
            .into_iter()
            .filter(CatalogEntry::is_displayable)
            .filter(|entry| seen.insert(entry.id.clone())),
    );
    items.len() - before
}

#[async_trait::async_trait]
impl ViewModel for LibraryQueryState {
    async fn refresh(&self) {
        LibraryQueryState::refresh(self).await
    }

    /// Drop interest in every in-flight query. Later actions are ignored.
    fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        debug!("Library state disposed");
    }
}
