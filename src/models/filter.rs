use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::{MAX_PRODUCTION_YEAR, MIN_PRODUCTION_YEAR};

/// Server-side sort keys understood by Jellyfin's item query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortBy {
    #[default]
    SortName,
    CommunityRating,
    CriticRating,
    DateCreated,
    PremiereDate,
    ProductionYear,
    DatePlayed,
    Runtime,
    Random,
}

impl SortBy {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortBy::SortName => "SortName",
            SortBy::CommunityRating => "CommunityRating",
            SortBy::CriticRating => "CriticRating",
            SortBy::DateCreated => "DateCreated",
            SortBy::PremiereDate => "PremiereDate",
            SortBy::ProductionYear => "ProductionYear",
            SortBy::DatePlayed => "DatePlayed",
            SortBy::Runtime => "Runtime",
            SortBy::Random => "Random",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "Ascending",
            SortOrder::Descending => "Descending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WatchedFilter {
    #[default]
    All,
    Watched,
    Unwatched,
}

impl WatchedFilter {
    /// Tri-state `IsPlayed` value; `None` means the parameter is omitted.
    pub fn is_played(&self) -> Option<bool> {
        match self {
            WatchedFilter::All => None,
            WatchedFilter::Watched => Some(true),
            WatchedFilter::Unwatched => Some(false),
        }
    }
}

/// How the grid is drawn. Never affects what is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ViewMode {
    #[default]
    Poster,
    Thumbnail,
}

/// Inclusive production year range. Always ordered and inside
/// `MIN_PRODUCTION_YEAR..=MAX_PRODUCTION_YEAR`, including when read back
/// from a hand-edited config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "YearBounds")]
pub struct YearRange {
    min_year: i32,
    max_year: i32,
}

#[derive(Deserialize)]
struct YearBounds {
    min_year: i32,
    max_year: i32,
}

impl From<YearBounds> for YearRange {
    fn from(bounds: YearBounds) -> Self {
        YearRange::new(bounds.min_year, bounds.max_year)
    }
}

impl YearRange {
    /// Bounds are reordered and clamped to plausible production years.
    pub fn new(a: i32, b: i32) -> Self {
        let a = a.clamp(MIN_PRODUCTION_YEAR, MAX_PRODUCTION_YEAR);
        let b = b.clamp(MIN_PRODUCTION_YEAR, MAX_PRODUCTION_YEAR);
        Self {
            min_year: a.min(b),
            max_year: a.max(b),
        }
    }

    pub fn min_year(&self) -> i32 {
        self.min_year
    }

    pub fn max_year(&self) -> i32 {
        self.max_year
    }

    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.min_year..=self.max_year
    }
}

/// Filter, sort and display selection for one catalog section.
///
/// Treated as a value: callers derive a new state and hand it back whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FilterState {
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_genres: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub selected_parental_ratings: BTreeSet<String>,
    #[serde(default)]
    pub watched_filter: WatchedFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_filter: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default)]
    pub favorites_only: bool,
}

impl FilterState {
    /// Field-by-field comparison against `other` (the newer state).
    pub fn diff(&self, other: &FilterState) -> FilterChanges {
        // Destructured so a new field cannot be added without deciding how it diffs.
        let FilterState {
            sort_by,
            sort_order,
            selected_genres,
            selected_parental_ratings,
            watched_filter,
            rating_filter,
            year_range,
            view_mode,
            favorites_only,
        } = self;

        FilterChanges {
            sort_by: *sort_by != other.sort_by,
            sort_order: *sort_order != other.sort_order,
            genres: *selected_genres != other.selected_genres,
            parental_ratings: *selected_parental_ratings != other.selected_parental_ratings,
            watched: *watched_filter != other.watched_filter,
            rating: *rating_filter != other.rating_filter,
            year_range: *year_range != other.year_range,
            view_mode: *view_mode != other.view_mode,
            favorites_only: *favorites_only != other.favorites_only,
        }
    }

    /// Reset every narrowing filter. Sort and view mode are preferences, not filters.
    pub fn cleared(&self) -> FilterState {
        FilterState {
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            view_mode: self.view_mode,
            ..FilterState::default()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        !self.selected_genres.is_empty()
            || !self.selected_parental_ratings.is_empty()
            || self.watched_filter != WatchedFilter::All
            || self.rating_filter.is_some()
            || self.year_range.is_some()
            || self.favorites_only
    }

    pub fn with_genre_toggled(&self, genre: &str) -> FilterState {
        let mut next = self.clone();
        if !next.selected_genres.remove(genre) {
            next.selected_genres.insert(genre.to_string());
        }
        next
    }

    pub fn with_parental_rating_toggled(&self, rating: &str) -> FilterState {
        let mut next = self.clone();
        if !next.selected_parental_ratings.remove(rating) {
            next.selected_parental_ratings.insert(rating.to_string());
        }
        next
    }
}

/// Which fields differ between two filter states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterChanges {
    pub sort_by: bool,
    pub sort_order: bool,
    pub genres: bool,
    pub parental_ratings: bool,
    pub watched: bool,
    pub rating: bool,
    pub year_range: bool,
    pub view_mode: bool,
    pub favorites_only: bool,
}

impl FilterChanges {
    pub fn is_empty(&self) -> bool {
        !self.requires_requery() && !self.view_mode
    }

    /// True when anything other than the display mode changed.
    pub fn requires_requery(&self) -> bool {
        self.sort_by
            || self.sort_order
            || self.genres
            || self.parental_ratings
            || self.watched
            || self.rating
            || self.year_range
            || self.favorites_only
    }

    /// Names of the changed fields, for logging.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        [
            (self.sort_by, "sort_by"),
            (self.sort_order, "sort_order"),
            (self.genres, "genres"),
            (self.parental_ratings, "parental_ratings"),
            (self.watched, "watched"),
            (self.rating, "rating"),
            (self.year_range, "year_range"),
            (self.view_mode, "view_mode"),
            (self.favorites_only, "favorites_only"),
        ]
        .into_iter()
        .filter_map(|(changed, name)| changed.then_some(name))
        .collect()
    }
}
