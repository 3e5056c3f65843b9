// Library paging and query constants

/// Items requested per page when the config does not override it.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Sentinel letter for titles that do not start with A-Z.
pub const NON_LETTER: char = '#';

/// Jellyfin sorts titles lexically, so "less than A" selects digits and symbols.
pub const NON_LETTER_UPPER_BOUND: &str = "A";

/// Production years outside this window are clamped when building a range.
pub const MIN_PRODUCTION_YEAR: i32 = 1870;
pub const MAX_PRODUCTION_YEAR: i32 = 2200;

/// Fields requested with every item query. Image tags and media sources
/// feed the placeholder filter.
pub const ITEM_FIELDS: &str = "PrimaryImageAspectRatio,MediaSources,Genres,OfficialRating,ChildCount";

// === HTTP ===
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const JELLYFIN_CLIENT_NAME: &str = "Reel";
pub const JELLYFIN_VERSION: &str = env!("CARGO_PKG_VERSION");
