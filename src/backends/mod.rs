pub mod jellyfin;
pub mod traits;

pub use jellyfin::{JellyfinApi, JellyfinCatalog};
pub use traits::{CatalogClient, ItemPage, ItemQuery, NamePrefix};
