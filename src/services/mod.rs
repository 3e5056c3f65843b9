pub mod filter_store;

pub use filter_store::{ConfigFilterStore, FilterStore, MemoryFilterStore};
