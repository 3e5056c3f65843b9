pub mod viewmodels;

pub use viewmodels::{LibraryQueryOptions, LibraryQueryState, ViewModel};
