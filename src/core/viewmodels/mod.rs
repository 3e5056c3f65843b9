pub mod library_query_state;
pub mod property;

pub use library_query_state::{LibraryQueryOptions, LibraryQueryState, UserFlag};
pub use property::{Property, PropertySubscriber};

#[async_trait::async_trait]
pub trait ViewModel: Send + Sync {
    async fn refresh(&self);

    fn dispose(&self);
}
