use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use reel_library::models::SectionId;
use reel_library::{
    Config, ConfigFilterStore, JellyfinCatalog, LibraryQueryOptions, LibraryQueryState, ViewModel,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reel_library=debug")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let section_id = args
        .next()
        .map(SectionId::new)
        .ok_or_else(|| anyhow!("usage: reel-library <section-id> [letter]"))?;
    let letter = args.next().and_then(|arg| arg.chars().next());

    info!("Starting reel-library for section {}", section_id);

    let config_path = Config::config_path()?;
    let config = Config::load_from(&config_path)?;
    let catalog = JellyfinCatalog::from_config(&config.jellyfin)
        .context("Jellyfin connection is not configured")?;
    let options = LibraryQueryOptions::from_config(&config.library);
    let store = ConfigFilterStore::new(Arc::new(RwLock::new(config)), config_path);

    let library = LibraryQueryState::new(Arc::new(catalog), Arc::new(store), options);
    library.initialize(section_id).await;
    if let Some(letter) = letter {
        library.jump_to_letter(letter).await;
    }

    let state = library.snapshot();
    if let Some(error) = &state.error {
        warn!("Query failed: {}", error);
    }
    for item in &state.items {
        println!(
            "{}\t{}\t{}",
            item.id,
            item.name,
            item.production_year
                .map(|year| year.to_string())
                .unwrap_or_default()
        );
    }
    info!(
        "Showing {} of {} items ({} genres available)",
        state.items.len(),
        state.total_record_count,
        state.available_genres.len()
    );

    library.dispose();
    Ok(())
}
