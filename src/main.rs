use anyhow::Result;
use tracing::{error, info};

use pokedex_cuscatlan::{AppConfig, Pokedex};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    info!("Starting Pokédex Cuscatlán");

    let config = AppConfig::from_env()?;
    info!(
        "Using {} (page size {}, search mode {:?})",
        config.catalog.base_url, config.catalog.page_size, config.catalog.search_mode
    );

    let pokedex = Pokedex::new(config)?;

    let list = match pokedex.load_catalog().await {
        Ok(list) => list,
        Err(e) => {
            error!("Could not load the catalog: {:#}", e);
            return Err(e);
        }
    };

    let ids: Vec<u32> = list
        .iter()
        .take(pokedex.config().prefetch)
        .map(|summary| summary.id)
        .collect();
    let report = pokedex.prefetch_details(&ids).await;

    info!(
        "Done: {} species listed, {} details cached, {} failed",
        list.len(),
        report.loaded,
        report.failed
    );

    Ok(())
}
