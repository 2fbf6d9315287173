use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{error, info, warn};

use crate::api::PokeApiClient;
use crate::catalog::PokemonCatalogCache;
use crate::config::AppConfig;
use crate::error::FormErrors;
use crate::models::{SpeciesSummary, Trainer};
use crate::trainer::TrainerForm;
use crate::traits::CatalogSource;

/// Outcome of a detail prefetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchReport {
    pub loaded: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct Pokedex {
    catalog: PokemonCatalogCache,
    config: Arc<AppConfig>,
}

impl Pokedex {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = PokeApiClient::new(&config.catalog.base_url)
            .context("failed to build the HTTP client")?;
        Ok(Self::with_source(Arc::new(client), config))
    }

    pub fn with_source(source: Arc<dyn CatalogSource>, config: AppConfig) -> Self {
        let catalog = PokemonCatalogCache::new(source, config.catalog.clone());
        Self {
            catalog,
            config: Arc::new(config),
        }
    }

    pub fn catalog(&self) -> &PokemonCatalogCache {
        &self.catalog
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// A fresh form using the configured rules.
    pub fn trainer_form(&self) -> TrainerForm {
        TrainerForm::new(self.config.form.clone())
    }

    /// Loads the species list, retrying once.
    pub async fn load_catalog(&self) -> Result<Arc<[SpeciesSummary]>> {
        let list = match self.catalog.species_list().await {
            Ok(list) => list,
            Err(e) => {
                warn!("Species list failed, retrying once: {}", e);
                self.catalog
                    .retry_species_list()
                    .await
                    .context("failed to load the species list")?
            }
        };

        info!("Catalog ready with {} species", list.len());
        Ok(list)
    }

    /// Warms the detail cache for `ids` concurrently.
    pub async fn prefetch_details(&self, ids: &[u32]) -> PrefetchReport {
        let results = join_all(ids.iter().map(|&id| async move {
            (id, self.catalog.species_detail(id).await)
        }))
        .await;

        let mut report = PrefetchReport::default();
        for (id, result) in results {
            match result {
                Ok(detail) => {
                    info!(
                        "#{:03} {} [{}] total {}",
                        detail.id,
                        detail.display_name,
                        detail.types.join("/"),
                        detail.stats.total()
                    );
                    report.loaded += 1;
                }
                Err(e) => {
                    error!("Failed to load species {}: {}", id, e);
                    report.failed += 1;
                }
            }
        }

        if report.failed > 0 {
            warn!("Prefetched {} details, {} failed", report.loaded, report.failed);
        } else {
            info!("Prefetched {} details", report.loaded);
        }
        report
    }

    /// Copies the current selection into `form` and submits it.
    pub fn register_trainer(&self, form: &mut TrainerForm) -> Result<Trainer, FormErrors> {
        form.update_selected_species(self.catalog.selected_details());
        form.submit()
    }
}
