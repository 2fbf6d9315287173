//! Environment-driven settings for the binary.
//!
//! The library never reads the environment itself; `AppConfig::from_env` is
//! only called from `main` after `.env` has been loaded.

use std::str::FromStr;

use anyhow::{Context, Result, anyhow};

use crate::catalog::SearchMode;
use crate::identity::IdentityRules;
use crate::traits::CatalogConfig;
use crate::trainer::TrainerFormConfig;

pub const DEFAULT_PREFETCH: usize = 6;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub form: TrainerFormConfig,
    /// How many leading details to warm after the list loads.
    pub prefetch: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        let catalog = CatalogConfig::default();
        let form = TrainerFormConfig {
            required_species: catalog.selection_capacity,
            ..TrainerFormConfig::default()
        };
        Self {
            catalog,
            form,
            prefetch: DEFAULT_PREFETCH,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset or blank keys keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get("POKEDEX_API_BASE_URL") {
            config.catalog.base_url = base_url.trim().to_string();
        }
        if let Some(value) = get("POKEDEX_PAGE_SIZE") {
            config.catalog.page_size = parse("POKEDEX_PAGE_SIZE", &value)?;
        }
        if let Some(value) = get("POKEDEX_SELECTION_CAPACITY") {
            let capacity = parse("POKEDEX_SELECTION_CAPACITY", &value)?;
            config.catalog.selection_capacity = capacity;
            config.form.required_species = capacity;
        }
        if let Some(value) = get("POKEDEX_SEARCH_MODE") {
            config.catalog.search_mode = value
                .parse::<SearchMode>()
                .map_err(|err| anyhow!(err))
                .context("invalid POKEDEX_SEARCH_MODE")?;
        }
        if let Some(value) = get("POKEDEX_CARNET_MIN_LENGTH") {
            config.form.identity = IdentityRules {
                carnet_min_len: parse("POKEDEX_CARNET_MIN_LENGTH", &value)?,
                ..config.form.identity
            };
        }
        if let Some(value) = get("POKEDEX_PHOTO_REQUIRED") {
            config.form.photo_required = parse("POKEDEX_PHOTO_REQUIRED", &value)?;
        }
        if let Some(value) = get("POKEDEX_PREFETCH") {
            config.prefetch = parse("POKEDEX_PREFETCH", &value)?;
        }

        if config.catalog.selection_capacity == 0 {
            return Err(anyhow!("POKEDEX_SELECTION_CAPACITY must be at least 1"));
        }
        if config.form.identity.carnet_min_len > config.form.identity.carnet_max_len {
            return Err(anyhow!(
                "POKEDEX_CARNET_MIN_LENGTH must not exceed {}",
                config.form.identity.carnet_max_len
            ));
        }

        Ok(config)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .to_ascii_lowercase()
        .parse()
        .with_context(|| format!("invalid {key}: {value:?}"))
}
