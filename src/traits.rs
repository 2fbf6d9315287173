//! Traits and configuration for the remote species catalog

use async_trait::async_trait;

use crate::catalog::SearchMode;
use crate::error::FetchError;
use crate::models::StatScale;
use crate::models::payload::{PokemonPayload, SpeciesPage, SpeciesPayload};

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2/";
pub const DEFAULT_PAGE_SIZE: u32 = 151;
pub const DEFAULT_SELECTION_CAPACITY: usize = 3;

/// Configuration for a catalog cache
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Base URL of the JSON API, with or without a trailing slash
    pub base_url: String,
    /// Number of species requested by the single list fetch
    pub page_size: u32,
    /// Offset of the list fetch
    pub page_offset: u32,
    /// Maximum number of simultaneously selected species
    pub selection_capacity: usize,
    /// How `search` matches numeric queries against ids
    pub search_mode: SearchMode,
    /// Stat ceilings for progress bars
    pub stat_scale: StatScale,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            page_offset: 0,
            selection_capacity: DEFAULT_SELECTION_CAPACITY,
            search_mode: SearchMode::default(),
            stat_scale: StatScale::default(),
        }
    }
}

/// Source of raw catalog payloads
///
/// The HTTP client is the production implementation; the cache only ever
/// talks to this trait.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch one page of the species list
    ///
    /// # Arguments
    /// * `limit` - Page size
    /// * `offset` - Index of the first entry
    async fn fetch_species_page(&self, limit: u32, offset: u32) -> Result<SpeciesPage, FetchError>;

    /// Fetch the pokemon record (sprites, stats, types) for `id`
    async fn fetch_pokemon(&self, id: u32) -> Result<PokemonPayload, FetchError>;

    /// Fetch the species record (flavor text) for `id`
    async fn fetch_species(&self, id: u32) -> Result<SpeciesPayload, FetchError>;
}
