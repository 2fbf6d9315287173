//! HTTP client for the PokeAPI REST endpoints

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::FetchError;
use crate::models::payload::{PokemonPayload, SpeciesPage, SpeciesPayload};
use crate::traits::CatalogSource;

const USER_AGENT: &str = concat!("pokedex-cuscatlan/", env!("CARGO_PKG_VERSION"));

/// reqwest-backed [`CatalogSource`]
#[derive(Clone)]
pub struct PokeApiClient {
    client: Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing client (and its connection pool)
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn species_page_url(&self) -> String {
        format!("{}/pokemon", self.base_url)
    }

    pub fn pokemon_url(&self, id: u32) -> String {
        format!("{}/pokemon/{id}", self.base_url)
    }

    pub fn species_url(&self, id: u32) -> String {
        format!("{}/pokemon-species/{id}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, u32)],
        resource: &'static str,
        key: String,
    ) -> Result<T, FetchError> {
        debug!("GET {}", url);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { resource, key });
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CatalogSource for PokeApiClient {
    async fn fetch_species_page(&self, limit: u32, offset: u32) -> Result<SpeciesPage, FetchError> {
        info!("Fetching species list (limit {}, offset {})", limit, offset);

        let url = self.species_page_url();
        self.get_json(
            &url,
            &[("limit", limit), ("offset", offset)],
            "species page",
            format!("{offset}+{limit}"),
        )
        .await
    }

    async fn fetch_pokemon(&self, id: u32) -> Result<PokemonPayload, FetchError> {
        let url = self.pokemon_url(id);
        self.get_json(&url, &[], "pokemon", id.to_string()).await
    }

    async fn fetch_species(&self, id: u32) -> Result<SpeciesPayload, FetchError> {
        let url = self.species_url(id);
        self.get_json(&url, &[], "species", id.to_string()).await
    }
}
