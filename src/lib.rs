//! Portable core of the Cuscatlán Pokédex: trainer identity rules, the
//! memoized species catalog and the trainer onboarding form.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod models;
pub mod pokedex;
pub mod trainer;
pub mod traits;

pub use api::PokeApiClient;
pub use catalog::{CatalogStatus, PokemonCatalogCache, SearchMode, SelectionSet};
pub use config::AppConfig;
pub use error::{FetchError, Field, FieldError, FormErrors};
pub use pokedex::Pokedex;
pub use trainer::{TrainerForm, TrainerFormConfig};
pub use traits::{CatalogConfig, CatalogSource};
