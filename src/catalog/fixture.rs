//! In-process [`CatalogSource`] for tests: counts requests, can hold them
//! behind a gate and can be told to fail.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Semaphore;

use crate::error::FetchError;
use crate::models::payload::{PokemonPayload, SpeciesPage, SpeciesPayload};
use crate::traits::CatalogSource;

const NAMES: [&str; 26] = [
    "bulbasaur",
    "ivysaur",
    "venusaur",
    "charmander",
    "charmeleon",
    "charizard",
    "squirtle",
    "wartortle",
    "blastoise",
    "caterpie",
    "metapod",
    "butterfree",
    "weedle",
    "kakuna",
    "beedrill",
    "pidgey",
    "pidgeotto",
    "pidgeot",
    "rattata",
    "raticate",
    "spearow",
    "fearow",
    "ekans",
    "arbok",
    "pikachu",
    "raichu",
];

/// Real names for the first ids; letters-only placeholders after that so
/// numeric searches only ever match on ids.
pub(crate) fn species_name(id: u32) -> String {
    usize::try_from(id)
        .ok()
        .and_then(|id| NAMES.get(id.wrapping_sub(1)))
        .map_or_else(|| placeholder_name(id), |name| (*name).to_string())
}

fn placeholder_name(id: u32) -> String {
    let letters: String = id
        .to_string()
        .bytes()
        .map(|digit| char::from(b'a' + (digit - b'0')))
        .collect();
    format!("mon-{letters}")
}

pub(crate) struct FixtureSource {
    species_count: u32,
    list_requests: AtomicUsize,
    pokemon_requests: Mutex<HashMap<u32, usize>>,
    species_requests: AtomicUsize,
    failing_lists: AtomicUsize,
    failing_pokemon: Mutex<HashMap<u32, usize>>,
    failing_species: AtomicBool,
    panicking_pokemon: Mutex<HashSet<u32>>,
    gate: Option<Semaphore>,
}

impl FixtureSource {
    pub(crate) fn new(species_count: u32) -> Self {
        Self {
            species_count,
            list_requests: AtomicUsize::new(0),
            pokemon_requests: Mutex::new(HashMap::new()),
            species_requests: AtomicUsize::new(0),
            failing_lists: AtomicUsize::new(0),
            failing_pokemon: Mutex::new(HashMap::new()),
            failing_species: AtomicBool::new(false),
            panicking_pokemon: Mutex::new(HashSet::new()),
            gate: None,
        }
    }

    /// Every request blocks until [`FixtureSource::release`] is called.
    pub(crate) fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(64);
        }
    }

    pub(crate) fn fail_next_lists(&self, count: usize) {
        self.failing_lists.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_next_pokemon(&self, id: u32, count: usize) {
        self.failing_pokemon.lock().unwrap().insert(id, count);
    }

    /// The next pokemon request for `id` panics instead of returning.
    pub(crate) fn panic_next_pokemon(&self, id: u32) {
        self.panicking_pokemon.lock().unwrap().insert(id);
    }

    pub(crate) fn fail_species(&self, fail: bool) {
        self.failing_species.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn list_requests(&self) -> usize {
        self.list_requests.load(Ordering::SeqCst)
    }

    pub(crate) fn pokemon_requests(&self, id: u32) -> usize {
        self.pokemon_requests
            .lock()
            .unwrap()
            .get(&id)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn species_requests(&self) -> usize {
        self.species_requests.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl CatalogSource for FixtureSource {
    async fn fetch_species_page(&self, limit: u32, offset: u32) -> Result<SpeciesPage, FetchError> {
        self.list_requests.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;

        if Self::take_failure(&self.failing_lists) {
            return Err(FetchError::Network("connection reset".to_string()));
        }

        let last = (offset + limit).min(self.species_count);
        let results: Vec<_> = (offset + 1..=last)
            .map(|id| {
                json!({
                    "name": species_name(id),
                    "url": format!("https://pokeapi.co/api/v2/pokemon/{id}/"),
                })
            })
            .collect();

        Ok(serde_json::from_value(json!({
            "count": self.species_count,
            "next": null,
            "previous": null,
            "results": results,
        }))?)
    }

    async fn fetch_pokemon(&self, id: u32) -> Result<PokemonPayload, FetchError> {
        *self.pokemon_requests.lock().unwrap().entry(id).or_default() += 1;
        self.pass_gate().await;

        {
            let mut failing = self.failing_pokemon.lock().unwrap();
            if let Some(remaining) = failing.get_mut(&id).filter(|n| **n > 0) {
                *remaining -= 1;
                return Err(FetchError::Status {
                    status: 503,
                    url: format!("https://pokeapi.co/api/v2/pokemon/{id}"),
                });
            }
        }

        let panics = self.panicking_pokemon.lock().unwrap().remove(&id);
        if panics {
            panic!("pokemon {id} payload handler crashed");
        }

        if id == 0 || id > self.species_count {
            return Err(FetchError::NotFound {
                resource: "pokemon",
                key: id.to_string(),
            });
        }

        let payload = if id == 1 {
            json!({
                "id": 1,
                "name": "bulbasaur",
                "height": 7,
                "weight": 69,
                "sprites": {
                    "front_default": "https://img/front/1.png",
                    "other": { "home": { "front_default": "https://img/home/1.png" } }
                },
                "stats": [
                    { "base_stat": 45, "stat": { "name": "hp" } },
                    { "base_stat": 49, "stat": { "name": "attack" } },
                    { "base_stat": 49, "stat": { "name": "defense" } },
                    { "base_stat": 65, "stat": { "name": "special-attack" } },
                    { "base_stat": 65, "stat": { "name": "special-defense" } },
                    { "base_stat": 45, "stat": { "name": "speed" } }
                ],
                "types": [
                    { "slot": 1, "type": { "name": "grass" } },
                    { "slot": 2, "type": { "name": "poison" } }
                ]
            })
        } else {
            json!({
                "id": id,
                "name": species_name(id),
                "height": id,
                "weight": id * 10,
                "sprites": { "front_default": format!("https://img/front/{id}.png") },
                "stats": [{ "base_stat": id % 256, "stat": { "name": "hp" } }],
                "types": [{ "slot": 1, "type": { "name": "normal" } }]
            })
        };

        Ok(serde_json::from_value(payload)?)
    }

    async fn fetch_species(&self, id: u32) -> Result<SpeciesPayload, FetchError> {
        self.species_requests.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;

        if self.failing_species.load(Ordering::SeqCst) {
            return Err(FetchError::Network("species endpoint down".to_string()));
        }

        let entries = if id == 1 {
            json!([
                { "flavor_text": "A strange seed was\nplanted on its back.", "language": { "name": "en" } },
                { "flavor_text": "Una rara semilla le fue\u{000c}plantada al nacer.", "language": { "name": "es" } }
            ])
        } else {
            json!([{ "flavor_text": format!("Entry {id}."), "language": { "name": "en" } }])
        };

        Ok(serde_json::from_value(json!({ "flavor_text_entries": entries }))?)
    }
}
