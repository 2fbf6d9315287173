//! Wire shapes of the PokeAPI responses we consume.
//!
//! Only the fields we read are declared; serde skips the rest. Anything that
//! may be absent is `Option` or `#[serde(default)]` so a sparse payload still
//! decodes.

use serde::Deserialize;

use super::{SpeciesDetail, SpeciesSummary, StatBlock, StatKind};
use crate::error::FetchError;

const PREFERRED_LANGUAGE: &str = "es";
const FALLBACK_LANGUAGE: &str = "en";

/// `GET /pokemon?limit=..&offset=..`
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesPage {
    /// Total species the API knows about, not the page length.
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

impl SpeciesPage {
    pub fn into_summaries(self) -> Result<Vec<SpeciesSummary>, FetchError> {
        self.results
            .into_iter()
            .map(|item| SpeciesSummary::from_list_item(item.name, item.url))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

/// `GET /pokemon/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct PokemonPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtherSprites {
    pub home: Option<SpriteImage>,
    #[serde(rename = "official-artwork")]
    pub official_artwork: Option<SpriteImage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpriteImage {
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatEntry {
    pub base_stat: u16,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// `GET /pokemon-species/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesPayload {
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlavorTextEntry {
    pub flavor_text: String,
    pub language: NamedResource,
}

impl SpeciesPayload {
    /// First Spanish entry, else first English entry, with line and page
    /// breaks flattened to spaces.
    pub fn description(&self) -> Option<String> {
        self.entry_in(PREFERRED_LANGUAGE)
            .or_else(|| self.entry_in(FALLBACK_LANGUAGE))
            .map(|text| text.replace(['\n', '\u{000c}'], " "))
    }

    fn entry_in(&self, language: &str) -> Option<&str> {
        self.flavor_text_entries
            .iter()
            .find(|entry| entry.language.name == language)
            .map(|entry| entry.flavor_text.as_str())
    }
}

impl PokemonPayload {
    pub fn image_url(&self) -> Option<String> {
        let other = self.sprites.other.as_ref();
        other
            .and_then(|o| o.home.as_ref())
            .and_then(|img| img.front_default.clone())
            .or_else(|| {
                other
                    .and_then(|o| o.official_artwork.as_ref())
                    .and_then(|img| img.front_default.clone())
            })
            .or_else(|| self.sprites.front_default.clone())
    }

    pub fn stat_block(&self) -> StatBlock {
        let mut block = StatBlock::default();
        for kind in StatKind::ALL {
            if let Some(entry) = self.stats.iter().find(|s| s.stat.name == kind.api_name()) {
                block.set(kind, entry.base_stat);
            }
        }
        block
    }

    pub fn type_names(&self) -> Vec<String> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|slot| slot.slot);
        slots.into_iter().map(|slot| slot.kind.name.clone()).collect()
    }

    /// Combines the pokemon record with its (optional) species record.
    pub fn into_detail(self, species: Option<&SpeciesPayload>) -> SpeciesDetail {
        SpeciesDetail {
            id: self.id,
            display_name: capitalize_first(&self.name),
            image_url: self.image_url(),
            types: self.type_names(),
            stats: self.stat_block(),
            height_decimeters: self.height,
            weight_decigrams: self.weight,
            description: species.and_then(SpeciesPayload::description),
        }
    }
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bulbasaur() -> PokemonPayload {
        serde_json::from_value(json!({
            "id": 1,
            "name": "bulbasaur",
            "height": 7,
            "weight": 69,
            "base_experience": 64,
            "sprites": {
                "front_default": "https://img/front/1.png",
                "other": {
                    "home": { "front_default": "https://img/home/1.png" },
                    "official-artwork": { "front_default": "https://img/art/1.png" }
                }
            },
            "stats": [
                { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "" } },
                { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "" } },
                { "base_stat": 49, "effort": 0, "stat": { "name": "defense", "url": "" } },
                { "base_stat": 65, "effort": 1, "stat": { "name": "special-attack", "url": "" } },
                { "base_stat": 65, "effort": 0, "stat": { "name": "special-defense", "url": "" } },
                { "base_stat": 45, "effort": 0, "stat": { "name": "speed", "url": "" } }
            ],
            "types": [
                { "slot": 2, "type": { "name": "poison", "url": "" } },
                { "slot": 1, "type": { "name": "grass", "url": "" } }
            ]
        }))
        .unwrap()
    }

    fn species(entries: serde_json::Value) -> SpeciesPayload {
        serde_json::from_value(json!({ "id": 1, "flavor_text_entries": entries })).unwrap()
    }

    #[test]
    fn detail_from_full_payload() {
        let detail = bulbasaur().into_detail(None);

        assert_eq!(detail.id, 1);
        assert_eq!(detail.display_name, "Bulbasaur");
        assert_eq!(detail.types, vec!["grass", "poison"]);
        assert_eq!(detail.stats[StatKind::Hp], 45);
        assert_eq!(detail.stats[StatKind::SpecialDefense], 65);
        assert_eq!(detail.height_decimeters, 7);
        assert_eq!(detail.weight_decigrams, 69);
        assert_eq!(detail.image_url.as_deref(), Some("https://img/home/1.png"));
        assert_eq!(detail.description, None);
    }

    #[test]
    fn image_falls_back_through_sprite_sources() {
        let mut payload = bulbasaur();
        payload.sprites.other.as_mut().unwrap().home = None;
        assert_eq!(payload.image_url().as_deref(), Some("https://img/art/1.png"));

        payload.sprites.other = None;
        assert_eq!(payload.image_url().as_deref(), Some("https://img/front/1.png"));

        payload.sprites.front_default = None;
        assert_eq!(payload.image_url(), None);
    }

    #[test]
    fn sparse_payload_defaults_missing_fields() {
        let payload: PokemonPayload = serde_json::from_value(json!({
            "id": 132,
            "name": "ditto",
            "stats": [{ "base_stat": 48, "stat": { "name": "hp" } }]
        }))
        .unwrap();

        let detail = payload.into_detail(None);
        assert_eq!(detail.display_name, "Ditto");
        assert_eq!(detail.stats[StatKind::Hp], 48);
        assert_eq!(detail.stats[StatKind::Speed], 0);
        assert!(detail.types.is_empty());
        assert_eq!(detail.image_url, None);
        assert_eq!(detail.height_decimeters, 0);
    }

    #[test]
    fn description_prefers_spanish() {
        let payload = species(json!([
            { "flavor_text": "A strange seed\nwas planted.", "language": { "name": "en" } },
            { "flavor_text": "Una rara semilla\u{000c}fue plantada.", "language": { "name": "es" } },
            { "flavor_text": "Otra entrada", "language": { "name": "es" } }
        ]));
        assert_eq!(
            payload.description().as_deref(),
            Some("Una rara semilla fue plantada.")
        );
    }

    #[test]
    fn description_falls_back_to_english_then_none() {
        let english = species(json!([
            { "flavor_text": "Graine\nbizarre", "language": { "name": "fr" } },
            { "flavor_text": "A strange seed\nwas planted.", "language": { "name": "en" } }
        ]));
        assert_eq!(
            english.description().as_deref(),
            Some("A strange seed was planted.")
        );

        let none = species(json!([
            { "flavor_text": "Graine", "language": { "name": "fr" } }
        ]));
        assert_eq!(none.description(), None);
        assert_eq!(SpeciesPayload::default().description(), None);
    }

    #[test]
    fn page_converts_to_ordered_summaries() {
        let page: SpeciesPage = serde_json::from_value(json!({
            "count": 1302,
            "next": "https://pokeapi.co/api/v2/pokemon?offset=2&limit=2",
            "previous": null,
            "results": [
                { "name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/" },
                { "name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon/2/" }
            ]
        }))
        .unwrap();
        assert_eq!(page.count, 1302);

        let summaries = page.into_summaries().unwrap();
        let ids: Vec<u32> = summaries.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(summaries[1].name, "ivysaur");
    }
}
