//! Data models for catalog entries and registered trainers

pub mod payload;

use std::ops::Index;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::identity::{self, DocumentKind, IdentityDocument, IdentityRules};

/// One row of the species list, in API order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesSummary {
    pub id: u32,
    pub name: String,
    pub source_url: String,
}

impl SpeciesSummary {
    /// Builds a summary, taking the id from the last path segment of `url`
    /// (`.../pokemon/25/` -> 25).
    pub fn from_list_item(name: String, url: String) -> Result<Self, FetchError> {
        let id = parse_trailing_id(&url)
            .ok_or_else(|| FetchError::Decode(format!("no species id in url {url:?}")))?;

        Ok(Self {
            id,
            name,
            source_url: url,
        })
    }
}

fn parse_trailing_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<u32>().ok())
        .filter(|id| *id > 0)
}

/// The six base stats, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
}

impl StatKind {
    pub const ALL: [StatKind; 6] = [
        Self::Hp,
        Self::Attack,
        Self::Defense,
        Self::SpecialAttack,
        Self::SpecialDefense,
        Self::Speed,
    ];

    /// Identifier used by the API in `stats[].stat.name`.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::Hp => "hp",
            Self::Attack => "attack",
            Self::Defense => "defense",
            Self::SpecialAttack => "special-attack",
            Self::SpecialDefense => "special-defense",
            Self::Speed => "speed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Attack => "Attack",
            Self::Defense => "Defense",
            Self::SpecialAttack => "Special-Attack",
            Self::SpecialDefense => "Special-Defense",
            Self::Speed => "Speed",
        }
    }

    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.api_name() == name)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Base stat values keyed by [`StatKind`]. Entries the API omitted are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock([u16; 6]);

impl StatBlock {
    pub fn get(&self, kind: StatKind) -> u16 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: StatKind, value: u16) {
        self.0[kind.index()] = value;
    }

    pub fn by_label(&self, label: &str) -> Option<u16> {
        StatKind::from_label(label).map(|kind| self.get(kind))
    }

    pub fn total(&self) -> u32 {
        self.0.iter().map(|v| u32::from(*v)).sum()
    }
}

impl Index<StatKind> for StatBlock {
    type Output = u16;

    fn index(&self, kind: StatKind) -> &u16 {
        &self.0[kind.index()]
    }
}

/// Per-stat ceilings used to scale stat bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatScale([u16; 6]);

impl Default for StatScale {
    fn default() -> Self {
        Self([255, 190, 230, 194, 230, 180])
    }
}

impl StatScale {
    pub fn max(&self, kind: StatKind) -> u16 {
        self.0[kind.index()]
    }

    pub fn with_max(mut self, kind: StatKind, max: u16) -> Self {
        self.0[kind.index()] = max;
        self
    }

    /// Fraction of the bar to fill, clamped to `0.0..=1.0`.
    pub fn progress(&self, kind: StatKind, value: u16) -> f32 {
        let max = self.max(kind);
        if max == 0 {
            return 0.0;
        }
        (f32::from(value) / f32::from(max)).clamp(0.0, 1.0)
    }
}

/// Display-ready detail record for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesDetail {
    pub id: u32,
    pub display_name: String,
    pub image_url: Option<String>,
    /// Type names in slot order, as spelled by the API.
    pub types: Vec<String>,
    pub stats: StatBlock,
    pub height_decimeters: u32,
    pub weight_decigrams: u32,
    pub description: Option<String>,
}

/// A registered trainer. Only produced by a successful form submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trainer {
    pub name: String,
    pub photo_ref: Option<String>,
    pub hobby: Option<String>,
    pub birth_date: NaiveDate,
    pub identification: Option<IdentityDocument>,
    pub selected_species: Vec<Arc<SpeciesDetail>>,
}

impl Trainer {
    pub fn age(&self, today: NaiveDate) -> u32 {
        identity::compute_age(self.birth_date, today)
    }

    /// Adulthood under the same rules the registering form used.
    pub fn is_adult(&self, today: NaiveDate, rules: &IdentityRules) -> bool {
        DocumentKind::for_bearer(self.birth_date, today, rules) == DocumentKind::AdultDui
    }
}
