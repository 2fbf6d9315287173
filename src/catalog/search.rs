use serde::{Deserialize, Serialize};

use crate::models::SpeciesSummary;

/// How a query is matched against species ids.
///
/// Names always match on a case-insensitive substring. The two mobile
/// screens disagreed on ids: the trainer's species picker required the whole
/// id (`"5"` finds only #5), the Pokédex grid accepted any id containing the
/// query (`"5"` also finds #25 and #150).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMode {
    #[default]
    ExactId,
    IdContains,
}

impl SearchMode {
    pub fn matches(self, summary: &SpeciesSummary, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }

        if summary.name.to_lowercase().contains(&query.to_lowercase()) {
            return true;
        }

        let id = summary.id.to_string();
        match self {
            Self::ExactId => id == query,
            Self::IdContains => id.contains(query),
        }
    }

    /// Filters `list`, preserving its order. A blank query keeps everything.
    pub fn filter(self, list: &[SpeciesSummary], query: &str) -> Vec<SpeciesSummary> {
        list.iter()
            .filter(|summary| self.matches(summary, query))
            .cloned()
            .collect()
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" | "exact-id" => Ok(Self::ExactId),
            "contains" | "id-contains" => Ok(Self::IdContains),
            other => Err(format!("unknown search mode {other:?} (expected exact|contains)")),
        }
    }
}
