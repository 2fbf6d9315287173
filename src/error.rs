//! Error types shared by the catalog and the trainer form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Failure of a remote catalog request.
///
/// Cloneable so a single in-flight fetch can hand the same outcome to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status other than 404.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The API (or the loaded list) has no such entry.
    #[error("{resource} {key} not found")]
    NotFound { resource: &'static str, key: String },

    /// The body was not the JSON shape we expect.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Form fields that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    Name,
    Photo,
    BirthDate,
    Identification,
    Species,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::Photo => "photo",
            Self::BirthDate => "birth date",
            Self::Identification => "identification",
            Self::Species => "species selection",
        };
        f.write_str(label)
    }
}

/// A field-scoped, user-correctable validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(Field),

    #[error("DUI is required for adults")]
    DuiRequired,

    #[error("invalid DUI format")]
    InvalidDui,

    #[error("invalid carnet format")]
    InvalidCarnet,

    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },

    #[error("birth date cannot be in the future")]
    BirthDateInFuture,

    #[error("please enter a valid birth date")]
    BirthDateOutOfRange,

    #[error("select exactly {required} species ({selected} selected)")]
    SpeciesSelection { required: usize, selected: usize },
}

/// Every failing field of a rejected form submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("trainer form has {} invalid field(s)", .0.len())]
pub struct FormErrors(pub BTreeMap<Field, FieldError>);

impl FormErrors {
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }
}
