//! Trainer onboarding form.
//!
//! Holds the in-progress field values, re-validates a field every time it
//! changes and publishes the resulting error map through a
//! [`StateStream`]. A [`Trainer`] only comes out of [`TrainerForm::submit`]
//! once every rule passes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::error::{Field, FieldError, FormErrors};
use crate::events::StateStream;
use crate::identity::{self, DocumentKind, IdentityDocument, IdentityRules};
use crate::models::{SpeciesDetail, Trainer};
use crate::traits::DEFAULT_SELECTION_CAPACITY;

pub const DEFAULT_NAME_MIN_LEN: usize = 2;
pub const DEFAULT_MAX_AGE_YEARS: u32 = 120;

/// Source of "today" for age checks.
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainerFormConfig {
    pub identity: IdentityRules,
    pub name_min_len: usize,
    pub max_age_years: u32,
    /// One mobile client required a photo, the other did not.
    pub photo_required: bool,
    pub required_species: usize,
}

impl Default for TrainerFormConfig {
    fn default() -> Self {
        Self {
            identity: IdentityRules::default(),
            name_min_len: DEFAULT_NAME_MIN_LEN,
            max_age_years: DEFAULT_MAX_AGE_YEARS,
            photo_required: true,
            required_species: DEFAULT_SELECTION_CAPACITY,
        }
    }
}

/// Raw field values as entered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainerFormData {
    pub name: String,
    pub photo_ref: Option<String>,
    pub hobby: String,
    pub birth_date: Option<NaiveDate>,
    pub identification: String,
    pub selected_species: Vec<Arc<SpeciesDetail>>,
}

/// What the form view renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormStatus {
    pub errors: BTreeMap<Field, FieldError>,
    pub is_valid: bool,
}

pub struct TrainerForm {
    config: TrainerFormConfig,
    clock: Clock,
    data: TrainerFormData,
    errors: BTreeMap<Field, FieldError>,
    status: StateStream<FormStatus>,
}

impl fmt::Debug for TrainerForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainerForm")
            .field("config", &self.config)
            .field("data", &self.data)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl TrainerForm {
    pub fn new(config: TrainerFormConfig) -> Self {
        Self::with_clock(config, Arc::new(|| Local::now().date_naive()))
    }

    pub fn with_clock(config: TrainerFormConfig, clock: Clock) -> Self {
        Self {
            config,
            clock,
            data: TrainerFormData::default(),
            errors: BTreeMap::new(),
            status: StateStream::default(),
        }
    }

    pub fn config(&self) -> &TrainerFormConfig {
        &self.config
    }

    pub fn data(&self) -> &TrainerFormData {
        &self.data
    }

    pub fn errors(&self) -> &BTreeMap<Field, FieldError> {
        &self.errors
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Which document the identification field currently expects, once a
    /// birth date is known.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        self.data
            .birth_date
            .map(|birth| DocumentKind::for_bearer(birth, self.today(), &self.config.identity))
    }

    pub fn update_name(&mut self, name: impl Into<String>) {
        self.data.name = name.into();
        let result = self.check_name();
        self.set_field(Field::Name, result);
        self.publish();
    }

    pub fn update_photo(&mut self, photo_ref: Option<String>) {
        self.data.photo_ref = photo_ref;
        let result = self.check_photo();
        self.set_field(Field::Photo, result);
        self.publish();
    }

    pub fn update_hobby(&mut self, hobby: impl Into<String>) {
        self.data.hobby = hobby.into();
        self.publish();
    }

    /// Stores the birth date and re-checks a non-empty identification, since
    /// the adult/minor branch may have flipped.
    pub fn update_birth_date(&mut self, birth_date: Option<NaiveDate>) {
        self.data.birth_date = birth_date;
        let result = self.check_birth_date();
        self.set_field(Field::BirthDate, result);

        if !self.data.identification.trim().is_empty() {
            let result = self.check_identification();
            self.set_field(Field::Identification, result);
        }
        self.publish();
    }

    /// Stores the identification, formatting it as a DUI while the bearer is
    /// an adult.
    pub fn update_identification(&mut self, value: impl Into<String>) {
        let value = value.into();
        self.data.identification = match self.document_kind() {
            Some(DocumentKind::AdultDui) => identity::format_dui(&value),
            _ => value,
        };
        let result = self.check_identification();
        self.set_field(Field::Identification, result);
        self.publish();
    }

    pub fn update_selected_species(&mut self, species: Vec<Arc<SpeciesDetail>>) {
        self.data.selected_species = species;
        let result = self.check_species();
        self.set_field(Field::Species, result);
        self.publish();
    }

    /// Runs every rule against the current date.
    pub fn validate_all(&self) -> BTreeMap<Field, FieldError> {
        [
            (Field::Name, self.check_name()),
            (Field::Photo, self.check_photo()),
            (Field::BirthDate, self.check_birth_date()),
            (Field::Identification, self.check_identification()),
            (Field::Species, self.check_species()),
        ]
        .into_iter()
        .filter_map(|(field, result)| result.err().map(|err| (field, err)))
        .collect()
    }

    pub fn is_valid(&self) -> bool {
        self.validate_all().is_empty()
    }

    /// Builds the trainer, or reports every failing field.
    pub fn submit(&mut self) -> Result<Trainer, FormErrors> {
        let errors = self.validate_all();
        if !errors.is_empty() {
            debug!("Trainer form rejected: {:?}", errors.keys().collect::<Vec<_>>());
            self.errors = errors.clone();
            self.publish();
            return Err(FormErrors(errors));
        }

        let Some(birth_date) = self.data.birth_date else {
            return Err(FormErrors(BTreeMap::from([(
                Field::BirthDate,
                FieldError::Required(Field::BirthDate),
            )])));
        };

        let identification = self.data.identification.trim();
        let kind = DocumentKind::for_bearer(birth_date, self.today(), &self.config.identity);
        let identification = (!identification.is_empty()).then(|| IdentityDocument {
            value: match kind {
                DocumentKind::AdultDui => identity::format_dui(identification),
                DocumentKind::MinorCarnet => identification.to_string(),
            },
            kind,
        });

        let hobby = self.data.hobby.trim();
        let trainer = Trainer {
            name: self.data.name.trim().to_string(),
            photo_ref: self.data.photo_ref.clone(),
            hobby: (!hobby.is_empty()).then(|| hobby.to_string()),
            birth_date,
            identification,
            selected_species: self.data.selected_species.clone(),
        };

        info!(
            "Registered trainer {} with {} species",
            trainer.name,
            trainer.selected_species.len()
        );
        Ok(trainer)
    }

    /// Repopulates the form from a registered trainer.
    pub fn load_trainer(&mut self, trainer: &Trainer) {
        self.data = TrainerFormData {
            name: trainer.name.clone(),
            photo_ref: trainer.photo_ref.clone(),
            hobby: trainer.hobby.clone().unwrap_or_default(),
            birth_date: Some(trainer.birth_date),
            identification: trainer
                .identification
                .as_ref()
                .map(|doc| doc.value.clone())
                .unwrap_or_default(),
            selected_species: trainer.selected_species.clone(),
        };
        self.errors = self.validate_all();
        self.publish();
    }

    pub fn clear(&mut self) {
        self.data = TrainerFormData::default();
        self.errors.clear();
        self.publish();
    }

    fn check_name(&self) -> Result<(), FieldError> {
        identity::validate_name(&self.data.name, self.config.name_min_len)
    }

    fn check_photo(&self) -> Result<(), FieldError> {
        if self.config.photo_required && self.data.photo_ref.is_none() {
            Err(FieldError::Required(Field::Photo))
        } else {
            Ok(())
        }
    }

    fn check_birth_date(&self) -> Result<(), FieldError> {
        identity::validate_birth_date(self.data.birth_date, self.today(), self.config.max_age_years)
    }

    /// Without a birth date the document kind is unknown; the birth date
    /// error covers that case.
    fn check_identification(&self) -> Result<(), FieldError> {
        match self.data.birth_date {
            Some(birth) => identity::validate_identity_field(
                &self.data.identification,
                birth,
                self.today(),
                &self.config.identity,
            ),
            None => Ok(()),
        }
    }

    fn check_species(&self) -> Result<(), FieldError> {
        let selected = self.data.selected_species.len();
        if selected == self.config.required_species {
            Ok(())
        } else {
            Err(FieldError::SpeciesSelection {
                required: self.config.required_species,
                selected,
            })
        }
    }

    fn set_field(&mut self, field: Field, result: Result<(), FieldError>) {
        match result {
            Ok(()) => {
                self.errors.remove(&field);
            }
            Err(err) => {
                self.errors.insert(field, err);
            }
        }
    }

    fn publish(&self) {
        self.status.replace(FormStatus {
            errors: self.errors.clone(),
            is_valid: self.is_valid(),
        });
    }
}
