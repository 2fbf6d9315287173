//! Identity document rules for trainer onboarding.
//!
//! Adults (18+) must present a DUI, El Salvador's national ID: eight digits,
//! a dash and a check digit. Minors may optionally present a carnet de
//! minoridad, which is only loosely checked for shape. Everything here is a
//! pure function of its inputs; callers pass "today" explicitly so the
//! adult/minor branch is re-evaluated on every call.

use std::sync::OnceLock;

use chrono::{Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Field, FieldError};

pub const DEFAULT_ADULT_AGE: u32 = 18;
pub const DEFAULT_CARNET_MIN_LEN: usize = 6;
pub const DEFAULT_CARNET_MAX_LEN: usize = 15;

const DUI_DIGITS: usize = 9;
const DUI_WEIGHTS: [u32; 8] = [2, 3, 4, 5, 6, 7, 8, 9];

/// Tunable bounds for identity validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRules {
    pub adult_age: u32,
    /// Inclusive. The two mobile clients disagreed here (6 vs 3).
    pub carnet_min_len: usize,
    pub carnet_max_len: usize,
}

impl Default for IdentityRules {
    fn default() -> Self {
        Self {
            adult_age: DEFAULT_ADULT_AGE,
            carnet_min_len: DEFAULT_CARNET_MIN_LEN,
            carnet_max_len: DEFAULT_CARNET_MAX_LEN,
        }
    }
}

/// Which document an identification value is checked as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    AdultDui,
    MinorCarnet,
}

impl DocumentKind {
    pub fn for_bearer(birth_date: NaiveDate, today: NaiveDate, rules: &IdentityRules) -> Self {
        if is_adult_at(birth_date, today, rules.adult_age) {
            Self::AdultDui
        } else {
            Self::MinorCarnet
        }
    }
}

/// An identification value together with the kind it was validated as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDocument {
    pub value: String,
    pub kind: DocumentKind,
}

fn dui_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{8}-\d$").expect("DUI pattern is valid"))
}

fn carnet_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("carnet pattern is valid"))
}

/// Age in completed years. Zero for birth dates after `today`.
pub fn compute_age(birth_date: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(birth_date).unwrap_or(0)
}

/// True once the 18th birthday has occurred on or before `today`.
pub fn is_adult(birth_date: NaiveDate, today: NaiveDate) -> bool {
    is_adult_at(birth_date, today, DEFAULT_ADULT_AGE)
}

fn is_adult_at(birth_date: NaiveDate, today: NaiveDate, adult_age: u32) -> bool {
    // Feb 29 birthdays reach the threshold on Mar 1 in common years.
    match years_before(today, adult_age) {
        Some(threshold) => threshold >= birth_date,
        None => false,
    }
}

/// Normalizes DUI input as the user types.
///
/// Non-digits are dropped, input is capped at nine digits and the dash is
/// inserted before the ninth. Applying it twice yields the same string.
pub fn format_dui(raw: &str) -> String {
    let digits: String = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(DUI_DIGITS)
        .collect();

    if digits.len() < DUI_DIGITS {
        digits
    } else {
        format!("{}-{}", &digits[..8], &digits[8..])
    }
}

/// Formats `raw` and returns where the text caret should land afterwards.
pub fn format_dui_with_cursor(raw: &str, cursor: usize) -> (String, usize) {
    let formatted = format_dui(raw);
    let cursor = match cursor {
        0..=8 => cursor.min(formatted.len()),
        9 if formatted.contains('-') => 10,
        _ => formatted.len(),
    };
    (formatted, cursor)
}

/// Shape check followed by the El Salvador DUI checksum.
///
/// Digits one to eight are weighted 2..=9, the products summed and reduced
/// modulo 11. The check digit is 0 when the remainder is 0 or 1, otherwise
/// `11 - remainder`.
pub fn is_valid_dui(value: &str) -> bool {
    let formatted = format_dui(value);
    if !dui_pattern().is_match(&formatted) {
        return false;
    }

    let digits: Vec<u32> = formatted.chars().filter_map(|c| c.to_digit(10)).collect();
    let Some((&check, body)) = digits.split_last() else {
        return false;
    };

    let sum: u32 = body
        .iter()
        .zip(DUI_WEIGHTS)
        .map(|(digit, weight)| digit * weight)
        .sum();

    let remainder = sum % 11;
    let expected = if remainder < 2 { 0 } else { 11 - remainder };

    expected == check
}

pub fn is_valid_carnet(value: &str, rules: &IdentityRules) -> bool {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    (rules.carnet_min_len..=rules.carnet_max_len).contains(&len)
        && carnet_pattern().is_match(trimmed)
}

/// Validates the identification field for a bearer born on `birth_date`.
///
/// Adults must supply a valid DUI. Minors may leave the field empty, but a
/// non-empty value must be a well-formed carnet.
pub fn validate_identity_field(
    value: &str,
    birth_date: NaiveDate,
    today: NaiveDate,
    rules: &IdentityRules,
) -> Result<(), FieldError> {
    let value = value.trim();
    match DocumentKind::for_bearer(birth_date, today, rules) {
        DocumentKind::AdultDui if value.is_empty() => Err(FieldError::DuiRequired),
        DocumentKind::AdultDui if !is_valid_dui(value) => Err(FieldError::InvalidDui),
        DocumentKind::AdultDui => Ok(()),
        DocumentKind::MinorCarnet if value.is_empty() => Ok(()),
        DocumentKind::MinorCarnet if !is_valid_carnet(value, rules) => {
            Err(FieldError::InvalidCarnet)
        }
        DocumentKind::MinorCarnet => Ok(()),
    }
}

pub fn validate_name(name: &str, min_len: usize) -> Result<(), FieldError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(FieldError::Required(Field::Name))
    } else if trimmed.chars().count() < min_len {
        Err(FieldError::NameTooShort { min: min_len })
    } else {
        Ok(())
    }
}

pub fn validate_birth_date(
    birth_date: Option<NaiveDate>,
    today: NaiveDate,
    max_age_years: u32,
) -> Result<(), FieldError> {
    let Some(birth_date) = birth_date else {
        return Err(FieldError::Required(Field::BirthDate));
    };

    if birth_date > today {
        return Err(FieldError::BirthDateInFuture);
    }

    // No representable lower bound means no bound.
    match years_before(today, max_age_years) {
        Some(earliest) if birth_date < earliest => Err(FieldError::BirthDateOutOfRange),
        _ => Ok(()),
    }
}

fn years_before(date: NaiveDate, years: u32) -> Option<NaiveDate> {
    date.checked_sub_months(Months::new(years.checked_mul(12)?))
}
