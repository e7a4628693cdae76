//! Member input validation

use serde::Deserialize;
use thiserror::Error;

use super::entity::{
    ClosedSet, EconomicStatus, Gender, IdStatus, MaritalStatus, NewMember, ResidenceType,
};
use crate::domain::DomainError;

/// Errors that can occur while validating member data
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MemberValidationError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Invalid value '{value}' for {field}. Allowed: {allowed}")]
    InvalidChoice {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("Birth year {0} is outside 1900..=2100")]
    BirthYearOutOfRange(i64),

    #[error("Field '{field}' has the wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field '{0}' cannot be cleared")]
    RequiredFieldCleared(&'static str),

    #[error("Invalid member ID format: '{0}'")]
    InvalidMemberId(String),

    #[error("Member ID sequence {0} is outside 1..=999")]
    SequenceOutOfRange(u16),

    #[error("Search term cannot be empty")]
    EmptySearchTerm,
}

impl From<MemberValidationError> for DomainError {
    fn from(err: MemberValidationError) -> Self {
        DomainError::validation(err.to_string())
    }
}

pub const MIN_BIRTH_YEAR: i64 = 1900;
pub const MAX_BIRTH_YEAR: i64 = 2100;

/// Registration payload as received; every field optional until validated
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemberInput {
    #[serde(default, alias = "chineseName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub birth_year: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub id_status: Option<String>,
    #[serde(default)]
    pub economic_status: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub residence_type: Option<String>,
    #[serde(default)]
    pub marital_status: Option<String>,
}

impl NewMemberInput {
    /// Validate the payload without touching any store.
    ///
    /// Missing required fields are reported together; after that the first
    /// invalid value wins.
    pub fn validate(self) -> Result<NewMember, MemberValidationError> {
        let mut missing = Vec::new();

        let display_name = require("displayName", trimmed(self.display_name), &mut missing);
        let birth_year = require("birthYear", self.birth_year, &mut missing);
        let gender = require("gender", trimmed(self.gender), &mut missing);
        let id_status = require("idStatus", trimmed(self.id_status), &mut missing);
        let economic_status =
            require("economicStatus", trimmed(self.economic_status), &mut missing);
        let address = require("address", trimmed(self.address), &mut missing);
        let residence_type = require("residenceType", trimmed(self.residence_type), &mut missing);
        let marital_status = require("maritalStatus", trimmed(self.marital_status), &mut missing);

        if !missing.is_empty() {
            return Err(MemberValidationError::MissingFields(missing));
        }

        Ok(NewMember {
            display_name,
            english_name: trimmed(self.english_name),
            birth_year: validate_birth_year(birth_year)?,
            gender: Gender::parse(&gender)?,
            id_status: IdStatus::parse(&id_status)?,
            economic_status: EconomicStatus::parse(&economic_status)?,
            phone: trimmed(self.phone),
            address,
            residence_type: ResidenceType::parse(&residence_type)?,
            marital_status: MaritalStatus::parse(&marital_status)?,
        })
    }
}

/// Check a birth year and narrow it to `i32`
pub fn validate_birth_year(year: i64) -> Result<i32, MemberValidationError> {
    if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year) {
        return Err(MemberValidationError::BirthYearOutOfRange(year));
    }

    Ok(year as i32)
}

/// Validate a search term. The term is matched exactly as given, so
/// surrounding whitespace is significant.
pub fn validate_search_term(term: Option<&str>) -> Result<&str, MemberValidationError> {
    match term {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(MemberValidationError::EmptySearchTerm),
    }
}

fn require<T: Default>(
    field: &'static str,
    value: Option<T>,
    missing: &mut Vec<&'static str>,
) -> T {
    value.unwrap_or_else(|| {
        missing.push(field);
        T::default()
    })
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
