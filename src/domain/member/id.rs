//! Member identifiers: `M` + YY + MM + three-digit sequence

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::MemberValidationError;

static MEMBER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^M[0-9]{2}(0[1-9]|1[0-2])[0-9]{3}$").expect("member id pattern is valid")
});

/// Highest sequence number a single month can hold
pub const MAX_SEQUENCE: u16 = 999;

const PREFIX_LEN: usize = 5;

/// Month-scoped identifier prefix, e.g. `M2403`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MonthPrefix(String);

impl MonthPrefix {
    /// Prefix for the calendar month `now` falls in, observed at `offset`
    pub fn for_instant(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = now.with_timezone(&offset);
        Self(format!(
            "M{:02}{:02}",
            local.year().rem_euclid(100),
            local.month()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the identifier for `sequence` within this month
    pub fn member_id(&self, sequence: u16) -> Result<MemberId, MemberValidationError> {
        if sequence == 0 || sequence > MAX_SEQUENCE {
            return Err(MemberValidationError::SequenceOutOfRange(sequence));
        }

        MemberId::new(format!("{}{:03}", self.0, sequence))
    }
}

impl std::fmt::Display for MonthPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Member identifier, immutable once assigned
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Result<Self, MemberValidationError> {
        let id = id.into();

        if !MEMBER_ID_PATTERN.is_match(&id) {
            return Err(MemberValidationError::InvalidMemberId(id));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `M<YY><MM>` part
    pub fn prefix(&self) -> &str {
        &self.0[..PREFIX_LEN]
    }

    /// The trailing three-digit sequence as a number
    pub fn sequence(&self) -> u16 {
        // The pattern guarantees three ASCII digits here
        self.0[PREFIX_LEN..].parse().unwrap_or(0)
    }
}

impl TryFrom<String> for MemberId {
    type Error = MemberValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
