//! Member record and related types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::id::MemberId;
use super::patch::ProfilePatch;
use super::validation::MemberValidationError;

/// A field whose values come from a fixed, closed set of labels
pub trait ClosedSet: Sized + Copy + 'static {
    /// Wire name of the field, used in validation messages
    const FIELD: &'static str;

    /// Every allowed value
    const ALL: &'static [Self];

    /// Wire label of this value
    fn as_str(&self) -> &'static str;

    /// Parse a wire label, rejecting anything outside the set
    fn parse(value: &str) -> Result<Self, MemberValidationError> {
        Self::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == value)
            .ok_or_else(|| MemberValidationError::InvalidChoice {
                field: Self::FIELD,
                value: value.to_string(),
                allowed: Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "男")]
    Male,
    #[serde(rename = "女")]
    Female,
}

impl ClosedSet for Gender {
    const FIELD: &'static str = "gender";
    const ALL: &'static [Self] = &[Self::Male, Self::Female];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "男",
            Self::Female => "女",
        }
    }
}

/// Hong Kong residency document held by the member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdStatus {
    #[serde(rename = "永久身份證")]
    PermanentId,
    #[serde(rename = "單程證")]
    OneWayPermit,
    #[serde(rename = "雙程證")]
    TwoWayPermit,
}

impl ClosedSet for IdStatus {
    const FIELD: &'static str = "idStatus";
    const ALL: &'static [Self] = &[Self::PermanentId, Self::OneWayPermit, Self::TwoWayPermit];

    fn as_str(&self) -> &'static str {
        match self {
            Self::PermanentId => "永久身份證",
            Self::OneWayPermit => "單程證",
            Self::TwoWayPermit => "雙程證",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EconomicStatus {
    #[serde(rename = "低收入家庭")]
    LowIncome,
    /// Household receiving Comprehensive Social Security Assistance
    #[serde(rename = "綜援家庭")]
    Cssa,
    #[serde(rename = "無收入家庭")]
    NoIncome,
    #[serde(rename = "其他")]
    Other,
}

impl ClosedSet for EconomicStatus {
    const FIELD: &'static str = "economicStatus";
    const ALL: &'static [Self] = &[Self::LowIncome, Self::Cssa, Self::NoIncome, Self::Other];

    fn as_str(&self) -> &'static str {
        match self {
            Self::LowIncome => "低收入家庭",
            Self::Cssa => "綜援家庭",
            Self::NoIncome => "無收入家庭",
            Self::Other => "其他",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResidenceType {
    #[serde(rename = "劏房")]
    SubdividedFlat,
    #[serde(rename = "公屋")]
    PublicHousing,
}

impl ClosedSet for ResidenceType {
    const FIELD: &'static str = "residenceType";
    const ALL: &'static [Self] = &[Self::SubdividedFlat, Self::PublicHousing];

    fn as_str(&self) -> &'static str {
        match self {
            Self::SubdividedFlat => "劏房",
            Self::PublicHousing => "公屋",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaritalStatus {
    #[serde(rename = "單身")]
    Single,
    #[serde(rename = "已婚")]
    Married,
    #[serde(rename = "離婚/分居")]
    DivorcedOrSeparated,
}

impl ClosedSet for MaritalStatus {
    const FIELD: &'static str = "maritalStatus";
    const ALL: &'static [Self] = &[Self::Single, Self::Married, Self::DivorcedOrSeparated];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "單身",
            Self::Married => "已婚",
            Self::DivorcedOrSeparated => "離婚/分居",
        }
    }
}

/// Validated registration data, ready to be persisted under an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct NewMember {
    pub display_name: String,
    pub english_name: Option<String>,
    pub birth_year: i32,
    pub gender: Gender,
    pub id_status: IdStatus,
    pub economic_status: EconomicStatus,
    pub phone: Option<String>,
    pub address: String,
    pub residence_type: ResidenceType,
    pub marital_status: MaritalStatus,
}

/// Persisted beneficiary profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRecord {
    member_id: MemberId,
    display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    english_name: Option<String>,
    birth_year: i32,
    gender: Gender,
    id_status: IdStatus,
    economic_status: EconomicStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    address: String,
    residence_type: ResidenceType,
    marital_status: MaritalStatus,
    /// Opaque profile attributes only ever set through profile updates
    #[serde(flatten)]
    attributes: BTreeMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MemberRecord {
    /// Create a fresh record under an allocated identifier
    pub fn new(member_id: MemberId, member: NewMember, now: DateTime<Utc>) -> Self {
        Self::restore(member_id, member, BTreeMap::new(), now, now)
    }

    /// Rebuild a record from persisted parts
    pub fn restore(
        member_id: MemberId,
        member: NewMember,
        attributes: BTreeMap<String, Value>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            member_id,
            display_name: member.display_name,
            english_name: member.english_name,
            birth_year: member.birth_year,
            gender: member.gender,
            id_status: member.id_status,
            economic_status: member.economic_status,
            phone: member.phone,
            address: member.address,
            residence_type: member.residence_type,
            marital_status: member.marital_status,
            attributes,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn english_name(&self) -> Option<&str> {
        self.english_name.as_deref()
    }

    pub fn birth_year(&self) -> i32 {
        self.birth_year
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn id_status(&self) -> IdStatus {
        self.id_status
    }

    pub fn economic_status(&self) -> EconomicStatus {
        self.economic_status
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn residence_type(&self) -> ResidenceType {
        self.residence_type
    }

    pub fn marital_status(&self) -> MaritalStatus {
        self.marital_status
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Apply an allow-listed patch. Identifier, display name and creation
    /// time are never touched.
    pub fn apply_patch(&mut self, patch: &ProfilePatch, now: DateTime<Utc>) {
        if let Some(year) = patch.birth_year {
            self.birth_year = year;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(status) = patch.id_status {
            self.id_status = status;
        }
        if let Some(status) = patch.economic_status {
            self.economic_status = status;
        }
        if let Some(kind) = patch.residence_type {
            self.residence_type = kind;
        }
        if let Some(status) = patch.marital_status {
            self.marital_status = status;
        }
        if let Some(address) = &patch.address {
            self.address = address.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }

        for (key, value) in &patch.attributes {
            if value.is_null() {
                self.attributes.remove(key);
            } else {
                self.attributes.insert(key.clone(), value.clone());
            }
        }

        self.updated_at = now;
    }
}

/// Search projection of a member; carries no contact details
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub member_id: MemberId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub english_name: Option<String>,
    pub gender: Gender,
    pub birth_year: i32,
    pub id_status: IdStatus,
    pub economic_status: EconomicStatus,
}

impl From<&MemberRecord> for MemberSummary {
    fn from(record: &MemberRecord) -> Self {
        Self {
            member_id: record.member_id.clone(),
            display_name: record.display_name.clone(),
            english_name: record.english_name.clone(),
            gender: record.gender,
            birth_year: record.birth_year,
            id_status: record.id_status,
            economic_status: record.economic_status,
        }
    }
}
