//! Allow-listed profile updates

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::entity::{ClosedSet, EconomicStatus, Gender, IdStatus, MaritalStatus, ResidenceType};
use super::validation::{MemberValidationError, validate_birth_year};

/// Core fields that can be changed after registration
pub const TYPED_PROFILE_FIELDS: &[&str] = &[
    "birthYear",
    "gender",
    "idStatus",
    "economicStatus",
    "maritalStatus",
    "residenceType",
    "address",
    "phone",
];

/// Optional attributes that only ever enter a record through an update
pub const ATTRIBUTE_FIELDS: &[&str] = &[
    "singlePermitYear",
    "familySize",
    "visitor",
    "district",
    "housingEstate",
    "spouseName",
    "spouseAge",
    "numberOfChildren",
    "spouseOccupation",
    "residenceStatus",
    "monthlyRent",
    "familyIncome",
    "hasCSSA",
];

/// Whether `key` may be changed by a profile update
pub fn is_allowed_profile_field(key: &str) -> bool {
    TYPED_PROFILE_FIELDS.contains(&key) || ATTRIBUTE_FIELDS.contains(&key)
}

/// A typed partial update to a member record.
///
/// `None` leaves a field untouched. For `phone`, `Some(None)` clears it. An
/// attribute mapped to `Value::Null` is removed from the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub birth_year: Option<i32>,
    pub gender: Option<Gender>,
    pub id_status: Option<IdStatus>,
    pub economic_status: Option<EconomicStatus>,
    pub marital_status: Option<MaritalStatus>,
    pub residence_type: Option<ResidenceType>,
    pub address: Option<String>,
    pub phone: Option<Option<String>>,
    pub attributes: BTreeMap<String, Value>,
}

impl ProfilePatch {
    /// Build a patch from a raw JSON object.
    ///
    /// Keys outside the allow-list are dropped without error. Values of
    /// allowed core fields are validated the same way registration validates
    /// them.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, MemberValidationError> {
        let mut patch = Self::default();

        for (key, value) in fields {
            match key.as_str() {
                "birthYear" => {
                    let year = required(&value, "birthYear")?
                        .as_i64()
                        .ok_or(MemberValidationError::WrongType {
                            field: "birthYear",
                            expected: "integer",
                        })?;
                    patch.birth_year = Some(validate_birth_year(year)?);
                }
                "gender" => patch.gender = Some(choice(&value)?),
                "idStatus" => patch.id_status = Some(choice(&value)?),
                "economicStatus" => patch.economic_status = Some(choice(&value)?),
                "maritalStatus" => patch.marital_status = Some(choice(&value)?),
                "residenceType" => patch.residence_type = Some(choice(&value)?),
                "address" => {
                    let address = text(required(&value, "address")?, "address")?;
                    if address.is_empty() {
                        return Err(MemberValidationError::RequiredFieldCleared("address"));
                    }
                    patch.address = Some(address);
                }
                "phone" => {
                    let phone = match value {
                        Value::Null => None,
                        ref v => Some(text(v, "phone")?).filter(|p| !p.is_empty()),
                    };
                    patch.phone = Some(phone);
                }
                other if ATTRIBUTE_FIELDS.contains(&other) => {
                    patch.attributes.insert(key, value);
                }
                _ => {}
            }
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn required<'a>(value: &'a Value, field: &'static str) -> Result<&'a Value, MemberValidationError> {
    if value.is_null() {
        return Err(MemberValidationError::RequiredFieldCleared(field));
    }
    Ok(value)
}

fn text(value: &Value, field: &'static str) -> Result<String, MemberValidationError> {
    value
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or(MemberValidationError::WrongType {
            field,
            expected: "string",
        })
}

fn choice<T: ClosedSet>(value: &Value) -> Result<T, MemberValidationError> {
    let label = text(required(value, T::FIELD)?, T::FIELD)?;
    T::parse(&label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_unknown_and_protected_keys_dropped() {
        let patch = ProfilePatch::from_fields(fields(json!({
            "memberId": "M0001001",
            "displayName": "someone else",
            "chineseName": "someone else",
            "createdAt": "2020-01-01T00:00:00Z",
            "isAdmin": true,
            "address": "新地址",
        })))
        .unwrap();

        assert_eq!(patch.address.as_deref(), Some("新地址"));
        assert!(patch.attributes.is_empty());
        assert!(patch.birth_year.is_none());
    }

    #[test]
    fn test_only_unknown_keys_is_empty() {
        let patch = ProfilePatch::from_fields(fields(json!({"foo": 1, "memberId": "x"}))).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_typed_fields_parsed() {
        let patch = ProfilePatch::from_fields(fields(json!({
            "birthYear": 1961,
            "gender": "女",
            "maritalStatus": "單身",
            "residenceType": "公屋",
        })))
        .unwrap();

        assert_eq!(patch.birth_year, Some(1961));
        assert_eq!(patch.gender, Some(Gender::Female));
        assert_eq!(patch.marital_status, Some(MaritalStatus::Single));
        assert_eq!(patch.residence_type, Some(ResidenceType::PublicHousing));
    }

    #[test]
    fn test_attributes_kept_opaque() {
        let patch = ProfilePatch::from_fields(fields(json!({
            "familySize": 5,
            "hasCSSA": false,
            "district": "深水埗",
            "spouseName": null,
        })))
        .unwrap();

        assert_eq!(patch.attributes.len(), 4);
        assert_eq!(patch.attributes["familySize"], json!(5));
        assert_eq!(patch.attributes["spouseName"], Value::Null);
    }

    #[test]
    fn test_enum_values_revalidated() {
        let err = ProfilePatch::from_fields(fields(json!({"economicStatus": "rich"}))).unwrap_err();
        assert!(matches!(
            err,
            MemberValidationError::InvalidChoice {
                field: "economicStatus",
                ..
            }
        ));
    }

    #[test]
    fn test_birth_year_checks() {
        assert_eq!(
            ProfilePatch::from_fields(fields(json!({"birthYear": "1960"}))),
            Err(MemberValidationError::WrongType {
                field: "birthYear",
                expected: "integer"
            })
        );
        assert_eq!(
            ProfilePatch::from_fields(fields(json!({"birthYear": 2300}))),
            Err(MemberValidationError::BirthYearOutOfRange(2300))
        );
    }

    #[test]
    fn test_required_fields_cannot_be_cleared() {
        assert_eq!(
            ProfilePatch::from_fields(fields(json!({"gender": null}))),
            Err(MemberValidationError::RequiredFieldCleared("gender"))
        );
        assert_eq!(
            ProfilePatch::from_fields(fields(json!({"address": "  "}))),
            Err(MemberValidationError::RequiredFieldCleared("address"))
        );
    }

    #[test]
    fn test_phone_can_be_cleared() {
        let patch = ProfilePatch::from_fields(fields(json!({"phone": null}))).unwrap();
        assert_eq!(patch.phone, Some(None));

        let patch = ProfilePatch::from_fields(fields(json!({"phone": " 91234567 "}))).unwrap();
        assert_eq!(patch.phone, Some(Some("91234567".to_string())));
    }

    #[test]
    fn test_allow_list_lookup() {
        assert!(is_allowed_profile_field("housingEstate"));
        assert!(is_allowed_profile_field("phone"));
        assert!(!is_allowed_profile_field("displayName"));
        assert!(!is_allowed_profile_field("memberId"));
    }
}
