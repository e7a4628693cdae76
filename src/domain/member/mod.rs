//! Member domain
//!
//! Beneficiary records, their month-scoped identifiers, registration
//! validation, the allow-listed profile patch and the record store trait.

mod entity;
mod id;
mod patch;
mod repository;
mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use entity::{
    ClosedSet, EconomicStatus, Gender, IdStatus, MaritalStatus, MemberRecord, MemberSummary,
    NewMember, ResidenceType,
};
pub use id::{MAX_SEQUENCE, MemberId, MonthPrefix};
pub use patch::{ATTRIBUTE_FIELDS, ProfilePatch, TYPED_PROFILE_FIELDS, is_allowed_profile_field};
pub use repository::{MemberFilter, MemberQuery, MemberSort, MemberStore};
pub use validation::{
    MAX_BIRTH_YEAR, MIN_BIRTH_YEAR, MemberValidationError, NewMemberInput, validate_birth_year,
    validate_search_term,
};

#[cfg(test)]
pub use repository::MockMemberStore;
