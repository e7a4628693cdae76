//! Shared test builders for member types

use chrono::{TimeZone, Utc};

use super::entity::{
    EconomicStatus, Gender, IdStatus, MaritalStatus, MemberRecord, NewMember, ResidenceType,
};
use super::id::MemberId;
use super::validation::NewMemberInput;

/// A registration payload with every required field filled in
pub fn complete_input(display_name: &str) -> NewMemberInput {
    NewMemberInput {
        display_name: Some(display_name.to_string()),
        english_name: Some("Chan Tai Man".to_string()),
        birth_year: Some(1958),
        gender: Some("男".to_string()),
        id_status: Some("永久身份證".to_string()),
        economic_status: Some("綜援家庭".to_string()),
        phone: Some("91234567".to_string()),
        address: Some("深水埗福華街 1 號".to_string()),
        residence_type: Some("劏房".to_string()),
        marital_status: Some("已婚".to_string()),
    }
}

pub fn new_member(display_name: &str) -> NewMember {
    NewMember {
        display_name: display_name.to_string(),
        english_name: Some("Chan Tai Man".to_string()),
        birth_year: 1958,
        gender: Gender::Male,
        id_status: IdStatus::PermanentId,
        economic_status: EconomicStatus::Cssa,
        phone: Some("91234567".to_string()),
        address: "深水埗福華街 1 號".to_string(),
        residence_type: ResidenceType::SubdividedFlat,
        marital_status: MaritalStatus::Married,
    }
}

/// A persisted record created at the start of the identifier's month
pub fn record(member_id: &str, display_name: &str) -> MemberRecord {
    let id = MemberId::new(member_id).unwrap();
    let year = 2000 + id.prefix()[1..3].parse::<i32>().unwrap();
    let month = id.prefix()[3..5].parse::<u32>().unwrap();
    let created = Utc.with_ymd_and_hms(year, month, 1, 8, 0, 0).unwrap();

    MemberRecord::new(id, new_member(display_name), created)
}
