//! In-memory member store

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::DomainError;
use crate::domain::member::{
    MemberFilter, MemberId, MemberQuery, MemberRecord, MemberSort, MemberStore, ProfilePatch,
};

/// Thread-safe in-memory member store
///
/// Records are keyed by identifier, which gives uniqueness for free. Useful
/// for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemoryMemberStore {
    records: RwLock<BTreeMap<MemberId, MemberRecord>>,
}

impl InMemoryMemberStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with records
    pub fn with_records(records: Vec<MemberRecord>) -> Self {
        let map = records
            .into_iter()
            .map(|r| (r.member_id().clone(), r))
            .collect();

        Self {
            records: RwLock::new(map),
        }
    }
}

#[async_trait]
impl MemberStore for InMemoryMemberStore {
    async fn create(&self, record: MemberRecord) -> Result<MemberRecord, DomainError> {
        let mut records = self.records.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        if records.contains_key(record.member_id()) {
            return Err(DomainError::unique_violation(
                "members_pkey",
                record.member_id().as_str(),
            ));
        }

        records.insert(record.member_id().clone(), record.clone());
        Ok(record)
    }

    async fn find(&self, query: MemberQuery) -> Result<Vec<MemberRecord>, DomainError> {
        let records = self.records.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut matched: Vec<&MemberRecord> = records
            .values()
            .filter(|r| query.filter.matches(r))
            .collect();

        match query.sort {
            MemberSort::IdAsc => {}
            MemberSort::IdDesc => matched.reverse(),
            MemberSort::CreatedAtAsc => matched.sort_by(|a, b| {
                a.created_at()
                    .cmp(&b.created_at())
                    .then_with(|| a.member_id().cmp(b.member_id()))
            }),
        }

        Ok(matched
            .into_iter()
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count(&self, filter: MemberFilter) -> Result<usize, DomainError> {
        let records = self.records.read().map_err(|e| {
            DomainError::storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(records.values().filter(|r| filter.matches(r)).count())
    }

    async fn update_by_id(
        &self,
        id: &MemberId,
        patch: &ProfilePatch,
    ) -> Result<Option<MemberRecord>, DomainError> {
        let mut records = self.records.write().map_err(|e| {
            DomainError::storage(format!("Failed to acquire write lock: {}", e))
        })?;

        Ok(records.get_mut(id).map(|record| {
            record.apply_patch(patch, Utc::now());
            record.clone()
        }))
    }
}
