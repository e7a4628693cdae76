//! Member registry: registration, profile access, search and directory

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, FixedOffset, Offset, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::allocator::IdentifierAllocator;
use crate::domain::auth::CallerIdentity;
use crate::domain::clock::Clock;
use crate::domain::member::{
    ClosedSet, MemberFilter, MemberId, MemberQuery, MemberRecord, MemberSort, MemberStore,
    MemberSummary, NewMemberInput, ProfilePatch, validate_search_term,
};
use crate::domain::DomainError;
use crate::infrastructure::observability::{
    record_allocation_retry, record_registration, RegistrationOutcome,
};

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

/// Registry tuning
#[derive(Debug, Clone, Copy)]
pub struct RegistryOptions {
    /// How many allocate-then-create rounds registration makes before giving up
    pub max_allocation_attempts: u32,
    /// Offset at which calendar months are observed
    pub utc_offset: FixedOffset,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            max_allocation_attempts: 3,
            utc_offset: Utc.fix(),
        }
    }
}

/// One page of the member directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    pub total: usize,
    pub pages: usize,
    pub current_page: usize,
    pub members: Vec<MemberRecord>,
}

/// Directory-wide counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStats {
    pub total: usize,
    pub by_gender: BTreeMap<String, usize>,
    pub by_economic_status: BTreeMap<String, usize>,
    pub by_residence_type: BTreeMap<String, usize>,
    pub by_district: BTreeMap<String, usize>,
    /// Age this calendar year, from the birth year
    pub by_age: BTreeMap<i32, usize>,
}

pub struct MemberRegistry<S: MemberStore> {
    store: Arc<S>,
    allocator: IdentifierAllocator<S>,
    clock: Arc<dyn Clock>,
    options: RegistryOptions,
}

impl<S: MemberStore> std::fmt::Debug for MemberRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemberRegistry")
            .field("options", &self.options)
            .finish()
    }
}

impl<S: MemberStore> MemberRegistry<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, options: RegistryOptions) -> Self {
        Self {
            allocator: IdentifierAllocator::new(store.clone(), options.utc_offset),
            store,
            clock,
            options,
        }
    }

    /// Validate, reject duplicate names, allocate an identifier and persist.
    pub async fn register(&self, input: NewMemberInput) -> Result<MemberId, DomainError> {
        let result = self.try_register(input).await;

        record_registration(match &result {
            Ok(_) => RegistrationOutcome::Registered,
            Err(DomainError::Validation { .. }) => RegistrationOutcome::Invalid,
            Err(DomainError::DuplicateMember { .. }) => RegistrationOutcome::Duplicate,
            Err(_) => RegistrationOutcome::Failed,
        });

        result
    }

    async fn try_register(&self, input: NewMemberInput) -> Result<MemberId, DomainError> {
        let member = input.validate()?;

        // Check-then-create: two concurrent registrations of one name can both pass
        let existing = self
            .store
            .find_one(MemberQuery::new(MemberFilter::DisplayName(
                member.display_name.clone(),
            )))
            .await?;

        if existing.is_some() {
            info!(display_name = %member.display_name, "Rejected duplicate member registration");
            return Err(DomainError::duplicate_member(member.display_name));
        }

        let attempts = self.options.max_allocation_attempts.max(1);

        for attempt in 1..=attempts {
            let now = self.clock.now();
            let member_id = self.allocator.next_id(now).await?;

            match self
                .store
                .create(MemberRecord::new(member_id.clone(), member.clone(), now))
                .await
            {
                Ok(record) => {
                    info!(member_id = %record.member_id(), attempt, "Member registered");
                    return Ok(record.member_id().clone());
                }
                Err(e) if e.is_unique_violation() => {
                    warn!(member_id = %member_id, attempt, "Member ID already taken, reallocating");
                    record_allocation_retry();
                }
                Err(e) => {
                    error!(error = %e, member_id = %member_id, "Failed to persist member");
                    return Err(e);
                }
            }
        }

        error!(attempts, "Could not allocate a unique member ID");
        Err(DomainError::storage(format!(
            "Could not allocate a unique member ID after {} attempts",
            attempts
        )))
    }

    /// The member record linked to the caller
    pub async fn get_profile(&self, caller: &CallerIdentity) -> Result<MemberRecord, DomainError> {
        let member_id = linked_member(caller)?;

        self.store
            .find_one(MemberQuery::new(MemberFilter::MemberId(member_id.clone())))
            .await?
            .ok_or_else(|| member_not_found(member_id))
    }

    /// Apply an allow-listed patch to the caller's record
    pub async fn update_profile(
        &self,
        caller: &CallerIdentity,
        patch: ProfilePatch,
    ) -> Result<MemberRecord, DomainError> {
        let member_id = linked_member(caller)?;

        if patch.is_empty() {
            return self.get_profile(caller).await;
        }

        let updated = self
            .store
            .update_by_id(member_id, &patch)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;

        info!(member_id = %member_id, account_id = %caller.account_id, "Member profile updated");
        Ok(updated)
    }

    /// Case-insensitive substring search over identifier and display name
    pub async fn search(&self, term: Option<&str>) -> Result<Vec<MemberSummary>, DomainError> {
        let term = validate_search_term(term)?;

        let records = self
            .store
            .find(MemberQuery::new(MemberFilter::Keyword(term.to_string())).sorted(MemberSort::IdAsc))
            .await?;

        Ok(records.iter().map(MemberSummary::from).collect())
    }

    /// Look up any member by identifier
    pub async fn get(&self, member_id: &str) -> Result<MemberRecord, DomainError> {
        let Ok(id) = MemberId::new(member_id) else {
            return Err(DomainError::not_found(format!(
                "Member '{}' not found",
                member_id
            )));
        };

        self.store
            .find_one(MemberQuery::new(MemberFilter::MemberId(id.clone())))
            .await?
            .ok_or_else(|| member_not_found(&id))
    }

    /// One page of all members in identifier order
    pub async fn list(&self, page: usize, per_page: usize) -> Result<MemberPage, DomainError> {
        if page == 0 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if per_page == 0 {
            return Err(DomainError::validation("per_page must be at least 1"));
        }
        let per_page = per_page.min(MAX_PER_PAGE);
        let skip = (page - 1)
            .checked_mul(per_page)
            .filter(|skip| i64::try_from(*skip).is_ok())
            .ok_or_else(|| DomainError::validation(format!("page {} is out of range", page)))?;

        let total = self.store.count(MemberFilter::All).await?;
        let members = self
            .store
            .find(
                MemberQuery::new(MemberFilter::All)
                    .sorted(MemberSort::IdAsc)
                    .skip(skip)
                    .limit(per_page),
            )
            .await?;

        Ok(MemberPage {
            total,
            pages: total.div_ceil(per_page),
            current_page: page,
            members,
        })
    }

    pub async fn stats(&self) -> Result<MemberStats, DomainError> {
        let records = self.store.find(MemberQuery::new(MemberFilter::All)).await?;

        let mut stats = MemberStats {
            total: records.len(),
            ..Default::default()
        };
        let this_year = self.clock.now().with_timezone(&self.options.utc_offset).year();

        for record in &records {
            bump(&mut stats.by_gender, record.gender().as_str());
            bump(&mut stats.by_economic_status, record.economic_status().as_str());
            bump(&mut stats.by_residence_type, record.residence_type().as_str());
            *stats
                .by_age
                .entry((this_year - record.birth_year()).max(0))
                .or_default() += 1;

            if let Some(district) = record.attribute("district").and_then(|d| d.as_str()) {
                bump(&mut stats.by_district, district);
            }
        }

        Ok(stats)
    }

    /// Cheap store round-trip for readiness checks
    pub async fn health_check(&self) -> Result<(), DomainError> {
        self.store.count(MemberFilter::All).await.map(|_| ())
    }
}

fn linked_member(caller: &CallerIdentity) -> Result<&MemberId, DomainError> {
    caller.member_id.as_ref().ok_or_else(|| {
        DomainError::not_found(format!(
            "No member profile is linked to account '{}'",
            caller.username
        ))
    })
}

fn member_not_found(id: &MemberId) -> DomainError {
    DomainError::not_found(format!("Member '{}' not found", id))
}

fn bump(counts: &mut BTreeMap<String, usize>, key: &str) {
    *counts.entry(key.to_string()).or_default() += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountId, AccountRole};
    use crate::domain::clock::FixedClock;
    use crate::domain::member::fixtures::{complete_input, record};
    use crate::domain::member::{Gender, MockMemberStore};
    use crate::infrastructure::storage::InMemoryMemberStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    fn march() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap()
    }

    fn registry_with<S: MemberStore>(store: Arc<S>, now: DateTime<Utc>) -> MemberRegistry<S> {
        MemberRegistry::new(
            store,
            Arc::new(FixedClock::new(now)),
            RegistryOptions::default(),
        )
    }

    fn caller(member_id: Option<&str>) -> CallerIdentity {
        CallerIdentity {
            account_id: AccountId::generate(),
            username: "chan".to_string(),
            role: AccountRole::User,
            member_id: member_id.map(|m| MemberId::new(m).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_sequential_registrations_across_months() {
        let store = Arc::new(InMemoryMemberStore::new());
        let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()));
        let registry = MemberRegistry::new(store.clone(), clock.clone(), RegistryOptions::default());

        let first = registry.register(complete_input("甲")).await.unwrap();
        let second = registry.register(complete_input("乙")).await.unwrap();
        assert_eq!(first.as_str(), "M2401001");
        assert_eq!(second.as_str(), "M2401002");

        clock.set(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        let third = registry.register(complete_input("丙")).await.unwrap();
        assert_eq!(third.as_str(), "M2402001");

        let stored = store
            .find_one(MemberQuery::new(MemberFilter::MemberId(third)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.created_at(), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_display_name_rejected() {
        let store = Arc::new(InMemoryMemberStore::new());
        let registry = registry_with(store.clone(), march());

        registry.register(complete_input("陳大文")).await.unwrap();
        let err = registry.register(complete_input("陳大文")).await.unwrap_err();

        assert!(matches!(err, DomainError::DuplicateMember { .. }));
        assert_eq!(store.count(MemberFilter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_input_never_touches_store() {
        // No expectations: any store call fails the test
        let registry = registry_with(Arc::new(MockMemberStore::new()), march());

        let mut input = complete_input("陳大文");
        input.marital_status = None;
        let err = registry.register(input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        let mut input = complete_input("陳大文");
        input.gender = Some("unknown".to_string());
        let err = registry.register(input).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_other_store_errors_not_retried() {
        let mut store = MockMemberStore::new();
        store.expect_find_one().returning(|_| Ok(None));
        store
            .expect_create()
            .times(1)
            .returning(|_| Err(DomainError::storage("disk full")));

        let registry = registry_with(Arc::new(store), march());
        let err = registry.register(complete_input("陳大文")).await.unwrap_err();
        assert!(matches!(err, DomainError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_retry_exhaustion_is_store_error() {
        let mut store = MockMemberStore::new();
        store.expect_find_one().returning(|_| Ok(None));
        store
            .expect_create()
            .times(3)
            .returning(|r| Err(DomainError::unique_violation("members_pkey", r.member_id().as_str())));

        let registry = registry_with(Arc::new(store), march());
        let err = registry.register(complete_input("陳大文")).await.unwrap_err();

        assert!(matches!(err, DomainError::Storage { .. }));
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[tokio::test]
    async fn test_exhausted_month_surfaces() {
        let store = Arc::new(InMemoryMemberStore::with_records(vec![record("M2403999", "甲")]));
        let registry = registry_with(store, march());

        let err = registry.register(complete_input("乙")).await.unwrap_err();
        assert!(matches!(err, DomainError::AllocationExhausted { .. }));
    }

    /// Holds the first two "latest identifier" reads until both have
    /// arrived, so both registrations derive the same identifier.
    struct RacingStore {
        inner: InMemoryMemberStore,
        gate: Barrier,
        gated_reads: AtomicUsize,
        violations: AtomicUsize,
    }

    #[async_trait]
    impl MemberStore for RacingStore {
        async fn create(&self, record: MemberRecord) -> Result<MemberRecord, DomainError> {
            let result = self.inner.create(record).await;
            if matches!(&result, Err(e) if e.is_unique_violation()) {
                self.violations.fetch_add(1, Ordering::SeqCst);
            }
            result
        }

        async fn find(&self, query: MemberQuery) -> Result<Vec<MemberRecord>, DomainError> {
            let result = self.inner.find(query.clone()).await;
            if matches!(query.filter, MemberFilter::IdPrefix(_))
                && self.gated_reads.fetch_add(1, Ordering::SeqCst) < 2
            {
                self.gate.wait().await;
            }
            result
        }

        async fn count(&self, filter: MemberFilter) -> Result<usize, DomainError> {
            self.inner.count(filter).await
        }

        async fn update_by_id(
            &self,
            id: &MemberId,
            patch: &ProfilePatch,
        ) -> Result<Option<MemberRecord>, DomainError> {
            self.inner.update_by_id(id, patch).await
        }
    }

    #[tokio::test]
    async fn test_simultaneous_registrations_get_distinct_ids() {
        let store = Arc::new(RacingStore {
            inner: InMemoryMemberStore::new(),
            gate: Barrier::new(2),
            gated_reads: AtomicUsize::new(0),
            violations: AtomicUsize::new(0),
        });
        let registry = registry_with(store.clone(), march());

        let (a, b) = tokio::join!(
            registry.register(complete_input("甲")),
            registry.register(complete_input("乙")),
        );

        let mut ids = vec![a.unwrap().to_string(), b.unwrap().to_string()];
        ids.sort();
        assert_eq!(ids, vec!["M2403001", "M2403002"]);
        assert_eq!(store.violations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_profile() {
        let store = Arc::new(InMemoryMemberStore::with_records(vec![record("M2403001", "陳大文")]));
        let registry = registry_with(store, march());

        let profile = registry.get_profile(&caller(Some("M2403001"))).await.unwrap();
        assert_eq!(profile.display_name(), "陳大文");

        let err = registry.get_profile(&caller(Some("M2403002"))).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        let err = registry.get_profile(&caller(None)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_profile_applies_only_allowed_fields() {
        let store = Arc::new(InMemoryMemberStore::with_records(vec![record("M2403001", "陳大文")]));
        let registry = registry_with(store, march());

        let fields = json!({
            "displayName": "Someone Else",
            "memberId": "M9912999",
            "createdAt": "1999-01-01T00:00:00Z",
            "role": "admin",
            "gender": "女",
            "familySize": 3,
        });
        let patch = match fields {
            serde_json::Value::Object(map) => ProfilePatch::from_fields(map).unwrap(),
            _ => unreachable!(),
        };

        let updated = registry
            .update_profile(&caller(Some("M2403001")), patch)
            .await
            .unwrap();

        assert_eq!(updated.member_id().as_str(), "M2403001");
        assert_eq!(updated.display_name(), "陳大文");
        assert_eq!(updated.gender(), Gender::Female);
        assert_eq!(updated.attribute("familySize"), Some(&json!(3)));
        assert!(updated.attribute("role").is_none());
        assert_eq!(updated.created_at(), record("M2403001", "陳大文").created_at());
    }

    #[tokio::test]
    async fn test_empty_patch_returns_current_record() {
        let mut store = MockMemberStore::new();
        store
            .expect_find_one()
            .times(1)
            .returning(|_| Ok(Some(record("M2403001", "陳大文"))));
        store.expect_update_by_id().times(0);

        let registry = registry_with(Arc::new(store), march());
        let current = registry
            .update_profile(&caller(Some("M2403001")), ProfilePatch::default())
            .await
            .unwrap();
        assert_eq!(current.display_name(), "陳大文");
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = Arc::new(InMemoryMemberStore::new());
        let registry = registry_with(store, march());

        let mut patch = ProfilePatch::default();
        patch.address = Some("新地址".to_string());

        let err = registry
            .update_profile(&caller(Some("M2403001")), patch)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search() {
        let store = Arc::new(InMemoryMemberStore::with_records(vec![
            record("M2403002", "李小明"),
            record("M2403001", "陳大文"),
            record("M2404001", "黃美玲"),
        ]));
        let registry = registry_with(store, march());

        let found = registry.search(Some("m2403")).await.unwrap();
        let ids: Vec<_> = found.iter().map(|s| s.member_id.as_str()).collect();
        assert_eq!(ids, vec!["M2403001", "M2403002"]);

        let by_name = registry.search(Some("美玲")).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].display_name, "黃美玲");

        assert!(registry.search(Some("nobody")).await.unwrap().is_empty());

        // whitespace is part of the term
        assert!(registry.search(Some(" 大文")).await.unwrap().is_empty());
        assert_eq!(registry.search(Some("大文")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_term_never_touches_store() {
        let registry = registry_with(Arc::new(MockMemberStore::new()), march());

        for term in [None, Some("")] {
            let err = registry.search(term).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation { .. }));
        }
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = Arc::new(InMemoryMemberStore::with_records(vec![record("M2403001", "陳大文")]));
        let registry = registry_with(store, march());

        assert!(registry.get("M2403001").await.is_ok());
        assert!(matches!(
            registry.get("M2403002").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            registry.get("garbage").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_pages() {
        let records = (1..=25)
            .map(|n| record(&format!("M2403{:03}", n), &format!("member {}", n)))
            .collect();
        let store = Arc::new(InMemoryMemberStore::with_records(records));
        let registry = registry_with(store, march());

        let page = registry.list(3, DEFAULT_PER_PAGE).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.current_page, 3);
        assert_eq!(page.members.len(), 5);
        assert_eq!(page.members[0].member_id().as_str(), "M2403021");

        let capped = registry.list(1, 1000).await.unwrap();
        assert_eq!(capped.members.len(), 25);
        assert_eq!(capped.pages, 1);

        assert!(registry.list(0, 10).await.is_err());
        assert!(registry.list(1, 0).await.is_err());

        let beyond = registry.list(usize::MAX, 10).await.unwrap_err();
        assert!(matches!(beyond, DomainError::Validation { .. }));
        let past_end = registry.list(4, DEFAULT_PER_PAGE).await.unwrap();
        assert!(past_end.members.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let store = Arc::new(InMemoryMemberStore::with_records(vec![
            record("M2403001", "甲"),
            record("M2403002", "乙"),
        ]));
        let registry = registry_with(store.clone(), march());

        let mut patch = ProfilePatch::default();
        patch.gender = Some(Gender::Female);
        patch.birth_year = Some(1950);
        patch
            .attributes
            .insert("district".to_string(), json!("深水埗"));
        store
            .update_by_id(&MemberId::new("M2403002").unwrap(), &patch)
            .await
            .unwrap();

        let stats = registry.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_gender["男"], 1);
        assert_eq!(stats.by_gender["女"], 1);
        assert_eq!(stats.by_economic_status["綜援家庭"], 2);
        assert_eq!(stats.by_residence_type["劏房"], 2);
        assert_eq!(stats.by_district.len(), 1);
        assert_eq!(stats.by_district["深水埗"], 1);
        assert_eq!(stats.by_age[&66], 1);
        assert_eq!(stats.by_age[&74], 1);
    }
}
