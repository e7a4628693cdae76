//! Member record store trait

use async_trait::async_trait;

use super::entity::MemberRecord;
use super::id::MemberId;
use super::patch::ProfilePatch;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Which records a query selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberFilter {
    All,
    MemberId(MemberId),
    /// Exact display-name match
    DisplayName(String),
    /// Identifiers starting with the given prefix
    IdPrefix(String),
    /// Case-insensitive substring over identifier or display name
    Keyword(String),
}

impl MemberFilter {
    /// Evaluate the filter against a record
    pub fn matches(&self, record: &MemberRecord) -> bool {
        match self {
            Self::All => true,
            Self::MemberId(id) => record.member_id() == id,
            Self::DisplayName(name) => record.display_name() == name,
            Self::IdPrefix(prefix) => record.member_id().as_str().starts_with(prefix.as_str()),
            Self::Keyword(term) => {
                let term = term.to_lowercase();
                record.member_id().as_str().to_lowercase().contains(&term)
                    || record.display_name().to_lowercase().contains(&term)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MemberSort {
    #[default]
    IdAsc,
    IdDesc,
    CreatedAtAsc,
}

/// A filtered, ordered, windowed read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberQuery {
    pub filter: MemberFilter,
    pub sort: MemberSort,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl MemberQuery {
    pub fn new(filter: MemberFilter) -> Self {
        Self {
            filter,
            sort: MemberSort::default(),
            skip: 0,
            limit: None,
        }
    }

    pub fn sorted(mut self, sort: MemberSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Persistence for member records.
///
/// Implementations must reject a second record with an existing identifier
/// with [`DomainError::UniqueViolation`]; the registry relies on that to
/// resolve concurrent allocations.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert a new record
    async fn create(&self, record: MemberRecord) -> Result<MemberRecord, DomainError>;

    /// Records matching the query, in the requested order
    async fn find(&self, query: MemberQuery) -> Result<Vec<MemberRecord>, DomainError>;

    /// First record matching the query
    async fn find_one(&self, query: MemberQuery) -> Result<Option<MemberRecord>, DomainError> {
        Ok(self.find(query.limit(1)).await?.into_iter().next())
    }

    /// Number of records matching the filter
    async fn count(&self, filter: MemberFilter) -> Result<usize, DomainError>;

    /// Apply a patch to one record, returning the updated record or `None`
    /// when no record has that identifier
    async fn update_by_id(
        &self,
        id: &MemberId,
        patch: &ProfilePatch,
    ) -> Result<Option<MemberRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::member::fixtures::record;

    #[test]
    fn test_filter_matches() {
        let member = record("M2403007", "陳大文");

        assert!(MemberFilter::All.matches(&member));
        assert!(MemberFilter::IdPrefix("M2403".into()).matches(&member));
        assert!(!MemberFilter::IdPrefix("M2404".into()).matches(&member));
        assert!(MemberFilter::DisplayName("陳大文".into()).matches(&member));
        assert!(!MemberFilter::DisplayName("陳大".into()).matches(&member));
        assert!(MemberFilter::Keyword("m2403".into()).matches(&member));
        assert!(MemberFilter::Keyword("大".into()).matches(&member));
        assert!(!MemberFilter::Keyword("M2404".into()).matches(&member));
    }

    #[test]
    fn test_query_builder() {
        let query = MemberQuery::new(MemberFilter::All)
            .sorted(MemberSort::IdDesc)
            .skip(20)
            .limit(10);

        assert_eq!(query.sort, MemberSort::IdDesc);
        assert_eq!(query.skip, 20);
        assert_eq!(query.limit, Some(10));
    }

    #[tokio::test]
    async fn test_find_one_uses_limit() {
        let mut store = MockMemberStore::new();
        store
            .expect_find()
            .withf(|q| q.limit == Some(1))
            .times(1)
            .returning(|_| Ok(vec![record("M2403001", "陳大文")]));

        // automock replaces provided methods too, so exercise the default body
        // through a thin wrapper
        struct Wrapper(MockMemberStore);

        #[async_trait]
        impl MemberStore for Wrapper {
            async fn create(&self, record: MemberRecord) -> Result<MemberRecord, DomainError> {
                self.0.create(record).await
            }
            async fn find(&self, query: MemberQuery) -> Result<Vec<MemberRecord>, DomainError> {
                self.0.find(query).await
            }
            async fn count(&self, filter: MemberFilter) -> Result<usize, DomainError> {
                self.0.count(filter).await
            }
            async fn update_by_id(
                &self,
                id: &MemberId,
                patch: &ProfilePatch,
            ) -> Result<Option<MemberRecord>, DomainError> {
                self.0.update_by_id(id, patch).await
            }
        }

        let found = Wrapper(store)
            .find_one(MemberQuery::new(MemberFilter::All))
            .await
            .unwrap();
        assert_eq!(found.unwrap().member_id().as_str(), "M2403001");
    }
}
