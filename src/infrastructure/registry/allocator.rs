//! Month-scoped sequential member ID allocation

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};

use crate::domain::member::{
    MAX_SEQUENCE, MemberFilter, MemberId, MemberQuery, MemberSort, MemberStore, MonthPrefix,
};
use crate::domain::DomainError;

/// Derives the next identifier from the highest one already stored for the
/// current month.
///
/// Two callers may derive the same identifier; the store's uniqueness
/// constraint decides which one wins.
pub struct IdentifierAllocator<S: MemberStore> {
    store: Arc<S>,
    offset: FixedOffset,
}

impl<S: MemberStore> IdentifierAllocator<S> {
    pub fn new(store: Arc<S>, offset: FixedOffset) -> Self {
        Self { store, offset }
    }

    pub async fn next_id(&self, now: DateTime<Utc>) -> Result<MemberId, DomainError> {
        let prefix = MonthPrefix::for_instant(now, self.offset);

        let latest = self
            .store
            .find_one(
                MemberQuery::new(MemberFilter::IdPrefix(prefix.as_str().to_string()))
                    .sorted(MemberSort::IdDesc),
            )
            .await?;

        let next = match latest {
            Some(record) => record.member_id().sequence() + 1,
            None => 1,
        };

        if next > MAX_SEQUENCE {
            return Err(DomainError::allocation_exhausted(prefix.as_str()));
        }

        Ok(prefix.member_id(next)?)
    }
}
