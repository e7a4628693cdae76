//! PostgreSQL member store with connection pooling

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};

use crate::domain::DomainError;
use crate::domain::member::{
    ClosedSet, EconomicStatus, Gender, IdStatus, MaritalStatus, MemberFilter, MemberId,
    MemberQuery, MemberRecord, MemberSort, MemberStore, NewMember, ProfilePatch, ResidenceType,
};

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/member_intake".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    /// Open a connection pool
    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
    }
}

const MEMBER_COLUMNS: &str = "member_id, display_name, english_name, birth_year, gender, \
     id_status, economic_status, phone, address, residence_type, marital_status, attributes, \
     created_at, updated_at";

/// PostgreSQL implementation of [`MemberStore`]
///
/// `member_id` is the primary key, so two writers that allocated the same
/// identifier cannot both succeed.
#[derive(Debug, Clone)]
pub struct PostgresMemberStore {
    pool: PgPool,
}

impl PostgresMemberStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MemberStore for PostgresMemberStore {
    async fn create(&self, record: MemberRecord) -> Result<MemberRecord, DomainError> {
        let attributes = serde_json::to_value(record.attributes())
            .map_err(|e| DomainError::storage(format!("Failed to serialize attributes: {}", e)))?;

        sqlx::query(&format!(
            "INSERT INTO members ({MEMBER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(record.member_id().as_str())
        .bind(record.display_name())
        .bind(record.english_name())
        .bind(record.birth_year())
        .bind(record.gender().as_str())
        .bind(record.id_status().as_str())
        .bind(record.economic_status().as_str())
        .bind(record.phone())
        .bind(record.address())
        .bind(record.residence_type().as_str())
        .bind(record.marital_status().as_str())
        .bind(&attributes)
        .bind(record.created_at())
        .bind(record.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => DomainError::unique_violation(
                db.constraint().unwrap_or("members_pkey"),
                record.member_id().as_str(),
            ),
            _ => DomainError::storage(format!("Failed to create member: {}", e)),
        })?;

        Ok(record)
    }

    async fn find(&self, query: MemberQuery) -> Result<Vec<MemberRecord>, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {MEMBER_COLUMNS} FROM members"
        ));
        push_filter(&mut builder, &query.filter);

        builder.push(match query.sort {
            MemberSort::IdAsc => " ORDER BY member_id ASC",
            MemberSort::IdDesc => " ORDER BY member_id DESC",
            MemberSort::CreatedAtAsc => " ORDER BY created_at ASC, member_id ASC",
        });

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ").push_bind(to_sql_count(limit, "limit")?);
        }
        builder
            .push(" OFFSET ")
            .push_bind(to_sql_count(query.skip, "offset")?);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to query members: {}", e)))?;

        rows.iter().map(row_to_member).collect()
    }

    async fn count(&self, filter: MemberFilter) -> Result<usize, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM members");
        push_filter(&mut builder, &filter);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count members: {}", e)))?;

        Ok(count as usize)
    }

    async fn update_by_id(
        &self,
        id: &MemberId,
        patch: &ProfilePatch,
    ) -> Result<Option<MemberRecord>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = $1 FOR UPDATE"
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to load member: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut record = row_to_member(&row)?;
        record.apply_patch(patch, Utc::now());

        let attributes = serde_json::to_value(record.attributes())
            .map_err(|e| DomainError::storage(format!("Failed to serialize attributes: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE members
            SET birth_year = $2, gender = $3, id_status = $4, economic_status = $5,
                phone = $6, address = $7, residence_type = $8, marital_status = $9,
                attributes = $10, updated_at = $11
            WHERE member_id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(record.birth_year())
        .bind(record.gender().as_str())
        .bind(record.id_status().as_str())
        .bind(record.economic_status().as_str())
        .bind(record.phone())
        .bind(record.address())
        .bind(record.residence_type().as_str())
        .bind(record.marital_status().as_str())
        .bind(&attributes)
        .bind(record.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update member: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit update: {}", e)))?;

        Ok(Some(record))
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MemberFilter) {
    match filter {
        MemberFilter::All => {}
        MemberFilter::MemberId(id) => {
            builder
                .push(" WHERE member_id = ")
                .push_bind(id.as_str().to_string());
        }
        MemberFilter::DisplayName(name) => {
            builder.push(" WHERE display_name = ").push_bind(name.clone());
        }
        MemberFilter::IdPrefix(prefix) => {
            builder
                .push(" WHERE member_id LIKE ")
                .push_bind(format!("{}%", escape_like(prefix)));
        }
        MemberFilter::Keyword(term) => {
            let pattern = format!("%{}%", escape_like(term));
            builder
                .push(" WHERE (member_id ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR display_name ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_sql_count(value: usize, what: &str) -> Result<i64, DomainError> {
    i64::try_from(value).map_err(|_| DomainError::validation(format!("{} is out of range", what)))
}

fn row_to_member(row: &PgRow) -> Result<MemberRecord, DomainError> {
    let member_id: String = row.get("member_id");
    let attributes: serde_json::Value = row.get("attributes");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let member_id = MemberId::new(member_id)
        .map_err(|e| DomainError::storage(format!("Invalid member ID in database: {}", e)))?;

    let attributes: BTreeMap<String, serde_json::Value> = serde_json::from_value(attributes)
        .map_err(|e| DomainError::storage(format!("Invalid attributes in database: {}", e)))?;

    let member = NewMember {
        display_name: row.get("display_name"),
        english_name: row.get("english_name"),
        birth_year: row.get("birth_year"),
        gender: column_choice::<Gender>(row, "gender")?,
        id_status: column_choice::<IdStatus>(row, "id_status")?,
        economic_status: column_choice::<EconomicStatus>(row, "economic_status")?,
        phone: row.get("phone"),
        address: row.get("address"),
        residence_type: column_choice::<ResidenceType>(row, "residence_type")?,
        marital_status: column_choice::<MaritalStatus>(row, "marital_status")?,
    };

    Ok(MemberRecord::restore(
        member_id, member, attributes, created_at, updated_at,
    ))
}

fn column_choice<T: ClosedSet>(row: &PgRow, column: &str) -> Result<T, DomainError> {
    let value: String = row.get(column);
    T::parse(&value)
        .map_err(|e| DomainError::storage(format!("Invalid {} in database: {}", column, e)))
}
