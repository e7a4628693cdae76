//! PostgreSQL account repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::account::{AccountId, AccountRecord, AccountRepository, AccountRole};
use crate::domain::member::MemberId;
use crate::domain::DomainError;

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, full_name, phone, address, role, member_id, created_at";

/// PostgreSQL implementation of AccountRepository
#[derive(Debug, Clone)]
pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by(
        &self,
        column: &str,
        value: &str,
    ) -> Result<Option<AccountRecord>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get account: {}", e)))?;

        row.as_ref().map(row_to_account).transpose()
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn get(&self, id: &AccountId) -> Result<Option<AccountRecord>, DomainError> {
        self.fetch_by("id", id.as_str()).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<AccountRecord>, DomainError> {
        self.fetch_by("username", username).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<AccountRecord>, DomainError> {
        self.fetch_by("email", email).await
    }

    async fn get_by_member_id(
        &self,
        member_id: &MemberId,
    ) -> Result<Option<AccountRecord>, DomainError> {
        self.fetch_by("member_id", member_id.as_str()).await
    }

    async fn create(&self, account: AccountRecord) -> Result<AccountRecord, DomainError> {
        sqlx::query(&format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(account.id().as_str())
        .bind(account.username())
        .bind(account.email())
        .bind(account.password_hash())
        .bind(account.full_name())
        .bind(account.phone())
        .bind(account.address())
        .bind(account.role().as_str())
        .bind(account.member_id().map(|m| m.as_str()))
        .bind(account.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                let constraint = db.constraint().unwrap_or_default();
                if constraint.contains("username") {
                    DomainError::conflict(format!(
                        "Username '{}' already exists",
                        account.username()
                    ))
                } else if constraint.contains("email") {
                    DomainError::conflict(format!("Email '{}' already exists", account.email()))
                } else if constraint.contains("member_id") {
                    DomainError::conflict(format!(
                        "Member '{}' is already linked to an account",
                        account.member_id().map(|m| m.as_str()).unwrap_or_default()
                    ))
                } else {
                    DomainError::conflict(format!(
                        "Account with ID '{}' already exists",
                        account.id()
                    ))
                }
            }
            _ => DomainError::storage(format!("Failed to create account: {}", e)),
        })?;

        Ok(account)
    }
}

fn row_to_account(row: &sqlx::postgres::PgRow) -> Result<AccountRecord, DomainError> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let member_id: Option<String> = row.get("member_id");

    let id = AccountId::new(id)
        .map_err(|e| DomainError::storage(format!("Invalid account ID in database: {}", e)))?;
    let role: AccountRole = role
        .parse()
        .map_err(|e| DomainError::storage(format!("Invalid role in database: {}", e)))?;
    let member_id = member_id
        .map(MemberId::new)
        .transpose()
        .map_err(|e| DomainError::storage(format!("Invalid member ID in database: {}", e)))?;

    Ok(AccountRecord::new(
        id,
        row.get::<String, _>("username"),
        row.get::<String, _>("email"),
        row.get::<String, _>("password_hash"),
        row.get::<String, _>("full_name"),
    )
    .with_phone(row.get("phone"))
    .with_address(row.get("address"))
    .with_role(role)
    .with_member_id(member_id)
    .with_created_at(row.get("created_at")))
}
