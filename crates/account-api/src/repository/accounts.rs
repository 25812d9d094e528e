//! Accounts Repository
//!
//! PostgreSQL 기반 [`AccountStore`] 구현입니다.

use std::time::Duration;

use account_core::{
    Account, AccountFilter, AccountPage, AccountStore, DatabaseConfig, Role, SessionTokens,
    StoreError, StoreResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use tracing::info;

// ================================================================================================
// Schema
// ================================================================================================

const CREATE_ACCOUNTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS accounts (
        account_id    TEXT PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        phone         TEXT NOT NULL UNIQUE,
        first_name    TEXT NOT NULL,
        last_name     TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL CHECK (role IN ('ADMIN', 'USER')),
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL,
        token         TEXT,
        refresh_token TEXT
    )
"#;

const CREATE_LISTING_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS idx_accounts_created_at_id
        ON accounts (created_at, account_id)
"#;

const ACCOUNT_COLUMNS: &str = "account_id, email, phone, first_name, last_name, password_hash, \
                               role, created_at, updated_at, token, refresh_token";

// ================================================================================================
// Types
// ================================================================================================

/// accounts 테이블 레코드
#[derive(Debug, Clone, FromRow)]
struct AccountRecord {
    account_id: String,
    email: String,
    phone: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    token: Option<String>,
    #[sqlx(default)]
    refresh_token: Option<String>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = StoreError;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let role = Role::parse(&record.role).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "account {} has unknown role {:?}",
                record.account_id, record.role
            ))
        })?;

        Ok(Account {
            account_id: record.account_id,
            email: record.email,
            phone: record.phone,
            first_name: record.first_name,
            last_name: record.last_name,
            password_hash: record.password_hash,
            role,
            created_at: record.created_at,
            updated_at: record.updated_at,
            token: record.token,
            refresh_token: record.refresh_token,
        })
    }
}

/// sqlx 에러를 저장소 에러로 변환. 고유 제약 위반은 `Duplicate`.
fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Duplicate(db.constraint().unwrap_or("unique").to_string());
        }
    }
    StoreError::Backend(e.to_string())
}

/// 필터 컬럼명. `AccountFilter::field`는 컬럼명과 같은 고정 문자열입니다.
fn where_clause(filter: &AccountFilter) -> String {
    format!("WHERE {} = $1", filter.field())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

// ================================================================================================
// Repository
// ================================================================================================

/// PostgreSQL 계정 저장소
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// 기존 연결 풀로 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 설정으로 연결 풀을 만들고 연결을 확인합니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(config.url.expose_secret())
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!(max_connections = config.max_connections, "데이터베이스 연결 완료");

        Ok(Self { pool })
    }

    /// accounts 테이블과 목록 인덱스 생성 (이미 있으면 무시).
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_ACCOUNTS_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_LISTING_INDEX).execute(&self.pool).await?;
        info!("accounts 스키마 확인 완료");
        Ok(())
    }

    /// 내부 연결 풀.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn count(&self, filter: &AccountFilter) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM accounts {}", where_clause(filter));
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(filter.value())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn insert(&self, account: &Account) -> StoreResult<()> {
        let sql = format!(
            "INSERT INTO accounts ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        );
        sqlx::query(&sql)
            .bind(&account.account_id)
            .bind(&account.email)
            .bind(&account.phone)
            .bind(&account.first_name)
            .bind(&account.last_name)
            .bind(&account.password_hash)
            .bind(account.role.as_str())
            .bind(account.created_at)
            .bind(account.updated_at)
            .bind(&account.token)
            .bind(&account.refresh_token)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_one(&self, filter: &AccountFilter) -> StoreResult<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts {} LIMIT 1",
            where_clause(filter)
        );
        let record = sqlx::query_as::<_, AccountRecord>(&sql)
            .bind(filter.value())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        record.map(Account::try_from).transpose()
    }

    async fn update_tokens(
        &self,
        account_id: &str,
        tokens: &SessionTokens,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET token = $1, refresh_token = $2, updated_at = $3
            WHERE account_id = $4
            "#,
        )
        .bind(&tokens.token)
        .bind(&tokens.refresh_token)
        .bind(now)
        .bind(account_id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(account_id.to_string()));
        }
        Ok(())
    }

    async fn rotate_tokens(
        &self,
        account_id: &str,
        expected_refresh_token: &str,
        tokens: &SessionTokens,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        // 조건부 UPDATE 한 번으로 비교와 교체를 처리
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET token = $1, refresh_token = $2, updated_at = $3
            WHERE account_id = $4 AND refresh_token = $5
            "#,
        )
        .bind(&tokens.token)
        .bind(&tokens.refresh_token)
        .bind(now)
        .bind(account_id)
        .bind(expected_refresh_token)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Superseded(account_id.to_string()));
        }
        Ok(())
    }

    async fn list_page(&self, skip: u64, limit: u64) -> StoreResult<AccountPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             ORDER BY created_at, account_id OFFSET $1 LIMIT $2"
        );
        let records = sqlx::query_as::<_, AccountRecord>(&sql)
            .bind(to_i64(skip))
            .bind(to_i64(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        let items = records
            .into_iter()
            .map(Account::try_from)
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(AccountPage {
            total_count: u64::try_from(total).unwrap_or(0),
            items,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
