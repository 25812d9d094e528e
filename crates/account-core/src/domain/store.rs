//! 계정 저장소 추상화.
//!
//! 핸들러가 사용하는 영속성 연산만 노출하는 저장소 중립 인터페이스입니다.
//! PostgreSQL 구현은 `account-api`의 repository 모듈에, 테스트용 인메모리 구현은
//! [`super::memory`]에 있습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Account;
use crate::error::StoreResult;

/// 기본 페이지 크기.
pub const DEFAULT_RECORDS_PER_PAGE: u64 = 10;

/// 기본 페이지 번호 (1부터 시작).
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// 단일 필드 조회 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountFilter {
    Email(String),
    Phone(String),
    AccountId(String),
}

impl AccountFilter {
    /// 필드 이름 (로그용).
    pub fn field(&self) -> &'static str {
        match self {
            AccountFilter::Email(_) => "email",
            AccountFilter::Phone(_) => "phone",
            AccountFilter::AccountId(_) => "account_id",
        }
    }

    /// 비교 값.
    pub fn value(&self) -> &str {
        match self {
            AccountFilter::Email(v) | AccountFilter::Phone(v) | AccountFilter::AccountId(v) => v,
        }
    }

    /// 계정이 조건에 맞는지 확인.
    pub fn matches(&self, account: &Account) -> bool {
        match self {
            AccountFilter::Email(email) => &account.email == email,
            AccountFilter::Phone(phone) => &account.phone == phone,
            AccountFilter::AccountId(id) => &account.account_id == id,
        }
    }
}

/// 계정에 저장되는 토큰 쌍.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    pub token: String,
    pub refresh_token: String,
}

/// 페이지 조회 결과.
#[derive(Debug, Clone)]
pub struct AccountPage {
    /// 전체 계정 수 (페이지와 무관)
    pub total_count: u64,
    /// 요청 페이지의 계정 목록
    pub items: Vec<Account>,
}

/// 페이지 요청.
///
/// 파싱할 수 없거나 1보다 작은 값은 기본값으로 대체됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u64,
    pub records_per_page: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            records_per_page: DEFAULT_RECORDS_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// 쿼리 문자열 값에서 페이지 요청 생성.
    pub fn parse(page_number: Option<&str>, records_per_page: Option<&str>) -> Self {
        fn positive(raw: Option<&str>) -> Option<u64> {
            raw.and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v >= 1)
        }

        Self {
            page_number: positive(page_number).unwrap_or(DEFAULT_PAGE_NUMBER),
            records_per_page: positive(records_per_page).unwrap_or(DEFAULT_RECORDS_PER_PAGE),
        }
    }

    /// 건너뛸 레코드 수.
    pub fn skip(&self) -> u64 {
        (self.page_number - 1).saturating_mul(self.records_per_page)
    }

    /// 가져올 최대 레코드 수.
    pub fn limit(&self) -> u64 {
        self.records_per_page
    }
}

/// 계정 저장소 trait.
///
/// 모든 목록 조회는 `(created_at, account_id)` 오름차순을 따라야 합니다.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// 조건에 맞는 계정 수.
    async fn count(&self, filter: &AccountFilter) -> StoreResult<u64>;

    /// 계정 추가.
    ///
    /// # Errors
    ///
    /// - `StoreError::Duplicate`: 이메일 또는 전화번호 중복
    async fn insert(&self, account: &Account) -> StoreResult<()>;

    /// 조건에 맞는 첫 계정.
    async fn find_one(&self, filter: &AccountFilter) -> StoreResult<Option<Account>>;

    /// 토큰 쌍과 `updated_at` 갱신.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound`: 해당 식별자의 계정이 없음
    async fn update_tokens(
        &self,
        account_id: &str,
        tokens: &SessionTokens,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// 저장된 Refresh Token이 `expected_refresh_token`과 같을 때만 토큰 쌍을 교체.
    ///
    /// 비교와 교체는 하나의 원자적 연산입니다. 같은 토큰으로 동시에 들어온
    /// 요청 중 하나만 성공합니다.
    ///
    /// # Errors
    ///
    /// - `StoreError::Superseded`: 저장된 토큰이 다름 (이미 교체되었거나 계정 없음)
    async fn rotate_tokens(
        &self,
        account_id: &str,
        expected_refresh_token: &str,
        tokens: &SessionTokens,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// 전체 수와 함께 한 페이지 조회.
    async fn list_page(&self, skip: u64, limit: u64) -> StoreResult<AccountPage>;

    /// 저장소 연결 상태 확인.
    async fn ping(&self) -> StoreResult<()>;
}
