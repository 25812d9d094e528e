//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 프로세스 시작 시 설정으로부터 한 번 생성되고 `Arc`로 래핑되어
//! 요청 간에 공유됩니다. 저장소 외에는 변경 가능한 상태가 없습니다.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use account_core::{AccountStore, AuthConfig, StoreConfig, StoreError, StoreResult};
use axum::http::HeaderName;

use crate::auth::{TokenError, TokenService};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 계정 저장소
    pub store: Arc<dyn AccountStore>,

    /// 토큰 발급/검증 서비스
    pub tokens: Arc<TokenService>,

    /// Access Token을 담는 요청 헤더
    pub token_header: HeaderName,

    /// 모든 저장소 호출에 적용되는 타임아웃
    pub store_timeout: Duration,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

/// 상태 생성 에러.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("잘못된 토큰 헤더 이름: {0}")]
    InvalidHeader(String),
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// # 인자
    /// * `store` - 계정 저장소 구현
    /// * `auth` - 서명 키, 발급자, 만료 시간, 토큰 헤더
    /// * `store_config` - 저장소 호출 타임아웃
    pub fn new(
        store: Arc<dyn AccountStore>,
        auth: &AuthConfig,
        store_config: &StoreConfig,
    ) -> Result<Self, StateError> {
        let token_header = HeaderName::try_from(auth.token_header.trim())
            .map_err(|_| StateError::InvalidHeader(auth.token_header.clone()))?;

        Ok(Self {
            store,
            tokens: Arc::new(TokenService::new(auth)?),
            token_header,
            store_timeout: store_config.timeout(),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 저장소 호출에 공통 타임아웃 적용.
    ///
    /// 시간 초과 시 [`StoreError::Timeout`]을 반환합니다.
    pub async fn with_store_timeout<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout.as_secs())),
        }
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.with_store_timeout(self.store.ping()).await.is_ok()
    }

    /// 서버 업타임(초) 반환.
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 비밀 키.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

/// 테스트용 AppState 생성.
///
/// 인메모리 저장소와 고정된 비밀 키를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    let store: Arc<dyn AccountStore> = Arc::new(account_core::InMemoryAccountStore::new());
    AppState::new(
        store,
        &AuthConfig::with_secret(TEST_SECRET),
        &StoreConfig::default(),
    )
    .expect("test state must be valid")
}
