//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//!
//! 로드 순서 (뒤에 오는 소스가 우선):
//! 1. 기본값
//! 2. `config/default.toml` (선택)
//! 3. `ACCOUNTS__<SECTION>__<KEY>` 환경 변수
//! 4. `DATABASE_URL`, `SECRET_KEY`, `PORT` 환경 변수

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 토큰 유효 시간 상한 (10년).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 토큰 인증 설정
    pub auth: AuthConfig,
    /// 저장소 호출 설정
    pub store: StoreConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 연결 문자열
    pub url: SecretString,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
}

/// 토큰 인증 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC 서명 비밀 키
    pub secret_key: SecretString,
    /// 토큰 발급자 (`iss`)
    pub issuer: String,
    /// Access Token 유효 시간 (시간)
    pub access_ttl_hours: i64,
    /// Refresh Token 유효 시간 (시간)
    pub refresh_ttl_hours: i64,
    /// 토큰을 담는 요청 헤더 이름
    pub token_header: String,
}

impl AuthConfig {
    /// 비밀 키만 지정하고 나머지는 기본값으로 생성합니다.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret.into().into_boxed_str()),
            issuer: "accounts".to_string(),
            access_ttl_hours: 24,
            refresh_ttl_hours: 48,
            token_header: "token".to_string(),
        }
    }
}

/// 저장소 호출 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// 모든 저장소 호출에 적용되는 타임아웃 (초)
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// 타임아웃을 `Duration`으로 반환합니다.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 연결 문자열 또는 서명 키가 없거나 비어 있으면 에러를 반환합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_secs", 10)?
            .set_default("auth.issuer", "accounts")?
            .set_default("auth.access_ttl_hours", 24)?
            .set_default("auth.refresh_ttl_hours", 48)?
            .set_default("auth.token_header", "token")?
            .set_default("store.timeout_secs", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드 (없어도 됨)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("ACCOUNTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.secret_key", std::env::var("SECRET_KEY").ok())?
            .set_override_option(
                "server.port",
                std::env::var("PORT").ok().and_then(|p| p.parse::<i64>().ok()),
            )?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.database.url.expose_secret().trim().is_empty() {
            return Err(config::ConfigError::Message(
                "database.url (DATABASE_URL) must not be empty".to_string(),
            ));
        }
        if self.auth.secret_key.expose_secret().trim().is_empty() {
            return Err(config::ConfigError::Message(
                "auth.secret_key (SECRET_KEY) must not be empty".to_string(),
            ));
        }
        let ttl_range = 1..=MAX_TOKEN_TTL_HOURS;
        if !ttl_range.contains(&self.auth.access_ttl_hours)
            || !ttl_range.contains(&self.auth.refresh_ttl_hours)
        {
            return Err(config::ConfigError::Message(format!(
                "token TTLs must be between 1 and {MAX_TOKEN_TTL_HOURS} hours"
            )));
        }
        if self.auth.token_header.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "auth.token_header must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
