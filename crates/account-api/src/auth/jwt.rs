//! JWT 토큰 처리.
//!
//! Access Token 및 Refresh Token 발급/검증 로직.
//!
//! 서명 키와 만료 정책은 [`TokenService`]가 소유하며, 프로세스 시작 시 한 번 생성되어
//! `AppState`를 통해 공유됩니다. 만료 검사는 호출자가 넘긴 시각 기준으로 수행되므로
//! `*_at` 변형으로 시계를 고정해 테스트할 수 있습니다.

use account_core::{AuthConfig, Identity, Role, SessionTokens};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::ToSchema;

/// 발급 시 사용하는 서명 알고리즘.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// 검증 시 허용하는 알고리즘 (HMAC 계열만).
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Refresh Token의 `token_type` 값.
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// 사용자 역할
    pub role: Role,
    /// 계정 식별자
    pub uid: String,
    /// Issuer
    pub iss: String,
    /// Issued At - 토큰 발급 시간 (Unix timestamp)
    pub iat: i64,
    /// Expiration - 토큰 만료 시간 (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// 클레임에서 신원 정보 복원.
    pub fn identity(&self) -> Identity {
        Identity {
            account_id: self.uid.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

/// Refresh Token 페이로드.
///
/// 계정 식별자(`sub`)에 묶여 있어 다른 계정의 토큰 갱신에 쓸 수 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - 계정 식별자
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    /// JWT ID
    pub jti: String,
    /// 항상 "refresh"
    pub token_type: String,
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    /// Access Token
    pub access_token: String,
    /// Refresh Token
    pub refresh_token: String,
    /// Access Token 만료 시간 (초)
    pub expires_in: i64,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
}

impl From<&TokenPair> for SessionTokens {
    fn from(pair: &TokenPair) -> Self {
        Self {
            token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
        }
    }
}

/// 토큰 발급/검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("signing secret must not be empty")]
    EmptySecret,
    #[error("token lifetime of {0} hours is out of range")]
    InvalidTtl(i64),
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error("the token is malformed")]
    Malformed,
    #[error("the token signature is invalid")]
    InvalidSignature,
    #[error("the token algorithm is not accepted")]
    InvalidAlgorithm,
    #[error("the token issuer is invalid")]
    InvalidIssuer,
    #[error("the token is expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                TokenError::InvalidAlgorithm
            }
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        }
    }
}

/// 토큰 발급/검증 서비스.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn ttl(hours: i64) -> Result<Duration, TokenError> {
    Duration::try_hours(hours)
        .filter(|ttl| *ttl > Duration::zero())
        .ok_or(TokenError::InvalidTtl(hours))
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, TokenError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| TokenError::Signing("expiry is out of range".to_string()))
}

impl TokenService {
    /// 인증 설정으로 서비스 생성.
    ///
    /// # Errors
    ///
    /// - 비밀 키가 비어 있으면 [`TokenError::EmptySecret`]
    /// - 유효 시간이 0 이하이거나 표현 범위를 넘으면 [`TokenError::InvalidTtl`]
    pub fn new(config: &AuthConfig) -> Result<Self, TokenError> {
        let secret = config.secret_key.expose_secret();
        if secret.trim().is_empty() {
            return Err(TokenError::EmptySecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_ttl: ttl(config.access_ttl_hours)?,
            refresh_ttl: ttl(config.refresh_ttl_hours)?,
        })
    }

    /// 발급자 이름.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// 현재 시각 기준으로 토큰 쌍 발급.
    pub fn issue_token_pair(&self, identity: &Identity) -> Result<TokenPair, TokenError> {
        self.issue_token_pair_at(identity, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 쌍 발급.
    pub fn issue_token_pair_at(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let iat = now.timestamp();

        let access_claims = Claims {
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role,
            uid: identity.account_id.clone(),
            iss: self.issuer.clone(),
            iat,
            exp: expiry(now, self.access_ttl)?,
        };
        let refresh_claims = RefreshClaims {
            sub: identity.account_id.clone(),
            iss: self.issuer.clone(),
            iat,
            exp: expiry(now, self.refresh_ttl)?,
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: REFRESH_TOKEN_TYPE.to_string(),
        };

        Ok(TokenPair {
            access_token: self.sign(&access_claims)?,
            refresh_token: self.sign(&refresh_claims)?,
            expires_in: self.access_ttl.num_seconds(),
            token_type: "Bearer".to_string(),
        })
    }

    /// 현재 시각 기준으로 Access Token 검증.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// 지정한 시각 기준으로 Access Token 검증.
    ///
    /// `exp < now`이면 만료로 판정합니다 (유예 시간 없음).
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let claims: Claims = self.verify(token)?;
        if claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// 현재 시각 기준으로 Refresh Token 검증.
    pub fn validate_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.validate_refresh_at(token, Utc::now())
    }

    /// 지정한 시각 기준으로 Refresh Token 검증.
    pub fn validate_refresh_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.verify(token)?;
        if claims.token_type != REFRESH_TOKEN_TYPE {
            return Err(TokenError::Malformed);
        }
        if claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// 서명, 알고리즘, 발급자 검증. 만료는 호출자가 확인합니다.
    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        let header = decode_header(token)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::InvalidAlgorithm);
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "iss".to_string()]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let data = decode::<T>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
