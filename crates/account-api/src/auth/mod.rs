//! 인증 및 권한 부여.
//!
//! 토큰 기반 인증과 역할 기반 접근 정책을 제공합니다.
//!
//! # 구성 요소
//!
//! - [`hash_password`] / [`verify_password`]: Argon2id 비밀번호 해싱
//! - [`TokenService`]: Access/Refresh Token 발급 및 검증
//! - [`authenticate`]: 토큰 헤더를 검증하는 미들웨어, [`AuthUser`] 추출기
//! - [`require_role`] / [`require_self_or_role`]: 역할 정책
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn list(AuthUser(identity): AuthUser) -> ApiResult<Json<Vec<AccountView>>> {
//!     require_role(&identity, Role::Admin)
//!         .map_err(|_| ApiError::Unauthorized("User type not matched".into()))?;
//!     // ...
//! }
//! ```

mod jwt;
mod middleware;
mod password;
mod roles;

pub use jwt::{Claims, RefreshClaims, TokenError, TokenPair, TokenService};
pub use middleware::{authenticate, AuthUser, MISSING_TOKEN_MESSAGE};
pub use password::{hash_password, verify_password, PasswordError};
pub use roles::{require_role, require_self_or_role, AccessError};
