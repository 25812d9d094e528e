//! 역할 기반 접근 정책.
//!
//! - `ADMIN`은 모든 계정을 조회할 수 있습니다.
//! - `USER`는 자기 계정만 조회할 수 있습니다.

use account_core::{Identity, Role};

/// 접근 거부 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unauthorized to access the resources")]
pub struct AccessError;

/// 요청자가 정확히 `required` 역할인지 확인.
pub fn require_role(identity: &Identity, required: Role) -> Result<(), AccessError> {
    if identity.role == required {
        Ok(())
    } else {
        Err(AccessError)
    }
}

/// 요청자가 대상 계정 본인이거나 `USER`보다 넓은 역할인지 확인.
pub fn require_self_or_role(identity: &Identity, target_account_id: &str) -> Result<(), AccessError> {
    match identity.role {
        Role::User if identity.account_id != target_account_id => Err(AccessError),
        _ => Ok(()),
    }
}
