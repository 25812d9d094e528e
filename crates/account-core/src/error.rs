//! 계정 저장소 에러 타입.
//!
//! 영속성 계층에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 저장소 작업 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 고유 제약 위반 (이메일/전화번호 중복)
    #[error("중복 레코드: {0}")]
    Duplicate(String),

    /// 대상 레코드 없음
    #[error("레코드를 찾을 수 없음: {0}")]
    NotFound(String),

    /// 기대한 Refresh Token이 이미 교체됨
    #[error("이미 교체된 토큰: {0}")]
    Superseded(String),

    /// 저장소 호출 타임아웃
    #[error("저장소 타임아웃 ({0}초)")]
    Timeout(u64),

    /// 저장된 데이터 해석 실패
    #[error("잘못된 레코드: {0}")]
    Corrupt(String),

    /// 백엔드 에러
    #[error("데이터베이스 에러: {0}")]
    Backend(String),
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// 고유 제약 위반인지 확인합니다.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }

    /// 토큰 교체 경합에서 진 경우인지 확인합니다.
    pub fn is_superseded(&self) -> bool {
        matches!(self, StoreError::Superseded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_duplicate() {
        assert!(StoreError::Duplicate("email".to_string()).is_duplicate());
        assert!(!StoreError::Timeout(10).is_duplicate());
    }

    #[test]
    fn test_is_superseded() {
        assert!(StoreError::Superseded("acct-1".to_string()).is_superseded());
        assert!(!StoreError::NotFound("acct-1".to_string()).is_superseded());
    }

    #[test]
    fn test_timeout_message() {
        assert_eq!(StoreError::Timeout(10).to_string(), "저장소 타임아웃 (10초)");
    }
}
