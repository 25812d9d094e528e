//! 계정 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// 저장된 사용자 계정.
///
/// 가입 시 생성되고, 로그인/토큰 갱신 시 토큰 필드와 `updated_at`만 변경됩니다.
/// 이메일과 전화번호는 전체 계정에서 고유해야 합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// 불투명 계정 식별자 (UUID v4 문자열)
    pub account_id: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 마지막으로 발급된 Access Token
    pub token: Option<String>,
    /// 마지막으로 발급된 Refresh Token
    pub refresh_token: Option<String>,
}

/// 가입 시 입력되는 프로필 정보.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl Account {
    /// 새 계정 생성.
    ///
    /// 식별자를 할당하고 생성/수정 시간을 `now`로 설정합니다. 토큰은 비어 있습니다.
    pub fn new(profile: NewAccount, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            account_id: Uuid::new_v4().to_string(),
            email: profile.email,
            phone: profile.phone,
            first_name: profile.first_name,
            last_name: profile.last_name,
            password_hash,
            role: profile.role,
            created_at: now,
            updated_at: now,
            token: None,
            refresh_token: None,
        }
    }

    /// 토큰에 담길 신원 정보 추출.
    pub fn identity(&self) -> Identity {
        Identity {
            account_id: self.account_id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

/// 인증된 요청자의 신원.
///
/// Access Token 클레임에서 복원되어 요청 범위 컨텍스트에 주입됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub account_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}
