//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트는 실패 시 `{"error": "<메시지>"}` 형식으로 응답합니다.
//!
//! | 변형 | 상태 코드 |
//! |---|---|
//! | [`ApiError::Validation`] | 400 |
//! | [`ApiError::Unauthorized`] | 401 |
//! | [`ApiError::NotFound`] | 404 |
//! | [`ApiError::Conflict`] | 409 |
//! | [`ApiError::Internal`] | 500 |

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationErrors;

/// 에러 응답 본문.
///
/// ```json
/// { "error": "User not found" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 사람이 읽을 수 있는 에러 메시지
    pub error: String,
}

/// API 핸들러 에러.
///
/// 500 계열 메시지는 호출자에게 일반 문구만 노출하며, 상세 원인은 핸들러에서 로그로 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `validator` 필드 에러를 `"; "`로 이어 붙인 400 에러.
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let mut messages = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect::<Vec<_>>();
        // HashMap 순회 순서와 무관하게 고정된 메시지
        messages.sort();
        ApiError::Validation(messages.join("; "))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ApiErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
