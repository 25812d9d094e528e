//! 토큰 보호 확인용 데모 endpoint.
//!
//! - `GET /api-1`
//! - `GET /api-2`

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::ApiErrorResponse;
use crate::state::AppState;

/// 접근 허용 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessGranted {
    pub success: String,
}

#[utoipa::path(
    get,
    path = "/api-1",
    tag = "demo",
    security(("token" = [])),
    responses(
        (status = 200, description = "접근 허용", body = AccessGranted),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    )
)]
pub async fn api_one(AuthUser(identity): AuthUser) -> Json<AccessGranted> {
    debug!(account_id = %identity.account_id, "API-1 접근");
    Json(AccessGranted {
        success: "Access granted for API-1".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/api-2",
    tag = "demo",
    security(("token" = [])),
    responses(
        (status = 200, description = "접근 허용", body = AccessGranted),
        (status = 401, description = "인증 실패", body = ApiErrorResponse)
    )
)]
pub async fn api_two(AuthUser(identity): AuthUser) -> Json<AccessGranted> {
    debug!(account_id = %identity.account_id, "API-2 접근");
    Json(AccessGranted {
        success: "Access granted for API-2".to_string(),
    })
}

/// 데모 라우터 생성.
pub fn demo_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api-1", get(api_one))
        .route("/api-2", get(api_two))
}
