//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/signup`, `/login`, `/refresh` - 계정 생성 및 토큰 발급
//! - `/users`, `/users/{user_id}` - 계정 조회 (토큰 필요)
//! - `/api-1`, `/api-2` - 토큰 확인용 데모 (토큰 필요)

pub mod demo;
pub mod health;
pub mod users;

pub use demo::{demo_router, AccessGranted};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use users::{
    accounts_router, users_router, AccountView, ListUsersQuery, LoginRequest, RefreshRequest,
    SignupRequest, SignupResponse, UserListResponse,
};

use axum::{middleware, Router};
use std::sync::Arc;

use crate::auth::authenticate;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 보호된 라우트에는 토큰 검증 미들웨어가 `route_layer`로 적용되므로,
/// 존재하지 않는 경로는 인증 없이 404를 반환합니다.
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .merge(users_router())
        .merge(demo_router())
        .route_layer(middleware::from_fn_with_state(state, authenticate));

    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        .merge(accounts_router())
        .merge(protected)
}
