//! Axum용 토큰 인증 미들웨어.
//!
//! 보호된 라우터에 [`authenticate`]를 `from_fn_with_state`로 설치하면, 검증된 요청자의
//! [`Identity`]가 요청 extensions에 들어가고 핸들러는 [`AuthUser`]로 꺼내 씁니다.

use std::sync::Arc;

use account_core::Identity;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// 토큰 헤더가 없을 때의 응답 메시지.
pub const MISSING_TOKEN_MESSAGE: &str = "No authorization header provided";

/// 토큰 검증 미들웨어.
///
/// 1. 설정된 헤더(기본 `token`)에서 토큰을 읽습니다. 없거나 비어 있으면 401.
/// 2. 서명/알고리즘/발급자/만료를 검증합니다. 실패하면 401과 실패 사유.
/// 3. 성공하면 요청자 신원을 extensions에 넣고 다음 핸들러를 호출합니다.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(&state.token_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string()))?;

    let claims = state.tokens.validate(token).map_err(|e| {
        debug!(error = %e, path = %request.uri().path(), "토큰 검증 실패");
        ApiError::Unauthorized(e.to_string())
    })?;

    request.extensions_mut().insert(claims.identity());
    Ok(next.run(request).await)
}

/// 인증된 요청자 추출기.
///
/// [`authenticate`] 뒤에서만 사용해야 합니다.
///
/// # 사용 예시
///
/// ```rust,ignore
/// async fn protected_handler(AuthUser(identity): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", identity.first_name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| ApiError::Unauthorized(MISSING_TOKEN_MESSAGE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use account_core::Role;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    async fn whoami(AuthUser(identity): AuthUser) -> String {
        format!("{}:{}", identity.account_id, identity.role)
    }

    fn app(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
            .with_state(state)
    }

    fn identity() -> Identity {
        Identity {
            account_id: "acct-1".to_string(),
            email: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            role: Role::User,
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_missing_header() {
        let app = app(Arc::new(create_test_state()));

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": MISSING_TOKEN_MESSAGE})
        );
    }

    #[tokio::test]
    async fn test_authorization_header_is_not_read() {
        let state = Arc::new(create_test_state());
        let pair = state.tokens.issue_token_pair(&identity()).unwrap();
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("authorization", format!("Bearer {}", pair.access_token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_injects_identity() {
        let state = Arc::new(create_test_state());
        let pair = state.tokens.issue_token_pair(&identity()).unwrap();
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("token", pair.access_token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"acct-1:USER");
    }

    #[tokio::test]
    async fn test_expired_token() {
        let state = Arc::new(create_test_state());
        let pair = state
            .tokens
            .issue_token_pair_at(&identity(), Utc::now() - Duration::hours(25))
            .unwrap();
        let app = app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("token", pair.access_token)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "the token is expired"})
        );
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let app = app(Arc::new(create_test_state()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header("token", "not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_extractor_without_middleware() {
        let app = Router::new().route("/whoami", get(whoami));

        let response = app
            .oneshot(Request::builder().uri("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
