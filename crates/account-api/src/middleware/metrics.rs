//! HTTP 요청 metrics middleware.
//!
//! 경로 라벨은 실제 URI가 아니라 매칭된 라우트 템플릿(`/users/{user_id}`)을 사용하므로
//! 계정 식별자가 라벨로 새지 않습니다.

use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::metrics::{
    record_auth_rejection, record_http_duration, record_http_request, record_http_response,
};

/// 어떤 라우트에도 매칭되지 않은 요청의 라벨.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// 메트릭 라벨로 쓸 라우트 이름.
pub(crate) fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

/// HTTP 메트릭을 수집하는 미들웨어 레이어.
///
/// `Router::layer`로 적용해야 라우트별 [`MatchedPath`]를 볼 수 있습니다.
/// 401 응답은 토큰 검증 또는 접근 정책 거부로 별도 집계합니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let route = route_label(&request);

    record_http_request(&method, &route);

    let response = next.run(request).await;
    let status = response.status();

    record_http_response(&method, &route, status.as_u16());
    record_http_duration(&method, &route, started.elapsed().as_secs_f64());
    if status == StatusCode::UNAUTHORIZED {
        record_auth_rejection(&route);
    }

    response
}
