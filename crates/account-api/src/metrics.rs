//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 계정 관련 비즈니스 메트릭을 수집하고 `/metrics` 엔드포인트로 노출합니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 메트릭 레코더를 설정하고 핸들을 반환합니다.
///
/// # Errors
///
/// 레코더가 이미 설치되어 있으면 에러를 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        // HTTP 요청 지속 시간 히스토그램 버킷 설정
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭 헬퍼 함수
// ============================================================================

/// HTTP 요청 카운터 증가.
pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

/// HTTP 응답 카운터 증가.
pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// HTTP 요청 지속 시간 기록.
pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 계정 메트릭 헬퍼 함수
// ============================================================================

/// 가입 결과 카운터 증가 (`created`, `conflict`, `error` 등).
pub fn record_signup(outcome: &str) {
    counter!("accounts_signups_total", "outcome" => outcome.to_string()).increment(1);
}

/// 로그인 결과 카운터 증가 (`success`, `not_found`, `invalid_password` 등).
pub fn record_login(outcome: &str) {
    counter!("accounts_logins_total", "outcome" => outcome.to_string()).increment(1);
}

/// 토큰 검증 또는 접근 정책으로 거부된 요청 카운터 증가.
pub fn record_auth_rejection(route: &str) {
    counter!("accounts_auth_rejections_total", "route" => route.to_string()).increment(1);
}

/// 토큰 갱신 결과 카운터 증가.
pub fn record_token_refresh(outcome: &str) {
    counter!("accounts_token_refreshes_total", "outcome" => outcome.to_string()).increment(1);
}
