//! OpenAPI 문서화 설정.
//!
//! utoipa를 사용하여 REST API의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새로운 엔드포인트를 추가할 때:
//!
//! 1. 응답/요청 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))` 및 `paths(...)` 섹션에 추가

use account_core::Role;
use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenPair;
use crate::error::ApiErrorResponse;
use crate::routes::{
    AccessGranted, AccountView, ComponentHealth, ComponentStatus, HealthResponse, LoginRequest,
    RefreshRequest, SignupRequest, SignupResponse, UserListResponse,
};

/// 보호된 엔드포인트가 참조하는 보안 스킴 이름.
pub const TOKEN_SECURITY_SCHEME: &str = "token";

/// Accounts API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Accounts API",
        description = r#"
# 계정 서비스 REST API

가입, 로그인, 토큰 재발급 및 계정 조회를 제공합니다.

## 인증

보호된 엔드포인트는 설정된 요청 헤더(기본값 `token`)에 Access Token을 요구합니다
(`Authorization` 헤더는 사용하지 않습니다).
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "accounts", description = "계정 - 가입, 로그인, 조회"),
        (name = "demo", description = "데모 - 토큰 보호 확인")
    ),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            // ===== Common =====
            ApiErrorResponse,
            Role,
            TokenPair,

            // ===== Accounts =====
            SignupRequest,
            SignupResponse,
            LoginRequest,
            RefreshRequest,
            AccountView,
            UserListResponse,

            // ===== Demo =====
            AccessGranted,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::users::signup,
        crate::routes::users::login,
        crate::routes::users::refresh,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::demo::api_one,
        crate::routes::demo::api_two,
    )
)]
pub struct ApiDoc;

/// 토큰 헤더 보안 스킴을 포함한 OpenAPI 문서.
///
/// 스킴은 가드가 실제로 읽는 헤더 이름으로 등록됩니다.
pub fn api_doc(token_header: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.components
        .get_or_insert_with(Default::default)
        .add_security_scheme(
            TOKEN_SECURITY_SCHEME,
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(token_header))),
        );
    doc
}

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI 대화형 문서
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>(token_header: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", api_doc(token_header))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_valid() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_string_pretty(&spec).unwrap();

        assert!(json.contains("Accounts API"));

        for path in [
            "/health",
            "/health/ready",
            "/signup",
            "/login",
            "/refresh",
            "/users",
            "/users/{user_id}",
            "/api-1",
            "/api-2",
        ] {
            assert!(json.contains(&format!("\"{path}\"")), "missing path {path}");
        }
    }

    #[test]
    fn test_openapi_contains_schemas_and_security() {
        let spec = api_doc("token");
        let json = serde_json::to_string(&spec).unwrap();

        assert!(json.contains("AccountView"));
        assert!(json.contains("UserListResponse"));
        assert!(json.contains("ApiErrorResponse"));
        assert!(json.contains("recordPerPage"));
        assert!(json.contains("\"securitySchemes\""));
    }

    #[test]
    fn test_security_scheme_uses_configured_header() {
        let spec = serde_json::to_value(api_doc("x-session-token")).unwrap();
        let scheme = &spec["components"]["securitySchemes"][TOKEN_SECURITY_SCHEME];

        assert_eq!(scheme["type"], "apiKey");
        assert_eq!(scheme["in"], "header");
        assert_eq!(scheme["name"], "x-session-token");
    }

    #[test]
    fn test_swagger_ui_router_creates() {
        let _router: Router<()> = swagger_ui_router("token");
    }
}
