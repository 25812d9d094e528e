//! 계정 API 라우트.
//!
//! # 엔드포인트
//!
//! 공개:
//! - `POST /signup` - 계정 생성
//! - `POST /login` - 로그인 및 토큰 발급
//! - `POST /refresh` - Refresh Token으로 토큰 재발급
//!
//! 토큰 필요:
//! - `GET /users` - 계정 목록 (ADMIN 전용, `recordPerPage`/`pageNumber` 페이지네이션)
//! - `GET /users/{user_id}` - 계정 조회 (본인 또는 ADMIN)

use std::sync::Arc;

use account_core::{
    Account, AccountFilter, NewAccount, PageRequest, Role, SessionTokens, StoreError,
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::{
    hash_password, require_role, require_self_or_role, verify_password, AuthUser, TokenPair,
};
use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::metrics::{record_login, record_signup, record_token_refresh};
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";
const ROLE_MISMATCH: &str = "User type not matched";
const DUPLICATE_ACCOUNT: &str = "Phone or Email already exists";
const REFRESH_SUPERSEDED: &str = "the refresh token has been superseded";

// ==================== 요청/응답 타입 ====================

/// 가입 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be 6 to 128 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "first_name must be 2 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 2, max = 100, message = "last_name must be 2 to 100 characters"))]
    pub last_name: String,
    #[validate(length(min = 5, max = 20, message = "phone must be 5 to 20 characters"))]
    pub phone: String,
    /// `ADMIN` 또는 `USER`
    pub user_type: Role,
}

/// 가입 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    /// 생성된 계정 식별자
    pub inserted_id: String,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// 토큰 재발급 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// 계정 목록 쿼리.
///
/// 파싱할 수 없거나 1보다 작은 값은 기본값(10개, 1페이지)으로 대체됩니다.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// 페이지 크기
    pub record_per_page: Option<String>,
    /// 페이지 번호 (1부터)
    pub page_number: Option<String>,
}

/// 외부에 노출되는 계정 정보 (비밀번호 해시 제외).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountView {
    pub user_id: String,
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.account_id,
            email: account.email,
            phone: account.phone,
            first_name: account.first_name,
            last_name: account.last_name,
            user_type: account.role,
            created_at: account.created_at,
            updated_at: account.updated_at,
            token: account.token,
            refresh_token: account.refresh_token,
        }
    }
}

/// 계정 목록 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    /// 전체 계정 수
    pub total_count: u64,
    /// 요청 페이지의 계정
    pub user_items: Vec<AccountView>,
}

// ==================== 헬퍼 ====================

/// 저장소 에러를 로그로 남기고 일반 500 메시지로 변환.
fn internal(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |e| {
        error!(error = %e, "{}", message);
        ApiError::Internal(message.to_string())
    }
}

/// 이미 교체된 Refresh Token 제출.
fn superseded(account_id: &str) -> ApiError {
    record_token_refresh("superseded");
    warn!(account_id = %account_id, "이미 교체된 Refresh Token");
    ApiError::Unauthorized(REFRESH_SUPERSEDED.to_string())
}

fn validate<T: Validate>(request: &T) -> ApiResult<()> {
    request.validate().map_err(|e| ApiError::from_validation(&e))
}

/// 계정 신원으로 새 토큰 쌍 발급. 서명 실패는 500.
fn issue_tokens(state: &AppState, account: &Account) -> ApiResult<TokenPair> {
    state.tokens.issue_token_pair(&account.identity()).map_err(|e| {
        error!(account_id = %account.account_id, error = %e, "토큰 발급 실패");
        ApiError::Internal("Error while generating tokens".to_string())
    })
}

/// 발급된 토큰 쌍을 계정에 저장.
async fn store_tokens(state: &AppState, account_id: &str, pair: &TokenPair) -> Result<(), StoreError> {
    let tokens = SessionTokens::from(pair);
    state
        .with_store_timeout(state.store.update_tokens(account_id, &tokens, Utc::now()))
        .await
}

/// 새 토큰 쌍 발급 후 계정에 저장.
async fn issue_and_store_tokens(state: &AppState, account: &Account) -> ApiResult<TokenPair> {
    let pair = issue_tokens(state, account)?;
    store_tokens(state, &account.account_id, &pair)
        .await
        .map_err(internal("Error while updating tokens"))?;
    Ok(pair)
}

// ==================== 핸들러 ====================

/// 계정 생성.
///
/// 이메일/전화번호 중복 확인은 동시에 수행하며, 어느 한쪽이라도 실패하면 가입이 중단됩니다.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "accounts",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "계정 생성됨", body = SignupResponse),
        (status = 400, description = "잘못된 요청", body = ApiErrorResponse),
        (status = 409, description = "이메일 또는 전화번호 중복", body = ApiErrorResponse),
        (status = 500, description = "저장소 에러", body = ApiErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<Json<SignupResponse>> {
    let Json(request) = payload?;
    validate(&request)?;

    let by_email = AccountFilter::Email(request.email.clone());
    let by_phone = AccountFilter::Phone(request.phone.clone());
    let (email_count, phone_count) = tokio::try_join!(
        state.with_store_timeout(state.store.count(&by_email)),
        state.with_store_timeout(state.store.count(&by_phone)),
    )
    .map_err(|e| {
        record_signup("error");
        internal("Error while checking email or phone")(e)
    })?;

    if email_count > 0 || phone_count > 0 {
        record_signup("conflict");
        return Err(ApiError::Conflict(DUPLICATE_ACCOUNT.to_string()));
    }

    let password_hash = hash_password(&request.password).unwrap_or_else(|e| {
        error!(error = %e, "비밀번호 해싱 실패, 프로세스를 종료합니다");
        std::process::abort()
    });

    let account = Account::new(
        NewAccount {
            email: request.email,
            phone: request.phone,
            first_name: request.first_name,
            last_name: request.last_name,
            role: request.user_type,
        },
        password_hash,
        Utc::now(),
    );

    // 중복 확인과 삽입 사이의 경합은 저장소의 고유 제약이 막음
    state
        .with_store_timeout(state.store.insert(&account))
        .await
        .map_err(|e| {
            if e.is_duplicate() {
                record_signup("conflict");
                ApiError::Conflict(DUPLICATE_ACCOUNT.to_string())
            } else {
                record_signup("error");
                internal("User item not created")(e)
            }
        })?;

    let pair = issue_tokens(&state, &account).inspect_err(|_| record_signup("error"))?;

    // 계정은 이미 생성되었으므로 토큰 저장 실패는 경고만 남김
    if let Err(e) = store_tokens(&state, &account.account_id, &pair).await {
        warn!(account_id = %account.account_id, error = %e, "가입 후 토큰 저장 실패");
    }

    record_signup("created");
    info!(account_id = %account.account_id, role = %account.role, "계정 생성");

    Ok(Json(SignupResponse {
        inserted_id: account.account_id,
    }))
}

/// 로그인.
///
/// 새 토큰 쌍을 발급/저장하고, 저장된 계정을 다시 읽어 반환합니다.
#[utoipa::path(
    post,
    path = "/login",
    tag = "accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = AccountView),
        (status = 400, description = "잘못된 요청", body = ApiErrorResponse),
        (status = 401, description = "비밀번호 불일치", body = ApiErrorResponse),
        (status = 404, description = "계정 없음", body = ApiErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AccountView>> {
    let Json(request) = payload?;
    validate(&request)?;

    let by_email = AccountFilter::Email(request.email.clone());
    let account = state
        .with_store_timeout(state.store.find_one(&by_email))
        .await
        .map_err(internal("Error while finding user"))?
        .ok_or_else(|| {
            record_login("not_found");
            ApiError::NotFound(USER_NOT_FOUND.to_string())
        })?;

    verify_password(&request.password, &account.password_hash).map_err(|e| {
        record_login("invalid_password");
        warn!(account_id = %account.account_id, "비밀번호 불일치");
        ApiError::Unauthorized(e.to_string())
    })?;

    issue_and_store_tokens(&state, &account).await?;

    let by_id = AccountFilter::AccountId(account.account_id.clone());
    let refreshed = state
        .with_store_timeout(state.store.find_one(&by_id))
        .await
        .map_err(internal("Error while finding user"))?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    record_login("success");
    info!(account_id = %refreshed.account_id, "로그인");

    Ok(Json(AccountView::from(refreshed)))
}

/// Refresh Token으로 토큰 재발급.
///
/// 제출된 토큰은 계정에 마지막으로 저장된 Refresh Token과 같아야 합니다.
#[utoipa::path(
    post,
    path = "/refresh",
    tag = "accounts",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "재발급 성공", body = TokenPair),
        (status = 401, description = "유효하지 않거나 대체된 토큰", body = ApiErrorResponse),
        (status = 404, description = "계정 없음", body = ApiErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let Json(request) = payload?;
    validate(&request)?;

    let claims = state
        .tokens
        .validate_refresh(&request.refresh_token)
        .map_err(|e| {
            record_token_refresh("invalid");
            ApiError::Unauthorized(e.to_string())
        })?;

    let by_id = AccountFilter::AccountId(claims.sub.clone());
    let account = state
        .with_store_timeout(state.store.find_one(&by_id))
        .await
        .map_err(internal("Error while finding user"))?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    if account.refresh_token.as_deref() != Some(request.refresh_token.as_str()) {
        return Err(superseded(&account.account_id));
    }

    let pair = issue_tokens(&state, &account)?;
    let tokens = SessionTokens::from(&pair);

    // 동시에 같은 토큰이 제출되면 저장소의 조건부 교체에서 하나만 통과
    state
        .with_store_timeout(state.store.rotate_tokens(
            &account.account_id,
            &request.refresh_token,
            &tokens,
            Utc::now(),
        ))
        .await
        .map_err(|e| {
            if e.is_superseded() {
                superseded(&account.account_id)
            } else {
                internal("Error while updating tokens")(e)
            }
        })?;

    record_token_refresh("success");
    info!(account_id = %account.account_id, "토큰 재발급");

    Ok(Json(pair))
}

/// 계정 목록 (ADMIN 전용).
///
/// `(created_at, account_id)` 순서로 정렬된 한 페이지와 전체 계정 수를 반환합니다.
#[utoipa::path(
    get,
    path = "/users",
    tag = "accounts",
    params(ListUsersQuery),
    security(("token" = [])),
    responses(
        (status = 200, description = "계정 목록", body = UserListResponse),
        (status = 401, description = "인증 실패 또는 ADMIN 아님", body = ApiErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<UserListResponse>> {
    require_role(&identity, Role::Admin)
        .map_err(|_| ApiError::Unauthorized(ROLE_MISMATCH.to_string()))?;

    let page = PageRequest::parse(
        query.page_number.as_deref(),
        query.record_per_page.as_deref(),
    );

    let result = state
        .with_store_timeout(state.store.list_page(page.skip(), page.limit()))
        .await
        .map_err(internal("Error while fetching users"))?;

    Ok(Json(UserListResponse {
        total_count: result.total_count,
        user_items: result.items.into_iter().map(AccountView::from).collect(),
    }))
}

/// 계정 조회 (본인 또는 ADMIN).
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "accounts",
    params(("user_id" = String, Path, description = "계정 식별자")),
    security(("token" = [])),
    responses(
        (status = 200, description = "계정 정보", body = AccountView),
        (status = 401, description = "인증 실패 또는 권한 없음", body = ApiErrorResponse),
        (status = 404, description = "계정 없음", body = ApiErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AuthUser(identity): AuthUser,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AccountView>> {
    require_self_or_role(&identity, &user_id)
        .map_err(|_| ApiError::Unauthorized(ROLE_MISMATCH.to_string()))?;

    let by_id = AccountFilter::AccountId(user_id);
    let account = state
        .with_store_timeout(state.store.find_one(&by_id))
        .await
        .map_err(internal("Error while finding user"))?
        .ok_or_else(|| ApiError::NotFound(USER_NOT_FOUND.to_string()))?;

    Ok(Json(AccountView::from(account)))
}

// ==================== 라우터 ====================

/// 인증 없이 접근 가능한 계정 라우터.
pub fn accounts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

/// 토큰이 필요한 계정 조회 라우터.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{user_id}", get(get_user))
}
