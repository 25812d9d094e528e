//! 계정 API 통합 테스트.
//!
//! 인메모리 저장소를 사용하는 전체 라우터를 `oneshot`으로 호출합니다.

use std::sync::Arc;

use account_api::{create_api_router, create_test_state, AppState};
use account_core::{Account, AccountFilter, Identity, NewAccount, Role};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app(state: &Arc<AppState>) -> Router {
    create_api_router(state.clone()).with_state(state.clone())
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&body).into_owned())
        })
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_token(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("token", token)
        .body(Body::empty())
        .unwrap()
}

fn signup_body(email: &str, phone: &str, role: &str) -> Value {
    json!({
        "email": email,
        "password": "s3cret-password",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "phone": phone,
        "user_type": role,
    })
}

/// 해싱 없이 계정을 직접 저장하고 Access Token을 발급합니다.
async fn seed(state: &AppState, n: u32, role: Role, created_at: chrono::DateTime<Utc>) -> (Account, String) {
    let account = Account::new(
        NewAccount {
            email: format!("user{n}@example.com"),
            phone: format!("555{n:04}"),
            first_name: format!("First{n}"),
            last_name: format!("Last{n}"),
            role,
        },
        "unused".to_string(),
        created_at,
    );
    state.store.insert(&account).await.unwrap();
    let token = state
        .tokens
        .issue_token_pair(&account.identity())
        .unwrap()
        .access_token;
    (account, token)
}

#[tokio::test]
async fn signup_then_duplicate_email_conflicts() {
    let state = Arc::new(create_test_state());
    let app = app(&state);

    let (status, body) = send(
        &app,
        post_json("/signup", signup_body("ada@example.com", "5550001", "USER")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let inserted_id = body["inserted_id"].as_str().unwrap().to_string();

    let stored = state
        .store
        .find_one(&AccountFilter::AccountId(inserted_id))
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password_hash.starts_with("$argon2id$"));
    assert!(stored.token.is_some());
    assert!(stored.refresh_token.is_some());

    let (status, body) = send(
        &app,
        post_json("/signup", signup_body("ada@example.com", "5559999", "USER")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"error": "Phone or Email already exists"}));

    let (status, _) = send(
        &app,
        post_json("/signup", signup_body("other@example.com", "5550001", "USER")),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let count = state
        .store
        .count(&AccountFilter::Email("ada@example.com".to_string()))
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn signup_rejects_bad_input() {
    let state = Arc::new(create_test_state());
    let app = app(&state);

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/signup")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        post_json("/signup", signup_body("ada@example.com", "5550001", "MANAGER")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json("/signup", signup_body("not-an-email", "5550001", "USER")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "email must be a valid address"}));
}

#[tokio::test]
async fn login_outcomes() {
    let state = Arc::new(create_test_state());
    let app = app(&state);

    let (status, _) = send(
        &app,
        post_json("/signup", signup_body("ada@example.com", "5550001", "ADMIN")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        post_json(
            "/login",
            json!({"email": "ada@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "invalid password"}));

    let (status, body) = send(
        &app,
        post_json(
            "/login",
            json!({"email": "nobody@example.com", "password": "s3cret-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "User not found"}));

    let (status, body) = send(
        &app,
        post_json(
            "/login",
            json!({"email": "ada@example.com", "password": "s3cret-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["user_type"], "ADMIN");
    assert!(body.get("password_hash").is_none());

    // 응답에 담긴 토큰으로 보호된 엔드포인트 접근
    let token = body["token"].as_str().unwrap();
    let (status, body) = send(&app, get_with_token("/api-1", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": "Access granted for API-1"}));

    let (status, body) = send(&app, get_with_token("/api-2", token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": "Access granted for API-2"}));
}

#[tokio::test]
async fn listing_pages_in_server_order() {
    let state = Arc::new(create_test_state());
    let app = app(&state);
    let base = Utc::now() - Duration::hours(1);

    let mut admin_token = String::new();
    for n in (1..=12).rev() {
        let role = if n == 1 { Role::Admin } else { Role::User };
        let (_, token) = seed(&state, n, role, base + Duration::seconds(n as i64)).await;
        if n == 1 {
            admin_token = token;
        }
    }

    let (status, body) = send(
        &app,
        get_with_token("/users?pageNumber=2&recordPerPage=5", &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 12);
    let emails: Vec<&str> = body["user_items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["email"].as_str().unwrap())
        .collect();
    assert_eq!(
        emails,
        vec![
            "user6@example.com",
            "user7@example.com",
            "user8@example.com",
            "user9@example.com",
            "user10@example.com",
        ]
    );

    // 잘못된 값은 기본값 (1페이지, 10개)
    let (status, body) = send(
        &app,
        get_with_token("/users?pageNumber=abc&recordPerPage=0", &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["user_items"].as_array().unwrap();
    assert_eq!(items.len(), 10);
    assert_eq!(items[0]["email"], "user1@example.com");
}

#[tokio::test]
async fn listing_requires_admin_and_token() {
    let state = Arc::new(create_test_state());
    let app = app(&state);
    let (_, user_token) = seed(&state, 1, Role::User, Utc::now()).await;

    let (status, body) = send(&app, get_with_token("/users", &user_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "User type not matched"}));

    let anonymous = Request::builder().uri("/users").body(Body::empty()).unwrap();
    let (status, body) = send(&app, anonymous).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "No authorization header provided"}));
}

#[tokio::test]
async fn get_user_self_or_admin() {
    let state = Arc::new(create_test_state());
    let app = app(&state);
    let now = Utc::now();
    let (alice, alice_token) = seed(&state, 1, Role::User, now).await;
    let (bob, _) = seed(&state, 2, Role::User, now).await;
    let (_, admin_token) = seed(&state, 3, Role::Admin, now).await;

    // USER는 자기 계정만
    let (status, body) = send(
        &app,
        get_with_token(&format!("/users/{}", alice.account_id), &alice_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], alice.account_id.as_str());

    let (status, body) = send(
        &app,
        get_with_token(&format!("/users/{}", bob.account_id), &alice_token),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "User type not matched"}));

    // ADMIN은 모든 계정
    let (status, body) = send(
        &app,
        get_with_token(&format!("/users/{}", bob.account_id), &admin_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "user2@example.com");

    let (status, body) = send(&app, get_with_token("/users/does-not-exist", &admin_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "User not found"}));
}

#[tokio::test]
async fn refresh_rotates_tokens() {
    let state = Arc::new(create_test_state());
    let app = app(&state);

    let (status, _) = send(
        &app,
        post_json("/signup", signup_body("ada@example.com", "5550001", "USER")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, login) = send(
        &app,
        post_json(
            "/login",
            json!({"email": "ada@example.com", "password": "s3cret-password"}),
        ),
    )
    .await;
    let first_refresh = login["refresh_token"].as_str().unwrap().to_string();

    let (status, pair) = send(
        &app,
        post_json("/refresh", json!({"refresh_token": first_refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair["token_type"], "Bearer");
    let second_refresh = pair["refresh_token"].as_str().unwrap();
    assert_ne!(second_refresh, first_refresh);

    let (status, _) = send(
        &app,
        get_with_token("/api-1", pair["access_token"].as_str().unwrap()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 교체된 토큰은 다시 쓸 수 없음
    let (status, _) = send(
        &app,
        post_json("/refresh", json!({"refresh_token": first_refresh})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Access Token은 Refresh Token으로 쓸 수 없음
    let (status, _) = send(
        &app,
        post_json("/refresh", json!({"refresh_token": login["token"]})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_for_unknown_account_is_not_found() {
    let state = Arc::new(create_test_state());
    let app = app(&state);

    let ghost = Identity {
        account_id: "ghost".to_string(),
        email: "ghost@example.com".to_string(),
        first_name: "Gho".to_string(),
        last_name: "St".to_string(),
        role: Role::User,
    };
    let pair = state.tokens.issue_token_pair(&ghost).unwrap();

    let (status, body) = send(
        &app,
        post_json("/refresh", json!({"refresh_token": pair.refresh_token})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "User not found"}));
}

#[tokio::test]
async fn health_is_public() {
    let state = Arc::new(create_test_state());
    let app = app(&state);

    let (status, body) = send(
        &app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".to_string()));

    let (status, body) = send(
        &app,
        Request::builder().uri("/health/ready").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
