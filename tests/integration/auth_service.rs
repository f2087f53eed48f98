use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use job_board_client::{ApiClient, AuthService, LoginCredentials, UserRole};

use crate::support::{config_for, init_logging, token};

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "ada@example.com".into(),
        password: "hunter22".into(),
    }
}

#[tokio::test]
async fn login_stores_tokens_and_exposes_role() {
    init_logging();
    let server = MockServer::start().await;
    let access = token("u-1", "company", 900);

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": access,
            "refreshToken": "refresh-1",
            "user": {"id": "u-1", "email": "ada@example.com", "role": "company"},
            "expiresIn": 900
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(ApiClient::new(config_for(&server.uri())).unwrap());
    assert!(!auth.is_authenticated().await);

    let response = auth.login(&credentials()).await.unwrap();
    assert_eq!(response.expires_in, Some(900));
    assert_eq!(response.user["role"], "company");

    assert!(auth.is_authenticated().await);
    assert_eq!(auth.user_role().await, Some(UserRole::Company));
    assert!(!auth.should_refresh_token().await);
    assert_eq!(auth.client().refresh_token().await.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn failed_login_leaves_no_tokens() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "INVALID_CREDENTIALS", "message": "wrong password"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(ApiClient::new(config_for(&server.uri())).unwrap());
    let err = auth.login(&credentials()).await.unwrap_err();
    assert_eq!(err.to_api_error().code, "INVALID_CREDENTIALS");
    assert_eq!(auth.client().access_token().await, None);
    assert_eq!(auth.user_role().await, None);
}

#[tokio::test]
async fn register_stores_tokens() {
    init_logging();
    let server = MockServer::start().await;
    let access = token("u-2", "job_seeker", 900);

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "accessToken": access,
            "refreshToken": "refresh-new",
            "user": {"id": "u-2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(ApiClient::new(config_for(&server.uri())).unwrap());
    let data = json!({
        "email": "new@example.com",
        "password": "pw",
        "firstName": "New",
        "lastName": "User",
        "role": "job_seeker"
    });
    auth.register(&data).await.unwrap();
    assert_eq!(auth.user_role().await, Some(UserRole::JobSeeker));
    assert_eq!(auth.user_role().await.unwrap().dashboard_route(), "/dashboard");
}

#[tokio::test]
async fn logout_clears_tokens_even_when_the_server_fails() {
    init_logging();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(config_for(&server.uri())).unwrap();
    client
        .set_tokens(token("u-3", "admin", 900), "refresh-1")
        .await
        .unwrap();
    let auth = AuthService::new(client);

    auth.logout().await.unwrap();
    assert_eq!(auth.client().access_token().await, None);
    assert_eq!(auth.client().refresh_token().await, None);
    assert!(!auth.is_authenticated().await);
}

#[tokio::test]
async fn current_user_needs_a_token() {
    init_logging();
    let server = MockServer::start().await;
    let access = token("u-4", "admin", 900);

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("Authorization", format!("Bearer {access}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "u-4"})))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(ApiClient::new(config_for(&server.uri())).unwrap());
    assert_eq!(auth.current_user().await, None);

    auth.client().set_tokens(access, "refresh-1").await.unwrap();
    assert_eq!(auth.current_user().await, Some(json!({"id": "u-4"})));
}

#[tokio::test]
async fn explicit_refresh_reports_success() {
    init_logging();
    let server = MockServer::start().await;
    let fresh = token("u-5", "company", 900);

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({"refreshToken": "refresh-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": fresh,
            "refreshToken": "refresh-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = AuthService::new(ApiClient::new(config_for(&server.uri())).unwrap());
    assert!(!auth.refresh_session().await, "no refresh token yet");

    auth.client()
        .set_tokens(token("u-5", "company", 30), "refresh-1")
        .await
        .unwrap();
    assert!(auth.should_refresh_token().await);
    assert!(auth.refresh_session().await);
    assert_eq!(auth.client().access_token().await.as_deref(), Some(fresh.as_str()));
    assert!(!auth.should_refresh_token().await);
}
