use jsonwebtoken::{EncodingKey, Header};
use serde_json::json;

use job_board_client::token::{UserRole, decode_jwt_payload};

fn encode(claims: serde_json::Value) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"unit"),
    )
    .unwrap()
}

#[test]
fn decodes_payload_without_verifying_signature() {
    let token = encode(json!({
        "sub": "user-1",
        "email": "ada@example.com",
        "role": "company",
        "iat": 1_700_000_000,
        "exp": 1_700_000_900,
    }));
    let claims = decode_jwt_payload(&token).expect("claims");
    assert_eq!(claims.sub, "user-1");
    assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
    assert_eq!(claims.role, UserRole::Company);
    assert_eq!(claims.exp, 1_700_000_900);
}

#[test]
fn expired_tokens_still_decode() {
    let token = encode(json!({"sub": "user-2", "role": "admin", "exp": 1}));
    let claims = decode_jwt_payload(&token).expect("claims");
    assert!(claims.is_expired(jiff::Timestamp::now().as_millisecond()));
}

#[test]
fn malformed_tokens_decode_to_none() {
    assert!(decode_jwt_payload("").is_none());
    assert!(decode_jwt_payload("not-a-jwt").is_none());
    assert!(decode_jwt_payload("a.b.c").is_none());
    // payload without exp
    assert!(decode_jwt_payload(&encode(json!({"sub": "x"}))).is_none());
}

#[test]
fn unknown_roles_fall_back() {
    let token = encode(json!({"sub": "user-3", "role": "superuser", "exp": 10}));
    let claims = decode_jwt_payload(&token).unwrap();
    assert_eq!(claims.role, UserRole::Unknown);
    assert_eq!(claims.role.dashboard_route(), "/");
}

#[test]
fn roles_route_to_their_dashboards() {
    assert_eq!(UserRole::Admin.dashboard_route(), "/admin/dashboard");
    assert_eq!(UserRole::Company.dashboard_route(), "/company/dashboard");
    assert_eq!(UserRole::JobSeeker.dashboard_route(), "/dashboard");
    assert_eq!(UserRole::JobSeeker.label(), "Job Seeker");
}

#[test]
fn expiry_window_is_exclusive_of_threshold() {
    let token = encode(json!({"sub": "u", "exp": 1_000}));
    let claims = decode_jwt_payload(&token).unwrap();
    let threshold = std::time::Duration::from_secs(300);
    // 300s left: not yet within the window
    assert!(!claims.expires_within(threshold, 700_000));
    assert!(claims.expires_within(threshold, 700_001));
}
