use std::time::Duration;

use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum UserRole {
    Admin,
    Company,
    JobSeeker,
    #[default]
    Unknown,
}

impl From<String> for UserRole {
    fn from(role: String) -> Self {
        match role.as_str() {
            "admin" => UserRole::Admin,
            "company" => UserRole::Company,
            "job_seeker" => UserRole::JobSeeker,
            _ => UserRole::Unknown,
        }
    }
}

impl UserRole {
    pub fn dashboard_route(self) -> &'static str {
        match self {
            UserRole::Admin => "/admin/dashboard",
            UserRole::Company => "/company/dashboard",
            UserRole::JobSeeker => "/dashboard",
            UserRole::Unknown => "/",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "Administrator",
            UserRole::Company => "Company",
            UserRole::JobSeeker => "Job Seeker",
            UserRole::Unknown => "Unknown",
        }
    }
}

/// Claims carried in an access token's payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub iat: Option<i64>,
    pub exp: i64,
}

impl Claims {
    /// Milliseconds until expiry relative to `now_ms`; negative once expired.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.exp.saturating_mul(1000).saturating_sub(now_ms)
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.remaining_ms(now_ms) <= 0
    }

    pub fn expires_within(&self, threshold: Duration, now_ms: i64) -> bool {
        i128::from(self.remaining_ms(now_ms)) < threshold.as_millis() as i128
    }
}

/// Reads the claims of `token` without checking its signature, expiry or audience;
/// that is the server's job. Returns `None` for anything that is not a well-formed JWT.
pub fn decode_jwt_payload(token: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .ok()
        .map(|data| data.claims)
}
