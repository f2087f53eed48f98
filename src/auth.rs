//! Login, registration and session helpers on top of `ApiClient`.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::ApiClient;
use crate::errors::Error;
use crate::token::UserRole;
use crate::types::{AuthResponse, LoginCredentials, RequestOptions};

#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse, Error> {
        let response: AuthResponse = self
            .client
            .post("/auth/login", credentials, RequestOptions::new())
            .await?;
        self.client
            .set_tokens(response.access_token.clone(), response.refresh_token.clone())
            .await?;
        info!(email = %credentials.email, "auth.login");
        Ok(response)
    }

    pub async fn register(&self, data: &impl Serialize) -> Result<AuthResponse, Error> {
        let response: AuthResponse = self
            .client
            .post("/auth/register", data, RequestOptions::new())
            .await?;
        self.client
            .set_tokens(response.access_token.clone(), response.refresh_token.clone())
            .await?;
        info!("auth.register");
        Ok(response)
    }

    /// Tells the server to revoke the refresh token, then clears local tokens
    /// whether or not that call succeeded.
    pub async fn logout(&self) -> Result<(), Error> {
        if let Some(refresh_token) = self.client.refresh_token().await {
            let revoked: Result<Value, Error> = self
                .client
                .post(
                    "/auth/logout",
                    &json!({ "refreshToken": refresh_token }),
                    RequestOptions::new().retries(0),
                )
                .await;
            if let Err(err) = revoked {
                warn!(error = %err, "auth.logout_failed");
            }
        }
        self.client.clear_tokens().await?;
        self.client.invalidate_cache(None).await;
        info!("auth.logout");
        Ok(())
    }

    /// Exchanges the refresh token now. False when there is none or the exchange
    /// failed, in which case the tokens are already cleared.
    pub async fn refresh_session(&self) -> bool {
        match self.client.refresh_now().await {
            Ok(token) => token.is_some(),
            Err(err) => {
                warn!(error = %err, "auth.refresh_session_failed");
                false
            }
        }
    }

    /// The signed-in user's profile, or `None` without a token or on any failure.
    pub async fn current_user(&self) -> Option<Value> {
        self.client.access_token().await?;
        self.client
            .get("/auth/me", RequestOptions::new().cache(false))
            .await
            .ok()
    }

    pub async fn is_authenticated(&self) -> bool {
        match self.client.claims().await {
            Some(claims) => !claims.is_expired(jiff::Timestamp::now().as_millisecond()),
            None => false,
        }
    }

    pub async fn user_role(&self) -> Option<UserRole> {
        self.client.claims().await.map(|claims| claims.role)
    }

    pub async fn should_refresh_token(&self) -> bool {
        self.client.is_token_expiring_soon().await
    }
}
