use std::sync::RwLock;

use serde::Deserialize;
use uuid::Uuid;

use crate::domain::errors::StorefrontError;
use crate::domain::ports::{AuthGateway, UserIdentity};

use super::client::RestClient;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<AuthUser> for UserIdentity {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

/// Password-grant session against the backend's auth endpoints. The access
/// token lives only as long as this value; there is no token persistence.
pub struct RestAuthGateway {
    client: RestClient,
    access_token: RwLock<Option<String>>,
}

impl RestAuthGateway {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            access_token: RwLock::new(None),
        }
    }

    fn token(&self) -> Option<String> {
        self.access_token.read().ok()?.clone()
    }
}

impl AuthGateway for RestAuthGateway {
    async fn current_user(&self) -> Result<Option<UserIdentity>, StorefrontError> {
        let Some(token) = self.token() else {
            return Ok(None);
        };
        let response = self
            .client
            .http()
            .get(self.client.endpoint("auth/v1/user"))
            .header("apikey", self.client.api_key())
            .bearer_auth(&token)
            .send()
            .await?;
        // An expired or revoked session reads as signed out, not as an error.
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StorefrontError::RemoteRequestFailed(format!(
                "{} on auth/v1/user",
                response.status()
            )));
        }
        let user: AuthUser = response.json().await?;
        Ok(Some(user.into()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity, StorefrontError> {
        let response = self
            .client
            .http()
            .post(self.client.endpoint("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", self.client.api_key())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(StorefrontError::NotAuthenticated);
        }
        let token: TokenResponse = response.json().await?;
        if let Ok(mut slot) = self.access_token.write() {
            *slot = Some(token.access_token);
        }
        Ok(token.user.into())
    }

    async fn sign_out(&self) -> Result<(), StorefrontError> {
        let token = self
            .access_token
            .write()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(token) = token {
            let result = self
                .client
                .http()
                .post(self.client.endpoint("auth/v1/logout"))
                .header("apikey", self.client.api_key())
                .bearer_auth(&token)
                .send()
                .await;
            if let Err(error) = result {
                // The local session is already gone; the server side expires
                // on its own.
                log::warn!("sign-out request failed: {error}");
            }
        }
        Ok(())
    }
}
