// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session flows around the executor: login, logout and the cached profile.

use validator::Validate;

use super::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::models::{CredentialPair, LoginRequest, RequestDescriptor, UserProfile};

/// Login endpoint, relative to the API base URL.
pub const LOGIN_PATH: &str = "/login/";

/// High-level session service for the signed-in user.
#[derive(Clone)]
pub struct SessionService {
    client: ApiClient,
}

impl SessionService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Exchange email and password for a token pair and persist it.
    pub async fn login(&self, email: &str, password: &str) -> Result<CredentialPair> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        request
            .validate()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let body = serde_json::to_value(&request)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to encode login: {}", e)))?;
        let pair: CredentialPair = self
            .client
            .send_unauthenticated(&RequestDescriptor::post(LOGIN_PATH, body))
            .await?;

        self.client.store().save(&pair).await?;
        tracing::info!(user_id = ?pair.user_id(), "Login successful");
        Ok(pair)
    }

    /// Forget the stored credentials and cached profile.
    ///
    /// This is a user-initiated logout; the logout callback is reserved for
    /// involuntary session loss and is not invoked.
    pub async fn logout(&self) -> Result<()> {
        self.client.store().clear().await?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Whether both tokens are stored.
    pub async fn is_authenticated(&self) -> bool {
        self.client.store().load().await.pair().is_some()
    }

    /// User ID carried in the stored access token.
    pub async fn current_user_id(&self) -> Option<String> {
        self.client
            .store()
            .access_token()
            .await
            .and_then(|token| crate::models::credentials::user_id_from_token(&token))
    }

    /// Last profile stored, for display before the network round trip.
    pub async fn cached_profile(&self) -> Option<UserProfile> {
        self.client.store().load().await.cached_profile
    }

    /// Fetch the signed-in user's profile and update the cache.
    pub async fn refresh_profile(&self) -> Result<UserProfile> {
        let user_id = self
            .current_user_id()
            .await
            .ok_or(ApiError::NotAuthenticated)?;

        let profile: UserProfile = self.client.get(&format!("/users/{}/", user_id)).await?;

        // The cache is a convenience; a failed write does not fail the fetch.
        if let Err(e) = self.client.store().save_profile(&profile).await {
            tracing::warn!(error = %e, "Failed to cache user profile");
        }
        Ok(profile)
    }
}
