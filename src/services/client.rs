// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated request executor for the backend API.
//!
//! Handles:
//! - Bearer token attachment from the credential store
//! - One refresh-and-retry on a 401 response
//! - Backend error message extraction

use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::refresh::RefreshCoordinator;
use crate::config::Config;
use crate::error::{backend_message, ApiError, Result};
use crate::models::RequestDescriptor;
use crate::store::CredentialStore;

/// Attempts per request: the original call plus one retry after a refresh.
const MAX_ATTEMPTS: u32 = 2;

/// Per-request lifecycle, logged as the executor advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    AuthFailedRetrying,
    Success,
    TerminalFailure,
    OtherError,
}

/// Backend API client with automatic token refresh.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: CredentialStore,
    refresher: RefreshCoordinator,
}

impl ApiClient {
    /// Build a client for `config.api_base_url` using `store` for credentials.
    pub fn new(config: &Config, store: CredentialStore) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        let refresher = RefreshCoordinator::new(http.clone(), &config.api_base_url, store.clone());

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            store,
            refresher,
        })
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn refresher(&self) -> &RefreshCoordinator {
        &self.refresher
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Register the function called when the session becomes unrecoverable.
    pub async fn register_logout_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.refresher.register_logout_callback(callback).await;
    }

    /// Perform one logical backend operation with the current credentials.
    ///
    /// A 401 triggers a single refresh; if it succeeds the same descriptor is
    /// sent once more and that outcome is final. Other failures are returned
    /// without retrying.
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<Value> {
        let url = request.url(&self.base_url);
        let mut state = RequestState::Pending;

        for attempt in 1..=MAX_ATTEMPTS {
            let access_token = self.store.access_token().await;

            let response = match self.send(request, &url, access_token.as_deref()).await {
                Ok(response) => response,
                Err(e) => {
                    transition(state, RequestState::OtherError, attempt);
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        error = %e,
                        "Request failed"
                    );
                    return Err(e);
                }
            };

            let status = response.status();
            if status.is_success() {
                transition(state, RequestState::Success, attempt);
                return decode_body(response).await;
            }

            if status != StatusCode::UNAUTHORIZED {
                transition(state, RequestState::OtherError, attempt);
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(
                    method = %request.method,
                    path = %request.path,
                    status = status.as_u16(),
                    "Request rejected"
                );
                return Err(ApiError::Status {
                    status: status.as_u16(),
                    message: backend_message(&body),
                });
            }

            if attempt == MAX_ATTEMPTS {
                transition(state, RequestState::TerminalFailure, attempt);
                self.refresher.expire_session(access_token.as_deref()).await;
                return Err(ApiError::SessionExpired);
            }

            state = transition(state, RequestState::AuthFailedRetrying, attempt);
            if !self
                .refresher
                .refresh_after_rejection(access_token.as_deref())
                .await
            {
                transition(state, RequestState::TerminalFailure, attempt);
                return Err(ApiError::SessionExpired);
            }
        }

        Err(ApiError::SessionExpired)
    }

    /// Execute and deserialize the response body into `T`.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T> {
        let value = self.execute(request).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(&RequestDescriptor::get(path)).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        self.execute_json(&RequestDescriptor::post(path, body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        self.execute_json(&RequestDescriptor::put(path, body)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        self.execute_json(&RequestDescriptor::patch(path, body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(&RequestDescriptor::delete(path)).await?;
        Ok(())
    }

    /// Send without credentials and without the refresh path (login).
    pub(crate) async fn send_unauthenticated<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
    ) -> Result<T> {
        let url = request.url(&self.base_url);
        let response = self.send(request, &url, None).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: backend_message(&body),
            });
        }

        let value = decode_body(response).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send(
        &self,
        request: &RequestDescriptor,
        url: &str,
        access_token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut builder = self.http.request(request.method.clone(), url);

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("Header name {:?}: {}", name, e)))?;
            if name == AUTHORIZATION && access_token.is_some() {
                continue;
            }
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("Header {}: {}", name, e)))?;
            builder = builder.header(name, value);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidRequest(format!("Access token: {}", e)))?;
            value.set_sensitive(true);
            builder = builder.header(AUTHORIZATION, value);
        }

        builder.send().await.map_err(ApiError::from_reqwest)
    }
}

fn transition(from: RequestState, to: RequestState, attempt: u32) -> RequestState {
    tracing::debug!(?from, ?to, attempt, "Request state");
    to
}

/// Decode a success body; empty bodies (204, bare 200) become `Value::Null`.
async fn decode_body(response: reqwest::Response) -> Result<Value> {
    let bytes = response.bytes().await.map_err(ApiError::from_reqwest)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}
