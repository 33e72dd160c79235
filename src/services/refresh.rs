// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token refresh coordinator.
//!
//! The single authority for exchanging a refresh token for a new pair and
//! for declaring a session dead. Refreshes are single-flight: the first
//! caller publishes a shared future under a lock and every concurrent
//! caller awaits that same future instead of starting its own exchange.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::{backend_message, ApiError, Result};
use crate::models::{CredentialPair, RefreshResponse};
use crate::store::CredentialStore;

/// Invoked with no arguments when a session becomes unrecoverable.
pub type LogoutCallback = Arc<dyn Fn() + Send + Sync>;

type InFlight = Shared<BoxFuture<'static, bool>>;

/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/refresh-token/";

/// Coordinates token refreshes for one credential store.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    refresh_url: String,
    store: CredentialStore,
    logout: RwLock<Option<LogoutCallback>>,
    /// The exchange currently running, if any.
    in_flight: Mutex<Option<InFlight>>,
    exchanges: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(http: reqwest::Client, base_url: &str, store: CredentialStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                refresh_url: format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH),
                store,
                logout: RwLock::new(None),
                in_flight: Mutex::new(None),
                exchanges: AtomicU64::new(0),
            }),
        }
    }

    /// Register the logout callback. The last registration wins.
    pub async fn register_logout_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.logout.write().await = Some(Arc::new(callback));
    }

    pub async fn clear_logout_callback(&self) {
        *self.inner.logout.write().await = None;
    }

    /// Number of refresh requests sent to the backend so far. Attempts
    /// that end before the network (no refresh token stored) are not counted.
    pub fn refresh_count(&self) -> u64 {
        self.inner.exchanges.load(Ordering::SeqCst)
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Returns `true` once the new pair is persisted. On any failure the
    /// store is cleared, the logout callback fires and `false` is returned.
    pub async fn refresh(&self) -> bool {
        self.join_or_start(None).await
    }

    /// Refresh after the backend rejected `rejected` with a 401.
    ///
    /// If the stored access token no longer matches the rejected one, a
    /// concurrent refresh has already settled the session: a present token
    /// means retry (`true`), an empty store means the session already ended
    /// (`false`). Neither case issues a network call.
    pub async fn refresh_after_rejection(&self, rejected: Option<&str>) -> bool {
        self.join_or_start(Some(rejected)).await
    }

    /// End the session after a freshly refreshed token was rejected again.
    ///
    /// Skipped when the stored token already differs from `rejected`, so
    /// concurrent requests failing the same way log out only once. Returns
    /// whether this call ended the session.
    pub async fn expire_session(&self, rejected: Option<&str>) -> bool {
        let _slot = self.inner.in_flight.lock().await;
        let current = self.inner.store.access_token().await;
        if current.is_none() || current.as_deref() != rejected {
            return false;
        }
        tracing::warn!("Refreshed access token rejected, ending session");
        self.inner.end_session().await;
        true
    }

    async fn join_or_start(&self, rejected: Option<Option<&str>>) -> bool {
        let flight = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.clone() {
                Some(existing) => {
                    tracing::debug!("Joining in-flight token refresh");
                    existing
                }
                None => {
                    if let Some(rejected) = rejected {
                        let current = self.inner.store.access_token().await;
                        if current.as_deref() != rejected {
                            tracing::debug!(
                                session_alive = current.is_some(),
                                "Session already settled by a concurrent refresh"
                            );
                            return current.is_some();
                        }
                    }

                    let inner = Arc::clone(&self.inner);
                    let flight = async move {
                        let refreshed = inner.run_exchange().await;
                        inner.in_flight.lock().await.take();
                        refreshed
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }
}

impl Inner {
    async fn run_exchange(&self) -> bool {
        match self.exchange().await {
            Ok(pair) => {
                tracing::info!(
                    expires_at = ?pair.access_expires_at(),
                    "Token refresh successful"
                );
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.end_session().await;
                false
            }
        }
    }

    async fn exchange(&self) -> Result<CredentialPair> {
        let refresh_token = self
            .store
            .load()
            .await
            .refresh_token
            .ok_or(ApiError::NotAuthenticated)?;

        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(exchange = n, "Refreshing access token");

        let response = self
            .http
            .post(&self.refresh_url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: backend_message(&body),
            });
        }

        let body: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(format!("Malformed refresh response: {}", e)))?;
        let pair = body
            .into_pair(&refresh_token)
            .ok_or_else(|| ApiError::Decode("Refresh response without access token".to_string()))?;

        self.store.save(&pair).await?;
        Ok(pair)
    }

    async fn end_session(&self) {
        if let Err(e) = self.store.clear().await {
            tracing::error!(error = %e, "Failed to clear credentials after session loss");
        }

        let callback = self.logout.read().await.clone();
        match callback {
            Some(callback) => callback(),
            None => tracing::debug!("No logout callback registered"),
        }
    }
}
