// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use dashmap::DashSet;
use fitcoach_client::config::Config;
use fitcoach_client::{
    ApiClient, ApiError, CredentialPair, CredentialStore, MemorySlots, SlotStorage,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock backend plus a client wired to it.
#[allow(dead_code)]
pub struct TestBackend {
    pub server: MockServer,
    pub client: ApiClient,
    pub store: CredentialStore,
    pub logouts: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl TestBackend {
    /// Number of times the logout callback fired.
    pub fn logout_count(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    /// Number of requests the mock backend received for `route`.
    pub async fn requests_to(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == route)
            .count()
    }
}

/// Start a mock backend and a client with an in-memory store and a
/// counting logout callback.
#[allow(dead_code)]
pub async fn test_backend() -> TestBackend {
    test_backend_with(CredentialStore::in_memory()).await
}

/// Same as [`test_backend`], over the given store.
#[allow(dead_code)]
pub async fn test_backend_with(store: CredentialStore) -> TestBackend {
    let server = MockServer::start().await;
    let client = client_for(&server.uri(), store.clone());

    let logouts = Arc::new(AtomicUsize::new(0));
    let counter = logouts.clone();
    client
        .register_logout_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;

    TestBackend {
        server,
        client,
        store,
        logouts,
    }
}

/// Create a client for `base_url` (offline tests point this at a closed port).
#[allow(dead_code)]
pub fn client_for(base_url: &str, store: CredentialStore) -> ApiClient {
    ApiClient::new(&Config::test_default(base_url), store).expect("Failed to build client")
}

/// Seed the store with a token pair.
#[allow(dead_code)]
pub async fn seed_tokens(store: &CredentialStore, access: &str, refresh: &str) {
    store
        .save(&CredentialPair::new(access, refresh))
        .await
        .expect("Failed to seed tokens");
}

/// Mount a refresh endpoint that accepts `refresh` and returns the new pair.
#[allow(dead_code)]
pub async fn mount_refresh(
    server: &MockServer,
    refresh: &str,
    new_access: &str,
    new_refresh: &str,
    delay: Duration,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(path("/refresh-token/"))
        .and(body_json(json!({ "refresh": refresh })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access": new_access, "refresh": new_refresh }))
                .set_delay(delay),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Signed access token carrying `user_id`, shaped like the backend's.
#[allow(dead_code)]
pub fn access_jwt(user_id: u64) -> String {
    access_jwt_with(json!({ "user_id": user_id, "exp": 4_102_444_800i64 }))
}

/// Signed access token with arbitrary claims.
#[allow(dead_code)]
pub fn access_jwt_with(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-signing-key"),
    )
    .expect("Failed to encode test JWT")
}

/// In-memory slots that fail writes or removes for selected keys.
///
/// Clones share state, so a test can keep a handle after moving one into a
/// `CredentialStore`.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct FailingSlots {
    inner: Arc<MemorySlots>,
    failing_writes: Arc<DashSet<String>>,
    failing_removes: Arc<DashSet<String>>,
    removes: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FailingSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing_writes.insert(key.to_string());
    }

    pub fn fail_removes_of(&self, key: &str) {
        self.failing_removes.insert(key.to_string());
    }

    /// Keys passed to `remove`, in call order.
    pub fn remove_calls(&self) -> Vec<String> {
        self.removes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlotStorage for FailingSlots {
    async fn get(&self, key: &str) -> fitcoach_client::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> fitcoach_client::Result<()> {
        if self.failing_writes.contains(key) {
            return Err(ApiError::Storage(format!("disk full writing {}", key)));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> fitcoach_client::Result<()> {
        self.removes.lock().unwrap().push(key.to_string());
        if self.failing_removes.contains(key) {
            return Err(ApiError::Storage(format!("permission denied removing {}", key)));
        }
        self.inner.remove(key).await
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Address nothing listens on.
#[allow(dead_code)]
pub const CLOSED_PORT_URL: &str = "http://127.0.0.1:1";
