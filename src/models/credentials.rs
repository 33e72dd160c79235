// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Credential models: the token pair, the refresh response, and the
//! snapshot returned by the credential store.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::user::user_id_from_value;
use super::UserProfile;

/// Access/refresh bearer token pair.
///
/// Serialized with the backend's field names (`access`, `refresh`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    pub access: String,
    pub refresh: String,
}

// Tokens never appear in logs or debug output.
impl std::fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access", &format_args!("<{} chars>", self.access.len()))
            .field("refresh", &format_args!("<{} chars>", self.refresh.len()))
            .finish()
    }
}

/// Claims the client reads from an access token.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessClaims {
    /// Backend user ID; numeric or string depending on the backend.
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    /// Expiration time (Unix timestamp)
    #[serde(default)]
    pub exp: Option<i64>,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }

    /// Decode the access token payload without verifying its signature.
    ///
    /// Returns `None` for tokens that are not JWTs.
    pub fn access_claims(&self) -> Option<AccessClaims> {
        decode_claims(&self.access)
    }

    /// User identifier carried in the access token.
    pub fn user_id(&self) -> Option<String> {
        user_id_from_token(&self.access)
    }

    /// Expiry of the access token, for diagnostics only.
    pub fn access_expires_at(&self) -> Option<DateTime<Utc>> {
        self.access_claims()
            .and_then(|c| c.exp)
            .and_then(|exp| DateTime::from_timestamp(exp, 0))
    }
}

pub(crate) fn decode_claims(token: &str) -> Option<AccessClaims> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    decode::<AccessClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .ok()
}

pub(crate) fn user_id_from_token(token: &str) -> Option<String> {
    user_id_from_value(&decode_claims(token)?.user_id?)
}

/// Success body of `POST /refresh-token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    /// Absent on backends that do not rotate refresh tokens.
    #[serde(default)]
    pub refresh: Option<String>,
}

impl RefreshResponse {
    /// Build the pair to persist, keeping `current_refresh` when the
    /// backend did not rotate it. Returns `None` for a malformed body.
    pub fn into_pair(self, current_refresh: &str) -> Option<CredentialPair> {
        if self.access.trim().is_empty() {
            return None;
        }
        let refresh = match self.refresh {
            Some(r) if !r.trim().is_empty() => r,
            _ => current_refresh.to_string(),
        };
        Some(CredentialPair::new(self.access, refresh))
    }
}

/// Snapshot returned by `CredentialStore::load`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub cached_profile: Option<UserProfile>,
}

impl StoredCredentials {
    /// The stored pair, if both halves are present.
    pub fn pair(&self) -> Option<CredentialPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            _ => None,
        }
    }
}
