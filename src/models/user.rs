// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User models for login and profile display.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use validator::Validate;

/// Last-known user record, cached next to the credentials.
///
/// Always re-fetchable from the backend; never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user ID, numeric or string on the wire
    #[serde(deserialize_with = "deserialize_user_id")]
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Profile image URL or storage reference
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl UserProfile {
    /// Name to show in the UI, falling back to the email address.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.email.clone().unwrap_or_else(|| format!("user {}", self.id))
    }
}

/// Normalize a user ID that may arrive as a JSON number or string.
pub(crate) fn user_id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    user_id_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid user id: {}", value)))
}

/// Body of `POST /login/`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}
