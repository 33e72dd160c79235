// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models shared by the store and the services.

pub mod credentials;
pub mod request;
pub mod user;

pub use credentials::{AccessClaims, CredentialPair, RefreshResponse, StoredCredentials};
pub use request::RequestDescriptor;
pub use user::{LoginRequest, UserProfile};
