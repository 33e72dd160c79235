// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Fitcoach API client
//!
//! Authenticated access to the fitness-coaching backend: durable credential
//! storage, single-flight token refresh, and a request executor that heals
//! one authorization failure per call.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use error::{ApiError, Result};
pub use models::{CredentialPair, RequestDescriptor, UserProfile};
pub use services::{ApiClient, RefreshCoordinator, SessionService};
pub use store::{CredentialStore, FileSlots, MemorySlots, SlotStorage};
