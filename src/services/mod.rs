// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - request execution, token refresh and session flows.

pub mod client;
pub mod refresh;
pub mod session;

pub use client::{ApiClient, RequestState};
pub use refresh::{LogoutCallback, RefreshCoordinator};
pub use session::SessionService;
