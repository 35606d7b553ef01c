// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rust SDK for the Pirsch analytics API.
//!
//! Reports page hits and custom events from server-side request handlers and
//! reads aggregated statistics for a domain.
//!
//! # Features
//!
//! - Access tokens are obtained on demand and refreshed once per expiry, no
//!   matter how many tasks share the client
//! - Requests rejected with 401 are re-authenticated and re-sent with a
//!   linear backoff, up to a fixed budget
//! - Statistics filters encode into a canonical, deterministic query string
//! - `DNT: 1` requests are never reported
//!
//! # Example
//!
//! ```ignore
//! use pirsch::PirschClient;
//!
//! let client = PirschClient::builder()
//!     .client_id("your_client_id")
//!     .client_secret("your_client_secret")
//!     .hostname("example.com")
//!     .build()?;
//!
//! client.hit(&request).await?;
//! ```

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod request;
pub mod secret;
pub mod transport;

pub use auth::{Authenticator, ClientIdentity};
pub use client::{ClientConfig, PirschClient, PirschClientBuilder, DEFAULT_BASE_URL};
pub use credentials::{Credential, CredentialStore};
pub use error::{AuthError, Error, Result};
pub use executor::RequestExecutor;
pub use request::{do_not_track, hit_from_request, referrer, HitOptions};
pub use secret::SecretString;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

pub use pirsch_common_http::Backoff;
pub use pirsch_core::*;
