// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for the Pirsch SDK.
//!
//! This crate provides:
//! - A pre-configured HTTP client builder with a consistent User-Agent header
//! - The linear backoff schedule used between re-authentication retries

mod backoff;
mod client;

pub use backoff::Backoff;
pub use client::{builder, new_client_with_timeout, user_agent};
