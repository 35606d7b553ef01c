// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Pirsch analytics SDK.
//!
//! This crate has no I/O. It provides:
//!
//! - [`Filter`] and the canonical query encoder in [`query`]
//! - [`Hit`] and [`Event`] request bodies
//! - Statistics records in [`stats`]

pub mod filter;
pub mod payload;
pub mod query;
pub mod stats;

pub use filter::{CustomMetricType, Filter, Scale};
pub use payload::{Event, Hit};
pub use query::{encode, query_string};
pub use stats::*;
