// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request bodies for page hits and custom events.

use serde::{Deserialize, Serialize};

/// A page hit, built from the headers and URL of an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
	pub hostname: String,
	pub url: String,
	pub ip: String,
	pub cf_connecting_ip: String,
	pub x_forwarded_for: String,
	pub forwarded: String,
	pub x_real_ip: String,
	pub user_agent: String,
	pub accept_language: String,
	pub referrer: String,
	pub screen_width: u32,
	pub screen_height: u32,
}

/// A custom event. Carries the same request data as a [`Hit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
	#[serde(rename = "event_name")]
	pub name: String,
	#[serde(rename = "event_duration")]
	pub duration_seconds: u32,
	#[serde(rename = "event_meta_keys")]
	pub meta_keys: Vec<String>,
	#[serde(rename = "event_meta_values")]
	pub meta_values: Vec<String>,
	#[serde(flatten)]
	pub hit: Hit,
}

impl Event {
	pub fn new(name: impl Into<String>, duration_seconds: u32, hit: Hit) -> Self {
		Self {
			name: name.into(),
			duration_seconds,
			meta_keys: Vec::new(),
			meta_values: Vec::new(),
			hit,
		}
	}

	/// Sets the event metadata.
	///
	/// Keys and values are stored as two parallel arrays, ordered by key so
	/// the body does not depend on the iteration order of the source map.
	pub fn with_meta<I, K, V>(mut self, meta: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let mut pairs: Vec<(String, String)> = meta
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		pairs.sort_by(|a, b| a.0.cmp(&b.0));

		let (keys, values): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
		self.meta_keys = keys;
		self.meta_values = values;
		self
	}
}
