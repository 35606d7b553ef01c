// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Statistics filter.
//!
//! A [`Filter`] scopes every statistics read: a domain, a date range and any
//! number of optional dimensions. Multi-valued dimensions are plain vectors;
//! an empty vector means "not filtered". See [`crate::query`] for how a
//! filter is turned into a query string.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Time bucket used to group results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
	Day,
	Week,
	Month,
	Year,
}

impl Scale {
	pub fn as_str(&self) -> &'static str {
		match self {
			Scale::Day => "day",
			Scale::Week => "week",
			Scale::Month => "month",
			Scale::Year => "year",
		}
	}
}

impl fmt::Display for Scale {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Value type of a custom event metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomMetricType {
	Integer,
	Float,
}

impl CustomMetricType {
	pub fn as_str(&self) -> &'static str {
		match self {
			CustomMetricType::Integer => "integer",
			CustomMetricType::Float => "float",
		}
	}
}

impl fmt::Display for CustomMetricType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Describes which statistics to read.
///
/// `domain_id`, `from` and `to` are always sent. Every other field is
/// optional: `None`, an empty vector, an empty map, `false` and `0` all mean
/// "unset" and are left out of the query.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use pirsch_core::{Filter, Scale};
///
/// let filter = Filter::new(
/// 	"o93jnhf",
/// 	NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
/// 	NaiveDate::from_ymd_opt(2023, 8, 20).unwrap(),
/// )
/// .with_scale(Scale::Week)
/// .with_path("/blog")
/// .with_path("/pricing");
///
/// assert_eq!(filter.path, vec!["/blog", "/pricing"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
	pub domain_id: String,
	pub from: NaiveDate,
	pub to: NaiveDate,
	/// Look-back window in seconds for active visitors.
	pub start: u32,
	pub scale: Option<Scale>,
	/// IANA time zone name, e.g. `Europe/Berlin`.
	pub timezone: Option<String>,
	pub path: Vec<String>,
	pub pattern: Vec<String>,
	pub entry_path: Vec<String>,
	pub exit_path: Vec<String>,
	pub event: Vec<String>,
	pub event_meta_key: Option<String>,
	/// Event metadata constraints, sent as `meta_<key>=<value>`.
	pub event_meta: BTreeMap<String, String>,
	pub language: Vec<String>,
	pub country: Vec<String>,
	pub city: Vec<String>,
	pub referrer: Vec<String>,
	pub referrer_name: Vec<String>,
	pub os: Vec<String>,
	pub browser: Vec<String>,
	pub platform: Vec<String>,
	pub screen_class: Vec<String>,
	pub utm_source: Vec<String>,
	pub utm_medium: Vec<String>,
	pub utm_campaign: Vec<String>,
	pub utm_content: Vec<String>,
	pub utm_term: Vec<String>,
	pub tag: Vec<String>,
	/// Tag constraints, sent as `tag_<key>=<value>`.
	pub tags: BTreeMap<String, String>,
	pub custom_metric_key: Option<String>,
	pub custom_metric_type: Option<CustomMetricType>,
	pub include_avg_time_on_page: bool,
	pub offset: u32,
	pub limit: u32,
	pub sort: Option<String>,
	pub direction: Option<String>,
	pub search: Option<String>,
}

impl Filter {
	/// Creates a filter with only the mandatory fields set.
	pub fn new(domain_id: impl Into<String>, from: NaiveDate, to: NaiveDate) -> Self {
		Self {
			domain_id: domain_id.into(),
			from,
			to,
			..Default::default()
		}
	}

	pub fn with_scale(mut self, scale: Scale) -> Self {
		self.scale = Some(scale);
		self
	}

	pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
		self.timezone = Some(tz.into());
		self
	}

	/// Adds a path. Calling this repeatedly filters on any of the paths.
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path.push(path.into());
		self
	}

	/// Adds an event name. Calling this repeatedly filters on any of the events.
	pub fn with_event(mut self, event: impl Into<String>) -> Self {
		self.event.push(event.into());
		self
	}

	pub fn with_event_meta_key(mut self, key: impl Into<String>) -> Self {
		self.event_meta_key = Some(key.into());
		self
	}

	pub fn with_event_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.event_meta.insert(key.into(), value.into());
		self
	}

	pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags.insert(key.into(), value.into());
		self
	}

	pub fn with_limit(mut self, limit: u32) -> Self {
		self.limit = limit;
		self
	}

	pub fn with_offset(mut self, offset: u32) -> Self {
		self.offset = offset;
		self
	}

	pub fn with_avg_time_on_page(mut self, include: bool) -> Self {
		self.include_avg_time_on_page = include;
		self
	}
}
