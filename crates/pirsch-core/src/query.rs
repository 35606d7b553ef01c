// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Canonical query-string encoding for [`Filter`].
//!
//! The output is deterministic: parameters are sorted by name, repeated
//! parameters keep the order their values were supplied in, and mapping
//! fields are flattened from their sorted keys. Equal filters always encode
//! to byte-identical strings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use url::form_urlencoded;

use crate::filter::Filter;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Prefix for flattened event metadata parameters (`meta_<key>`).
pub const EVENT_META_PREFIX: &str = "meta_";
/// Prefix for flattened tag parameters (`tag_<key>`).
pub const TAG_PREFIX: &str = "tag_";

/// Builds `base_url + path + "?" + query` for a statistics endpoint.
///
/// No validation is done here; an empty `domain_id` is sent as `id=`.
pub fn encode(base_url: &str, path: &str, filter: &Filter) -> String {
	format!("{base_url}{path}?{}", query_string(filter))
}

/// Encodes the filter as a sorted, form-urlencoded query string.
pub fn query_string(filter: &Filter) -> String {
	let mut params = QueryParams::default();

	params.push("id", &filter.domain_id);
	params.push("from", format_date(filter.from));
	params.push("to", format_date(filter.to));
	params.push_nonzero("start", filter.start);
	params.push_opt("scale", filter.scale.map(|s| s.as_str()));
	params.push_opt("tz", filter.timezone.as_deref());
	params.push_all("path", &filter.path);
	params.push_all("pattern", &filter.pattern);
	params.push_all("entry_path", &filter.entry_path);
	params.push_all("exit_path", &filter.exit_path);
	params.push_all("event", &filter.event);
	params.push_opt("event_meta_key", filter.event_meta_key.as_deref());
	params.push_mapping(EVENT_META_PREFIX, &filter.event_meta);
	params.push_all("language", &filter.language);
	params.push_all("country", &filter.country);
	params.push_all("city", &filter.city);
	params.push_all("referrer", &filter.referrer);
	params.push_all("referrer_name", &filter.referrer_name);
	params.push_all("os", &filter.os);
	params.push_all("browser", &filter.browser);
	params.push_all("platform", &filter.platform);
	params.push_all("screen_class", &filter.screen_class);
	params.push_all("utm_source", &filter.utm_source);
	params.push_all("utm_medium", &filter.utm_medium);
	params.push_all("utm_campaign", &filter.utm_campaign);
	params.push_all("utm_content", &filter.utm_content);
	params.push_all("utm_term", &filter.utm_term);
	params.push_all("tag", &filter.tag);
	params.push_mapping(TAG_PREFIX, &filter.tags);
	params.push_opt("custom_metric_key", filter.custom_metric_key.as_deref());
	params.push_opt(
		"custom_metric_type",
		filter.custom_metric_type.map(|t| t.as_str()),
	);
	params.push_flag("include_avg_time_on_page", filter.include_avg_time_on_page);
	params.push_nonzero("offset", filter.offset);
	params.push_nonzero("limit", filter.limit);
	params.push_opt("sort", filter.sort.as_deref());
	params.push_opt("direction", filter.direction.as_deref());
	params.push_opt("search", filter.search.as_deref());

	params.finish()
}

fn format_date(date: NaiveDate) -> String {
	date.format(DATE_FORMAT).to_string()
}

/// Collects (name, value) pairs before sorting and escaping.
#[derive(Debug, Default)]
struct QueryParams {
	pairs: Vec<(String, String)>,
}

impl QueryParams {
	fn push(&mut self, name: &str, value: impl Into<String>) {
		self.pairs.push((name.to_string(), value.into()));
	}

	fn push_opt(&mut self, name: &str, value: Option<&str>) {
		if let Some(value) = value {
			self.push(name, value);
		}
	}

	fn push_all(&mut self, name: &str, values: &[String]) {
		for value in values {
			self.push(name, value.as_str());
		}
	}

	fn push_nonzero(&mut self, name: &str, value: u32) {
		if value != 0 {
			self.push(name, value.to_string());
		}
	}

	fn push_flag(&mut self, name: &str, value: bool) {
		if value {
			self.push(name, "true");
		}
	}

	fn push_mapping(&mut self, prefix: &str, mapping: &BTreeMap<String, String>) {
		for (key, value) in mapping {
			self.pairs.push((format!("{prefix}{key}"), value.clone()));
		}
	}

	fn finish(mut self) -> String {
		// stable: repeated names keep insertion order
		self.pairs.sort_by(|a, b| a.0.cmp(&b.0));

		let mut query = String::new();
		for (name, value) in &self.pairs {
			if !query.is_empty() {
				query.push('&');
			}
			query.push_str(&escape(name));
			query.push('=');
			query.push_str(&escape(value));
		}
		query
	}
}

/// Form-encodes one component with `~` kept literal and `*` escaped.
fn escape(component: &str) -> String {
	// "%7E" can only come from '~', an input '%' is written as "%25"
	form_urlencoded::byte_serialize(component.as_bytes())
		.collect::<String>()
		.replace('*', "%2A")
		.replace("%7E", "~")
}
