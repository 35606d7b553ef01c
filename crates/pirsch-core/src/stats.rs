// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Statistics records returned by the read endpoints.
//!
//! All records use `#[serde(default)]` so fields the server adds or omits do
//! not break decoding. List fields also accept `null`, which the API sends
//! for an empty list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// A domain registered for the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Domain {
	pub id: String,
	pub def_time: Option<DateTime<Utc>>,
	pub mod_time: Option<DateTime<Utc>>,
	pub user_id: Option<String>,
	pub organization_id: Option<String>,
	pub hostname: String,
	pub subdomain: String,
	pub identification_code: String,
	pub public: bool,
	pub google_user_id: Option<String>,
	pub google_user_email: Option<String>,
	pub gsc_domain: Option<String>,
	pub new_owner: Option<i64>,
	pub timezone: Option<String>,
	pub group_by_title: bool,
	pub active_visitors_seconds: Option<u32>,
	pub disable_scripts: bool,
	pub statistics_start: Option<DateTime<Utc>>,
	pub user_role: String,
}

/// Visitor counts for one time bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorStats {
	pub day: Option<DateTime<Utc>>,
	pub week: Option<DateTime<Utc>>,
	pub month: Option<DateTime<Utc>>,
	pub year: Option<DateTime<Utc>>,
	pub visitors: u64,
	pub views: u64,
	pub sessions: u64,
	pub bounces: u64,
	pub bounce_rate: f64,
	pub cr: f64,
	pub custom_metric_avg: f64,
	pub custom_metric_total: f64,
}

/// Average session duration or time on page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSpentStats {
	pub day: Option<DateTime<Utc>>,
	pub week: Option<DateTime<Utc>>,
	pub month: Option<DateTime<Utc>>,
	pub year: Option<DateTime<Utc>>,
	pub path: String,
	pub title: String,
	pub average_time_spent_seconds: u64,
}

/// Visitor statistics for one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageStats {
	pub path: String,
	pub title: String,
	pub visitors: u64,
	pub views: u64,
	pub sessions: u64,
	pub bounces: u64,
	pub relative_visitors: f64,
	pub relative_views: f64,
	pub bounce_rate: f64,
	pub average_time_spent_seconds: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmSourceStats {
	pub utm_source: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmMediumStats {
	pub utm_medium: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmCampaignStats {
	pub utm_campaign: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmContentStats {
	pub utm_content: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmTermStats {
	pub utm_term: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

/// A page conversion goal and how it performed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionGoal {
	pub page_goal: PageConversionGoal,
	pub stats: ConversionGoalStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConversionGoal {
	pub id: String,
	pub domain_id: String,
	pub name: String,
	pub path_pattern: String,
	pub pattern: String,
	pub email_reached: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionGoalStats {
	pub visitors: u64,
	pub views: u64,
	pub cr: f64,
}

/// Counts for a custom event, optionally broken down by a metadata value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventStats {
	pub name: String,
	pub visitors: u64,
	pub views: u64,
	pub cr: f64,
	pub average_duration_seconds: u64,
	#[serde(deserialize_with = "null_as_empty")]
	pub meta_keys: Vec<String>,
	pub meta_value: String,
}

/// Relative change compared to the previous period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Growth {
	pub visitors_growth: f64,
	pub views_growth: f64,
	pub sessions_growth: f64,
	pub bounces_growth: f64,
	pub time_spent_growth: f64,
	pub cr_growth: f64,
	pub custom_metric_avg_growth: f64,
	pub custom_metric_total_growth: f64,
}

/// Visitors active within the look-back window and the pages they are on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveVisitorsData {
	#[serde(deserialize_with = "null_as_empty")]
	pub stats: Vec<ActivePageStats>,
	pub visitors: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivePageStats {
	pub path: String,
	pub title: String,
	pub visitors: u64,
}

/// Visitor counts for one hour of the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorHourStats {
	pub hour: u8,
	pub visitors: u64,
	pub views: u64,
	pub sessions: u64,
	pub bounces: u64,
	pub bounce_rate: f64,
	pub cr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageStats {
	pub language: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferrerStats {
	pub referrer: String,
	pub referrer_name: String,
	pub referrer_icon: String,
	pub visitors: u64,
	pub sessions: u64,
	pub relative_visitors: f64,
	pub bounces: u64,
	pub bounce_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsStats {
	pub os: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserStats {
	pub browser: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountryStats {
	pub country_code: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

/// Desktop/mobile split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformStats {
	pub platform_desktop: u64,
	pub platform_mobile: u64,
	pub platform_unknown: u64,
	pub relative_platform_desktop: f64,
	pub relative_platform_mobile: f64,
	pub relative_platform_unknown: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenClassStats {
	pub screen_class: String,
	pub visitors: u64,
	pub relative_visitors: f64,
}

/// Search keyword data imported from Google Search Console.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Keyword {
	#[serde(deserialize_with = "null_as_empty")]
	pub keys: Vec<String>,
	pub clicks: u64,
	pub impressions: u64,
	pub ctr: f64,
	pub position: f64,
}
