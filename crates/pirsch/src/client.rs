// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pirsch API client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::Request;
use pirsch_common_http::Backoff;
use pirsch_core::{
	ActiveVisitorsData, BrowserStats, ConversionGoal, CountryStats, Domain, Event, EventStats,
	Filter, Growth, Hit, Keyword, LanguageStats, OsStats, PageStats, PlatformStats,
	ReferrerStats, ScreenClassStats, TimeSpentStats, UtmCampaignStats, UtmContentStats,
	UtmMediumStats, UtmSourceStats, UtmTermStats, VisitorHourStats, VisitorStats,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::auth::{Authenticator, ClientIdentity};
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::executor::RequestExecutor;
use crate::request::{do_not_track, hit_from_request, HitOptions};
use crate::secret::SecretString;
use crate::transport::{ReqwestTransport, Transport};

/// SDK version for identification.
const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BASE_URL: &str = "https://api.pirsch.io";
pub const DEFAULT_MAX_RETRIES: u32 = 5;

pub const ENV_CLIENT_ID: &str = "PIRSCH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "PIRSCH_CLIENT_SECRET";
pub const ENV_HOSTNAME: &str = "PIRSCH_HOSTNAME";
pub const ENV_BASE_URL: &str = "PIRSCH_BASE_URL";

const HIT_ENDPOINT: &str = "/api/v1/hit";
const EVENT_ENDPOINT: &str = "/api/v1/event";
const DOMAIN_ENDPOINT: &str = "/api/v1/domain";
const SESSION_DURATION_ENDPOINT: &str = "/api/v1/statistics/duration/session";
const TIME_ON_PAGE_ENDPOINT: &str = "/api/v1/statistics/duration/page";
const UTM_SOURCE_ENDPOINT: &str = "/api/v1/statistics/utm/source";
const UTM_MEDIUM_ENDPOINT: &str = "/api/v1/statistics/utm/medium";
const UTM_CAMPAIGN_ENDPOINT: &str = "/api/v1/statistics/utm/campaign";
const UTM_CONTENT_ENDPOINT: &str = "/api/v1/statistics/utm/content";
const UTM_TERM_ENDPOINT: &str = "/api/v1/statistics/utm/term";
const VISITORS_ENDPOINT: &str = "/api/v1/statistics/visitor";
const PAGES_ENDPOINT: &str = "/api/v1/statistics/page";
const CONVERSION_GOALS_ENDPOINT: &str = "/api/v1/statistics/goals";
const EVENTS_ENDPOINT: &str = "/api/v1/statistics/events";
const EVENT_METADATA_ENDPOINT: &str = "/api/v1/statistics/event/meta";
const GROWTH_RATE_ENDPOINT: &str = "/api/v1/statistics/growth";
const ACTIVE_VISITORS_ENDPOINT: &str = "/api/v1/statistics/active";
const TIME_OF_DAY_ENDPOINT: &str = "/api/v1/statistics/hours";
const LANGUAGE_ENDPOINT: &str = "/api/v1/statistics/language";
const REFERRER_ENDPOINT: &str = "/api/v1/statistics/referrer";
const OS_ENDPOINT: &str = "/api/v1/statistics/os";
const BROWSER_ENDPOINT: &str = "/api/v1/statistics/browser";
const COUNTRY_ENDPOINT: &str = "/api/v1/statistics/country";
const PLATFORM_ENDPOINT: &str = "/api/v1/statistics/platform";
const SCREEN_ENDPOINT: &str = "/api/v1/statistics/screen";
const KEYWORDS_ENDPOINT: &str = "/api/v1/statistics/keywords";

/// Configuration for the Pirsch client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
	/// API host, without a trailing slash.
	pub base_url: String,
	/// Timeout for HTTP requests.
	pub request_timeout: Duration,
	/// How often a request is re-sent after a 401.
	pub max_retries: u32,
	/// Delay schedule between those re-sends.
	pub backoff: Backoff,
}

impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: DEFAULT_BASE_URL.to_string(),
			request_timeout: Duration::from_secs(30),
			max_retries: DEFAULT_MAX_RETRIES,
			backoff: Backoff::default(),
		}
	}
}

/// Builder for constructing a [`PirschClient`].
pub struct PirschClientBuilder {
	client_id: Option<String>,
	client_secret: Option<SecretString>,
	hostname: Option<String>,
	transport: Option<Arc<dyn Transport>>,
	config: ClientConfig,
}

impl PirschClientBuilder {
	/// Creates a new builder with default settings.
	pub fn new() -> Self {
		Self {
			client_id: None,
			client_secret: None,
			hostname: None,
			transport: None,
			config: ClientConfig::default(),
		}
	}

	/// Creates a builder from `PIRSCH_CLIENT_ID`, `PIRSCH_CLIENT_SECRET`,
	/// `PIRSCH_HOSTNAME` and the optional `PIRSCH_BASE_URL`.
	///
	/// Unset variables are left unset and reported by [`build`](Self::build).
	pub fn from_env() -> Self {
		let mut builder = Self::new();
		if let Ok(id) = std::env::var(ENV_CLIENT_ID) {
			builder = builder.client_id(id);
		}
		if let Ok(secret) = std::env::var(ENV_CLIENT_SECRET) {
			builder = builder.client_secret(secret);
		}
		if let Ok(hostname) = std::env::var(ENV_HOSTNAME) {
			builder = builder.hostname(hostname);
		}
		if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
			builder = builder.base_url(base_url);
		}
		builder
	}

	pub fn client_id(mut self, id: impl Into<String>) -> Self {
		self.client_id = Some(id.into());
		self
	}

	pub fn client_secret(mut self, secret: impl Into<SecretString>) -> Self {
		self.client_secret = Some(secret.into());
		self
	}

	/// Sets the hostname hits and events are reported for.
	///
	/// Example: `example.com`
	pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
		self.hostname = Some(hostname.into());
		self
	}

	/// Overrides the API host. An empty string keeps the default.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		let url = url.into();
		self.config.base_url = if url.is_empty() {
			DEFAULT_BASE_URL.to_string()
		} else {
			url
		};
		self
	}

	/// Sets the HTTP request timeout.
	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.config.request_timeout = timeout;
		self
	}

	/// Sets how often a request is re-sent after a 401.
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.config.max_retries = max_retries;
		self
	}

	pub fn backoff(mut self, backoff: Backoff) -> Self {
		self.config.backoff = backoff;
		self
	}

	/// Replaces the `reqwest` transport. `request_timeout` is then up to
	/// the given transport.
	pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Builds the PirschClient.
	pub fn build(self) -> Result<PirschClient> {
		let client_id = self
			.client_id
			.filter(|id| !id.is_empty())
			.ok_or(Error::MissingCredentials("client id"))?;
		let client_secret = self
			.client_secret
			.filter(|secret| !secret.is_empty())
			.ok_or(Error::MissingCredentials("client secret"))?;
		let hostname = self
			.hostname
			.filter(|hostname| !hostname.is_empty())
			.ok_or(Error::MissingCredentials("hostname"))?;

		let mut config = self.config;
		config.base_url = normalize_base_url(&config.base_url)?;

		let transport: Arc<dyn Transport> = match self.transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::new(config.request_timeout)?),
		};

		let identity = Arc::new(ClientIdentity {
			client_id,
			client_secret,
			hostname,
			base_url: config.base_url.clone(),
		});
		let store = Arc::new(CredentialStore::new());
		let authenticator = Authenticator::new(
			Arc::clone(&identity),
			Arc::clone(&transport),
			Arc::clone(&store),
		);
		let executor = RequestExecutor::new(transport, store, authenticator, config.backoff);

		info!(
			base_url = %config.base_url,
			hostname = %identity.hostname,
			sdk_version = SDK_VERSION,
			"Pirsch client initialized"
		);

		Ok(PirschClient {
			inner: Arc::new(PirschClientInner {
				identity,
				executor,
				config,
			}),
		})
	}
}

impl Default for PirschClientBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn normalize_base_url(base_url: &str) -> Result<String> {
	let parsed =
		url::Url::parse(base_url).map_err(|e| Error::InvalidBaseUrl(format!("{base_url}: {e}")))?;
	if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
		return Err(Error::InvalidBaseUrl(base_url.to_string()));
	}
	Ok(base_url.trim_end_matches('/').to_string())
}

struct PirschClientInner {
	identity: Arc<ClientIdentity>,
	executor: RequestExecutor,
	config: ClientConfig,
}

/// Client for the Pirsch analytics API.
///
/// Cheap to clone; clones share the access token.
///
/// # Example
///
/// ```ignore
/// use pirsch::{Filter, PirschClient};
///
/// let client = PirschClient::builder()
///     .client_id("your_client_id")
///     .client_secret("your_client_secret")
///     .hostname("example.com")
///     .build()?;
///
/// // In a request handler
/// client.hit(&request).await?;
///
/// // Statistics
/// let domain = client.domain().await?;
/// let filter = Filter::new(domain.id, from, to);
/// let visitors = client.visitors(&filter).await?;
/// ```
#[derive(Clone)]
pub struct PirschClient {
	inner: Arc<PirschClientInner>,
}

impl PirschClient {
	pub fn builder() -> PirschClientBuilder {
		PirschClientBuilder::new()
	}

	pub fn hostname(&self) -> &str {
		&self.inner.identity.hostname
	}

	pub fn base_url(&self) -> &str {
		&self.inner.config.base_url
	}

	/// Sends a page hit for an inbound request.
	///
	/// Requests with `DNT: 1` are not reported. The hit is read from the
	/// request before the returned future is created, so the future does not
	/// borrow the request and stays `Send` for any body type.
	pub fn hit<B>(&self, request: &Request<B>) -> impl Future<Output = Result<()>> + Send + '_ {
		self.hit_with_options(request, &HitOptions::default())
	}

	pub fn hit_with_options<B>(
		&self,
		request: &Request<B>,
		options: &HitOptions,
	) -> impl Future<Output = Result<()>> + Send + '_ {
		let hit = if do_not_track(request) {
			debug!("Skipping hit, DNT is set");
			None
		} else {
			Some(hit_from_request(self.hostname(), request, options))
		};

		async move {
			match hit {
				Some(hit) => self.send_hit(hit).await,
				None => Ok(()),
			}
		}
	}

	/// Sends a hit built by the caller. An empty hostname is set to the
	/// client's hostname.
	pub async fn send_hit(&self, mut hit: Hit) -> Result<()> {
		if hit.hostname.is_empty() {
			hit.hostname = self.hostname().to_string();
		}
		self.post(HIT_ENDPOINT, &hit).await
	}

	/// Sends a custom event for an inbound request.
	///
	/// Requests with `DNT: 1` are not reported. Like [`PirschClient::hit`], the
	/// returned future does not borrow the request.
	pub fn event<B, I, K, V>(
		&self,
		name: &str,
		duration_seconds: u32,
		meta: I,
		request: &Request<B>,
	) -> impl Future<Output = Result<()>> + Send + '_
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.event_with_options(name, duration_seconds, meta, request, &HitOptions::default())
	}

	pub fn event_with_options<B, I, K, V>(
		&self,
		name: &str,
		duration_seconds: u32,
		meta: I,
		request: &Request<B>,
		options: &HitOptions,
	) -> impl Future<Output = Result<()>> + Send + '_
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let event = if do_not_track(request) {
			debug!(event = %name, "Skipping event, DNT is set");
			None
		} else {
			let hit = hit_from_request(self.hostname(), request, options);
			Some(Event::new(name, duration_seconds, hit).with_meta(meta))
		};

		async move {
			match event {
				Some(event) => self.send_event(event).await,
				None => Ok(()),
			}
		}
	}

	/// Sends an event built by the caller. An empty hostname is set to the
	/// client's hostname.
	pub async fn send_event(&self, mut event: Event) -> Result<()> {
		if event.hit.hostname.is_empty() {
			event.hit.hostname = self.hostname().to_string();
		}
		self.post(EVENT_ENDPOINT, &event).await
	}

	/// Returns the domain this client is registered for.
	pub async fn domain(&self) -> Result<Domain> {
		let url = format!("{}{}", self.base_url(), DOMAIN_ENDPOINT);
		let domains: Option<Vec<Domain>> = self
			.inner
			.executor
			.get(&url, self.inner.config.max_retries)
			.await?;
		let mut domains = domains.unwrap_or_default();

		match domains.len() {
			1 => Ok(domains.remove(0)),
			found => Err(Error::DomainNotFound { found }),
		}
	}

	/// Session duration grouped by day.
	pub async fn session_duration(&self, filter: &Filter) -> Result<Vec<TimeSpentStats>> {
		self.list(SESSION_DURATION_ENDPOINT, filter).await
	}

	/// Time on page grouped by day.
	pub async fn time_on_page(&self, filter: &Filter) -> Result<Vec<TimeSpentStats>> {
		self.list(TIME_ON_PAGE_ENDPOINT, filter).await
	}

	pub async fn utm_source(&self, filter: &Filter) -> Result<Vec<UtmSourceStats>> {
		self.list(UTM_SOURCE_ENDPOINT, filter).await
	}

	pub async fn utm_medium(&self, filter: &Filter) -> Result<Vec<UtmMediumStats>> {
		self.list(UTM_MEDIUM_ENDPOINT, filter).await
	}

	pub async fn utm_campaign(&self, filter: &Filter) -> Result<Vec<UtmCampaignStats>> {
		self.list(UTM_CAMPAIGN_ENDPOINT, filter).await
	}

	pub async fn utm_content(&self, filter: &Filter) -> Result<Vec<UtmContentStats>> {
		self.list(UTM_CONTENT_ENDPOINT, filter).await
	}

	pub async fn utm_term(&self, filter: &Filter) -> Result<Vec<UtmTermStats>> {
		self.list(UTM_TERM_ENDPOINT, filter).await
	}

	/// Visitors, views, sessions and bounces per time bucket.
	pub async fn visitors(&self, filter: &Filter) -> Result<Vec<VisitorStats>> {
		self.list(VISITORS_ENDPOINT, filter).await
	}

	pub async fn pages(&self, filter: &Filter) -> Result<Vec<PageStats>> {
		self.list(PAGES_ENDPOINT, filter).await
	}

	pub async fn conversion_goals(&self, filter: &Filter) -> Result<Vec<ConversionGoal>> {
		self.list(CONVERSION_GOALS_ENDPOINT, filter).await
	}

	pub async fn events(&self, filter: &Filter) -> Result<Vec<EventStats>> {
		self.list(EVENTS_ENDPOINT, filter).await
	}

	/// Metadata for one event. Set `event` and `event_meta_key` on the filter.
	pub async fn event_metadata(&self, filter: &Filter) -> Result<Vec<EventStats>> {
		self.list(EVENT_METADATA_ENDPOINT, filter).await
	}

	/// Growth compared to the previous period of the same length.
	pub async fn growth(&self, filter: &Filter) -> Result<Growth> {
		self.stats(GROWTH_RATE_ENDPOINT, filter).await
	}

	pub async fn active_visitors(&self, filter: &Filter) -> Result<ActiveVisitorsData> {
		self.stats(ACTIVE_VISITORS_ENDPOINT, filter).await
	}

	/// Visitors grouped by hour of day.
	pub async fn time_of_day(&self, filter: &Filter) -> Result<Vec<VisitorHourStats>> {
		self.list(TIME_OF_DAY_ENDPOINT, filter).await
	}

	pub async fn languages(&self, filter: &Filter) -> Result<Vec<LanguageStats>> {
		self.list(LANGUAGE_ENDPOINT, filter).await
	}

	pub async fn referrer(&self, filter: &Filter) -> Result<Vec<ReferrerStats>> {
		self.list(REFERRER_ENDPOINT, filter).await
	}

	pub async fn os(&self, filter: &Filter) -> Result<Vec<OsStats>> {
		self.list(OS_ENDPOINT, filter).await
	}

	pub async fn browser(&self, filter: &Filter) -> Result<Vec<BrowserStats>> {
		self.list(BROWSER_ENDPOINT, filter).await
	}

	pub async fn country(&self, filter: &Filter) -> Result<Vec<CountryStats>> {
		self.list(COUNTRY_ENDPOINT, filter).await
	}

	/// Share of desktop, mobile and unknown platforms.
	pub async fn platform(&self, filter: &Filter) -> Result<PlatformStats> {
		self.stats(PLATFORM_ENDPOINT, filter).await
	}

	pub async fn screen(&self, filter: &Filter) -> Result<Vec<ScreenClassStats>> {
		self.list(SCREEN_ENDPOINT, filter).await
	}

	/// Google Search Console keywords with rank and CTR.
	pub async fn keywords(&self, filter: &Filter) -> Result<Vec<Keyword>> {
		self.list(KEYWORDS_ENDPOINT, filter).await
	}

	/// Like `stats`, but a `null` body decodes as an empty list.
	async fn list<T: DeserializeOwned>(&self, path: &str, filter: &Filter) -> Result<Vec<T>> {
		let rows: Option<Vec<T>> = self.stats(path, filter).await?;
		Ok(rows.unwrap_or_default())
	}

	async fn stats<T: DeserializeOwned>(&self, path: &str, filter: &Filter) -> Result<T> {
		let url = pirsch_core::encode(self.base_url(), path, filter);
		self.inner
			.executor
			.get(&url, self.inner.config.max_retries)
			.await
	}

	async fn post<B: serde::Serialize>(&self, path: &str, body: &B) -> Result<()> {
		let url = format!("{}{}", self.base_url(), path);
		self.inner
			.executor
			.post(&url, body, self.inner.config.max_retries)
			.await
	}
}
