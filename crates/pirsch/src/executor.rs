// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sends authenticated requests and re-authenticates on 401.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use pirsch_common_http::Backoff;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::Authenticator;
use crate::credentials::CredentialStore;
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Executes requests against the Pirsch API with the stored bearer token.
#[derive(Clone)]
pub struct RequestExecutor {
	transport: Arc<dyn Transport>,
	store: Arc<CredentialStore>,
	authenticator: Authenticator,
	backoff: Backoff,
}

impl RequestExecutor {
	pub fn new(
		transport: Arc<dyn Transport>,
		store: Arc<CredentialStore>,
		authenticator: Authenticator,
		backoff: Backoff,
	) -> Self {
		Self {
			transport,
			store,
			authenticator,
			backoff,
		}
	}

	/// Sends `body` to `url`, retrying up to `max_retries` times on 401.
	///
	/// Every 401 waits for the backoff delay, refreshes the credential and
	/// sends again, so the server sees at most `max_retries + 1` requests.
	/// Transport failures and every other non-success status end the call
	/// immediately.
	pub async fn execute(
		&self,
		method: Method,
		url: &str,
		body: Option<Bytes>,
		max_retries: u32,
	) -> Result<HttpResponse> {
		let mut credential = self.store.read().await;

		if method == Method::GET && credential.is_empty() {
			credential = self
				.authenticator
				.refresh(Some(credential.access_token()))
				.await?;
		}

		let mut attempt: u32 = 0;
		loop {
			let request = envelope(&method, url, body.clone(), credential.access_token())?;

			debug!(method = %method, url = %url, attempt, "Sending request");
			let response = self.transport.send(request).await?;

			if response.status.is_success() {
				return Ok(response);
			}

			if response.status != StatusCode::UNAUTHORIZED {
				return Err(Error::Status {
					url: url.to_string(),
					status: response.status.as_u16(),
					body: response.text(),
				});
			}

			if attempt >= max_retries {
				return Err(Error::Unauthorized {
					url: url.to_string(),
					attempts: attempt + 1,
					body: response.text(),
				});
			}

			let delay = self.backoff.delay(attempt);
			warn!(
				url = %url,
				attempt,
				delay_ms = delay.as_millis() as u64,
				"Request unauthorized, re-authenticating"
			);
			tokio::time::sleep(delay).await;

			credential = self
				.authenticator
				.refresh(Some(credential.access_token()))
				.await?;
			attempt += 1;
		}
	}

	/// POSTs `body` as JSON. The response body is ignored.
	pub async fn post<B: Serialize + ?Sized>(
		&self,
		url: &str,
		body: &B,
		max_retries: u32,
	) -> Result<()> {
		let body = serde_json::to_vec(body).map_err(Error::Serialize)?;
		self.execute(Method::POST, url, Some(Bytes::from(body)), max_retries)
			.await?;
		Ok(())
	}

	/// GETs `url` and decodes the JSON response.
	pub async fn get<T: DeserializeOwned>(&self, url: &str, max_retries: u32) -> Result<T> {
		let response = self.execute(Method::GET, url, None, max_retries).await?;
		serde_json::from_slice(&response.body).map_err(|source| Error::Decode {
			url: url.to_string(),
			source,
		})
	}
}

fn envelope(method: &Method, url: &str, body: Option<Bytes>, token: &str) -> Result<HttpRequest> {
	let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"))?;
	authorization.set_sensitive(true);

	let mut headers = HeaderMap::new();
	headers.insert(header::AUTHORIZATION, authorization);
	headers.insert(
		header::CONTENT_TYPE,
		HeaderValue::from_static("application/json"),
	);

	Ok(HttpRequest {
		method: method.clone(),
		url: url.to_string(),
		headers,
		body,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::auth::{ClientIdentity, AUTHENTICATION_ENDPOINT};
	use crate::credentials::Credential;
	use crate::secret::SecretString;
	use crate::transport::mock::{bearer, response, token_body, MockTransport};
	use crate::transport::TransportError;
	use chrono::{Duration, Utc};
	use pirsch_core::Domain;

	const URL: &str = "https://api.pirsch.io/api/v1/statistics/visitor?from=2023-08-01&id=abc&to=2023-08-20";

	fn executor(transport: Arc<MockTransport>, store: Arc<CredentialStore>) -> RequestExecutor {
		executor_with_backoff(transport, store, Backoff::none())
	}

	fn executor_with_backoff(
		transport: Arc<MockTransport>,
		store: Arc<CredentialStore>,
		backoff: Backoff,
	) -> RequestExecutor {
		let identity = Arc::new(ClientIdentity {
			client_id: "id".to_string(),
			client_secret: SecretString::new("secret"),
			hostname: "example.com".to_string(),
			base_url: "https://api.pirsch.io".to_string(),
		});
		let authenticator = Authenticator::new(identity, transport.clone(), Arc::clone(&store));
		RequestExecutor::new(transport, store, authenticator, backoff)
	}

	/// Issues "fresh" tokens and only accepts requests that carry one.
	fn accepts_fresh_token() -> MockTransport {
		MockTransport::new(|request| {
			if request.url.ends_with(AUTHENTICATION_ENDPOINT) {
				return response(200, &token_body("fresh", Duration::hours(1)));
			}
			match bearer(request).as_deref() {
				Some("fresh") => response(200, "[]"),
				_ => response(401, "token expired"),
			}
		})
	}

	fn stored(token: &str, expires_in: Duration) -> Arc<CredentialStore> {
		Arc::new(CredentialStore::with_credential(Credential::new(
			token,
			Utc::now() + expires_in,
		)))
	}

	#[tokio::test]
	async fn test_valid_token_is_used_without_authentication() {
		let transport = Arc::new(MockTransport::new(|_| response(200, "[]")));
		let exec = executor(Arc::clone(&transport), stored("valid", Duration::hours(1)));

		let result: Vec<serde_json::Value> = exec.get(URL, 5).await.unwrap();
		assert!(result.is_empty());
		assert_eq!(transport.calls_to(AUTHENTICATION_ENDPOINT), 0);
		assert_eq!(transport.call_count(), 1);

		let call = &transport.calls()[0];
		assert_eq!(bearer(call).as_deref(), Some("valid"));
		assert_eq!(
			call.headers.get(header::CONTENT_TYPE).unwrap(),
			"application/json"
		);
		assert!(call.headers.get(header::AUTHORIZATION).unwrap().is_sensitive());
		assert!(call.body.is_none());
	}

	#[tokio::test]
	async fn test_unauthenticated_read_authenticates_first() {
		let transport = Arc::new(accepts_fresh_token());
		let exec = executor(Arc::clone(&transport), Arc::new(CredentialStore::new()));

		let _: Vec<serde_json::Value> = exec.get(URL, 5).await.unwrap();

		let calls = transport.calls();
		assert_eq!(calls.len(), 2);
		assert!(calls[0].url.ends_with(AUTHENTICATION_ENDPOINT));
		assert_eq!(calls[1].url, URL);
		assert_eq!(bearer(&calls[1]).as_deref(), Some("fresh"));
	}

	#[tokio::test]
	async fn test_write_with_empty_credential_sends_directly() {
		let transport = Arc::new(accepts_fresh_token());
		let exec = executor(Arc::clone(&transport), Arc::new(CredentialStore::new()));

		exec.post(
			"https://api.pirsch.io/api/v1/hit",
			&serde_json::json!({"url": "https://example.com/"}),
			5,
		)
		.await
		.unwrap();

		let calls = transport.calls();
		assert_eq!(calls.len(), 3);
		assert_eq!(calls[0].method, Method::POST);
		assert!(calls[0].url.ends_with("/api/v1/hit"));
		assert!(calls[1].url.ends_with(AUTHENTICATION_ENDPOINT));
		assert_eq!(bearer(&calls[2]).as_deref(), Some("fresh"));
		assert_eq!(calls[0].body, calls[2].body);
	}

	#[tokio::test]
	async fn test_expired_credential_refreshes_once_for_concurrent_callers() {
		let transport = Arc::new(accepts_fresh_token());
		let exec = executor(Arc::clone(&transport), stored("stale", Duration::minutes(-1)));

		let callers = (0..20).map(|_| exec.get::<Vec<serde_json::Value>>(URL, 5));
		let results = futures::future::join_all(callers).await;

		assert!(results.iter().all(|r| r.is_ok()));
		assert_eq!(transport.calls_to(AUTHENTICATION_ENDPOINT), 1);
	}

	#[tokio::test]
	async fn test_short_lived_tokens_are_shared_by_concurrent_callers() {
		let transport = Arc::new(MockTransport::new(|request| {
			if request.url.ends_with(AUTHENTICATION_ENDPOINT) {
				return response(200, &token_body("fresh", Duration::seconds(30)));
			}
			match bearer(request).as_deref() {
				Some("fresh") => response(200, "[]"),
				_ => response(401, "token expired"),
			}
		}));
		let exec = executor(Arc::clone(&transport), stored("stale", Duration::minutes(-1)));

		let callers = (0..20).map(|_| exec.get::<Vec<serde_json::Value>>(URL, 5));
		let results = futures::future::join_all(callers).await;

		assert!(results.iter().all(|r| r.is_ok()));
		assert_eq!(transport.calls_to(AUTHENTICATION_ENDPOINT), 1);
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
	async fn test_expired_credential_refreshes_once_across_threads() {
		let transport = Arc::new(accepts_fresh_token());
		let exec = executor(Arc::clone(&transport), stored("stale", Duration::minutes(-1)));

		let mut handles = Vec::new();
		for _ in 0..20 {
			let exec = exec.clone();
			handles.push(tokio::spawn(async move {
				exec.get::<Vec<serde_json::Value>>(URL, 5).await
			}));
		}
		for handle in handles {
			assert!(handle.await.unwrap().is_ok());
		}
		assert_eq!(transport.calls_to(AUTHENTICATION_ENDPOINT), 1);
	}

	#[tokio::test]
	async fn test_persistent_unauthorized_exhausts_budget() {
		let transport = Arc::new(MockTransport::new(|request| {
			if request.url.ends_with(AUTHENTICATION_ENDPOINT) {
				response(200, &token_body("fresh", Duration::hours(1)))
			} else {
				response(401, "nope")
			}
		}));
		let exec = executor(Arc::clone(&transport), stored("stale", Duration::minutes(-1)));

		let err = exec
			.get::<Vec<serde_json::Value>>(URL, 3)
			.await
			.unwrap_err();

		assert!(matches!(
			err,
			Error::Unauthorized { attempts: 4, ref body, .. } if body == "nope"
		));
		assert_eq!(transport.calls_to("/api/v1/statistics/visitor"), 4);
		assert_eq!(transport.calls_to(AUTHENTICATION_ENDPOINT), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_unauthorized_resends_follow_linear_backoff() {
		let sent_at = Arc::new(std::sync::Mutex::new(Vec::new()));
		let log = Arc::clone(&sent_at);
		let transport = Arc::new(MockTransport::new(move |request| {
			if request.url.ends_with(AUTHENTICATION_ENDPOINT) {
				return response(200, &token_body("fresh", Duration::hours(1)));
			}
			log.lock().unwrap().push(tokio::time::Instant::now());
			response(401, "")
		}));
		let exec = executor_with_backoff(
			Arc::clone(&transport),
			stored("stale", Duration::minutes(-1)),
			Backoff::default(),
		);

		let start = tokio::time::Instant::now();
		let err = exec
			.get::<Vec<serde_json::Value>>(URL, 3)
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Unauthorized { attempts: 4, .. }));

		let offsets: Vec<u64> = sent_at
			.lock()
			.unwrap()
			.iter()
			.map(|at| at.duration_since(start).as_millis() as u64)
			.collect();
		// 50ms, 150ms and 250ms between the four sends
		assert_eq!(offsets, vec![0, 50, 200, 450]);
	}

	#[tokio::test]
	async fn test_zero_retries_sends_once() {
		let transport = Arc::new(MockTransport::new(|_| response(401, "")));
		let exec = executor(Arc::clone(&transport), stored("valid", Duration::hours(1)));

		let err = exec
			.get::<Vec<serde_json::Value>>(URL, 0)
			.await
			.unwrap_err();
		assert!(matches!(err, Error::Unauthorized { attempts: 1, .. }));
		assert_eq!(transport.call_count(), 1);
	}

	#[tokio::test]
	async fn test_transport_error_is_not_retried() {
		let transport = Arc::new(MockTransport::new(|_| {
			Err(TransportError::Other("connection refused".to_string()))
		}));
		let exec = executor(Arc::clone(&transport), Arc::new(CredentialStore::new()));

		let err = exec
			.post("http://127.0.0.1:1/api/v1/hit", &serde_json::json!({}), 5)
			.await
			.unwrap_err();

		assert!(err.is_transport());
		assert_eq!(transport.call_count(), 1);
	}

	#[tokio::test]
	async fn test_server_error_is_terminal() {
		let transport = Arc::new(MockTransport::new(|_| response(500, "boom")));
		let exec = executor(Arc::clone(&transport), stored("valid", Duration::hours(1)));

		let err = exec
			.get::<Vec<serde_json::Value>>(URL, 5)
			.await
			.unwrap_err();

		assert!(matches!(err, Error::Status { status: 500, ref body, .. } if body == "boom"));
		assert_eq!(transport.call_count(), 1);
	}

	#[tokio::test]
	async fn test_invalid_json_is_a_decode_error() {
		let transport = Arc::new(MockTransport::new(|_| response(200, "{\"not\": \"a list\"}")));
		let exec = executor(Arc::clone(&transport), stored("valid", Duration::hours(1)));

		let err = exec.get::<Vec<Domain>>(URL, 5).await.unwrap_err();
		assert!(matches!(err, Error::Decode { ref url, .. } if url == URL));
	}

	#[tokio::test]
	async fn test_failed_authentication_keeps_credential() {
		let transport = Arc::new(MockTransport::new(|request| {
			if request.url.ends_with(AUTHENTICATION_ENDPOINT) {
				response(500, "auth down")
			} else {
				response(401, "")
			}
		}));
		let store = stored("stale", Duration::minutes(-1));
		let exec = executor(Arc::clone(&transport), Arc::clone(&store));

		let err = exec
			.get::<Vec<serde_json::Value>>(URL, 5)
			.await
			.unwrap_err();

		assert!(matches!(err, Error::Authentication(_)));
		assert_eq!(err.status(), Some(500));
		assert_eq!(store.read().await.access_token(), "stale");
		assert_eq!(transport.call_count(), 2);
	}
}
