// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The HTTP transport seam.
//!
//! The SDK only needs "send method, URL, headers and body; receive status,
//! headers and body". Connection pooling, TLS, redirects and timeouts belong
//! to the [`Transport`] implementation. [`ReqwestTransport`] is the default.

use std::time::Duration;

use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

/// A fully built outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
	pub headers: HeaderMap,
	pub body: Option<Bytes>,
}

/// The response to an [`HttpRequest`].
#[derive(Debug, Clone)]
pub struct HttpResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl HttpResponse {
	/// Returns the body as text, replacing invalid UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Connection-level failure: the request never produced a response.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("HTTP request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("HTTP request failed: {0}")]
	Other(String),
}

/// Executes a single HTTP request.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	/// Creates a transport with the SDK User-Agent and a request timeout.
	pub fn new(timeout: Duration) -> Result<Self, TransportError> {
		let client = pirsch_common_http::new_client_with_timeout(timeout)?;
		Ok(Self { client })
	}

	/// Wraps an existing client, e.g. one with a proxy configured.
	pub fn with_client(client: reqwest::Client) -> Self {
		Self { client }
	}
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
	async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
		let mut builder = self
			.client
			.request(request.method, &request.url)
			.headers(request.headers);

		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		let response = builder.send().await?;
		let status = response.status();
		let headers = response.headers().clone();
		let body = response.bytes().await?;

		Ok(HttpResponse {
			status,
			headers,
			body,
		})
	}
}

#[cfg(test)]
pub(crate) mod mock {
	//! Scripted in-memory transport for unit tests.

	use std::sync::Mutex;

	use super::*;

	type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

	pub struct MockTransport {
		handler: Handler,
		calls: Mutex<Vec<HttpRequest>>,
	}

	impl MockTransport {
		pub fn new<F>(handler: F) -> Self
		where
			F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
		{
			Self {
				handler: Box::new(handler),
				calls: Mutex::new(Vec::new()),
			}
		}

		pub fn calls(&self) -> Vec<HttpRequest> {
			self.calls.lock().unwrap().clone()
		}

		pub fn call_count(&self) -> usize {
			self.calls.lock().unwrap().len()
		}

		/// Number of requests whose URL path ends with `suffix`, ignoring the query.
		pub fn calls_to(&self, suffix: &str) -> usize {
			self.calls
				.lock()
				.unwrap()
				.iter()
				.filter(|r| r.url.split('?').next().unwrap_or("").ends_with(suffix))
				.count()
		}
	}

	#[async_trait::async_trait]
	impl Transport for MockTransport {
		async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
			self.calls.lock().unwrap().push(request.clone());
			tokio::task::yield_now().await;
			(self.handler)(&request)
		}
	}

	pub fn response(status: u16, body: &str) -> Result<HttpResponse, TransportError> {
		Ok(HttpResponse {
			status: StatusCode::from_u16(status).unwrap(),
			headers: HeaderMap::new(),
			body: Bytes::from(body.to_string()),
		})
	}

	pub fn bearer(request: &HttpRequest) -> Option<String> {
		request
			.headers
			.get(http::header::AUTHORIZATION)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.strip_prefix("Bearer "))
			.map(str::to_string)
	}

	pub fn token_body(token: &str, expires_in: chrono::Duration) -> String {
		serde_json::json!({
			"access_token": token,
			"expires_at": (chrono::Utc::now() + expires_in).to_rfc3339(),
		})
		.to_string()
	}
}
