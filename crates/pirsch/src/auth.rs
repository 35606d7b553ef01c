// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Exchanges client credentials for a short-lived access token.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{header, HeaderMap, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::credentials::{Credential, CredentialStore};
use crate::error::AuthError;
use crate::secret::SecretString;
use crate::transport::{HttpRequest, Transport};

pub const AUTHENTICATION_ENDPOINT: &str = "/api/v1/token";

/// Long-lived identity of a client. Immutable once the client is built.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
	pub client_id: String,
	pub client_secret: SecretString,
	pub hostname: String,
	pub base_url: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
	client_id: &'a str,
	client_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_at: DateTime<Utc>,
}

/// Refreshes the credential in a [`CredentialStore`] through the token endpoint.
#[derive(Clone)]
pub struct Authenticator {
	identity: Arc<ClientIdentity>,
	transport: Arc<dyn Transport>,
	store: Arc<CredentialStore>,
}

impl Authenticator {
	pub fn new(
		identity: Arc<ClientIdentity>,
		transport: Arc<dyn Transport>,
		store: Arc<CredentialStore>,
	) -> Self {
		Self {
			identity,
			transport,
			store,
		}
	}

	/// Makes sure the store holds a usable credential that is not `rejected`.
	///
	/// Concurrent callers share one exchange. On failure the stored credential
	/// is unchanged and the error is logged.
	pub async fn refresh(&self, rejected: Option<&str>) -> Result<Credential, AuthError> {
		let result = self
			.store
			.compare_and_refresh(rejected, || self.exchange())
			.await;

		if let Err(e) = &result {
			error!(
				client_id = %self.identity.client_id,
				error = %e,
				"Failed to authenticate with Pirsch"
			);
		}

		result
	}

	async fn exchange(&self) -> Result<Credential, AuthError> {
		let url = format!("{}{}", self.identity.base_url, AUTHENTICATION_ENDPOINT);
		let body = serde_json::to_vec(&TokenRequest {
			client_id: &self.identity.client_id,
			client_secret: self.identity.client_secret.expose(),
		})
		.map_err(AuthError::Encode)?;

		let mut headers = HeaderMap::new();
		headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);

		debug!(url = %url, "Requesting access token");

		let response = self
			.transport
			.send(HttpRequest {
				method: Method::POST,
				url,
				headers,
				body: Some(Bytes::from(body)),
			})
			.await?;

		if !response.status.is_success() {
			return Err(AuthError::Rejected {
				status: response.status.as_u16(),
				body: response.text(),
			});
		}

		let token: TokenResponse =
			serde_json::from_slice(&response.body).map_err(AuthError::MalformedResponse)?;
		if token.access_token.is_empty() {
			return Err(AuthError::InvalidToken);
		}

		debug!(expires_at = %token.expires_at, "Obtained access token");
		Ok(Credential::new(token.access_token, token.expires_at))
	}
}
