// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Pirsch SDK.

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure while exchanging client credentials for an access token.
///
/// The stored credential is never modified when this is returned.
#[derive(Debug, Error)]
pub enum AuthError {
	/// The token request could not be sent.
	#[error("token request failed: {0}")]
	Transport(#[from] TransportError),

	/// The server answered with a non-success status.
	#[error("token request rejected (status {status}): {body}")]
	Rejected { status: u16, body: String },

	/// The response body was not a valid token response.
	#[error("malformed token response: {0}")]
	MalformedResponse(#[source] serde_json::Error),

	/// The response did not contain a usable access token.
	#[error("token response contained no usable access token")]
	InvalidToken,

	/// The token request body could not be encoded.
	#[error("failed to encode token request: {0}")]
	Encode(#[source] serde_json::Error),
}

/// Pirsch SDK errors.
#[derive(Debug, Error)]
pub enum Error {
	/// Connection or timeout failure. Never retried.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The access token could not be obtained.
	#[error("authentication failed: {0}")]
	Authentication(#[from] AuthError),

	/// The server kept answering 401 until the retry budget ran out.
	#[error("{url}: still unauthorized after {attempts} attempts{}", body_suffix(.body))]
	Unauthorized {
		url: String,
		attempts: u32,
		body: String,
	},

	/// The server answered with a non-success status other than 401.
	#[error("{url}: received status code {status} on request{}", body_suffix(.body))]
	Status { url: String, status: u16, body: String },

	/// The server accepted the request but the body did not have the expected shape.
	#[error("{url}: failed to decode response: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},

	/// A request body could not be encoded.
	#[error("failed to encode request body: {0}")]
	Serialize(#[source] serde_json::Error),

	/// An access token could not be used as a header value.
	#[error("invalid header value: {0}")]
	InvalidHeader(#[from] http::header::InvalidHeaderValue),

	/// `domain()` expects exactly one domain for the client.
	#[error("domain not found (server returned {found} domains)")]
	DomainNotFound { found: usize },

	/// A required client setting is missing.
	#[error("missing {0}")]
	MissingCredentials(&'static str),

	/// The base URL is not an absolute http(s) URL.
	#[error("invalid base URL: {0}")]
	InvalidBaseUrl(String),
}

impl Error {
	/// Returns true for connection and timeout failures.
	pub fn is_transport(&self) -> bool {
		matches!(self, Error::Transport(_))
	}

	/// Returns the HTTP status the server answered with, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Error::Status { status, .. } => Some(*status),
			Error::Unauthorized { .. } => Some(401),
			Error::Authentication(AuthError::Rejected { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

fn body_suffix(body: &str) -> String {
	if body.is_empty() {
		String::new()
	} else {
		format!(": {body}")
	}
}
