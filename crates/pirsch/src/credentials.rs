// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bearer credential storage with de-duplicated refresh.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::secret::SecretString;

/// A credential is stale this long before it actually expires.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// An access token and the instant it expires.
#[derive(Debug, Clone)]
pub struct Credential {
	access_token: SecretString,
	expires_at: DateTime<Utc>,
}

impl Credential {
	pub fn new(access_token: impl Into<SecretString>, expires_at: DateTime<Utc>) -> Self {
		Self {
			access_token: access_token.into(),
			expires_at,
		}
	}

	/// The credential a client starts with: no token, already expired.
	pub fn empty() -> Self {
		Self {
			access_token: SecretString::default(),
			expires_at: DateTime::<Utc>::MIN_UTC,
		}
	}

	pub fn access_token(&self) -> &str {
		self.access_token.expose()
	}

	pub fn expires_at(&self) -> DateTime<Utc> {
		self.expires_at
	}

	/// True until a token has been obtained.
	pub fn is_empty(&self) -> bool {
		self.access_token.is_empty()
	}

	/// True when the token expires strictly after `now` plus the safety margin.
	pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
		!self.is_empty() && self.expires_at > now + Duration::seconds(SAFETY_MARGIN_SECS)
	}

	pub fn is_usable(&self) -> bool {
		self.is_usable_at(Utc::now())
	}
}

impl Default for Credential {
	fn default() -> Self {
		Self::empty()
	}
}

/// Holds the current credential.
///
/// Reads take a shared lock and never see a half-written credential.
/// Refreshes are serialized by a separate gate, so readers are not blocked
/// while the token exchange is in flight; the value lock is only held for
/// the swap.
#[derive(Debug, Default)]
pub struct CredentialStore {
	current: RwLock<Credential>,
	refresh_gate: Mutex<()>,
}

impl CredentialStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_credential(credential: Credential) -> Self {
		Self {
			current: RwLock::new(credential),
			refresh_gate: Mutex::new(()),
		}
	}

	/// Returns a snapshot of the current credential.
	pub async fn read(&self) -> Credential {
		self.current.read().await.clone()
	}

	/// Replaces the credential through `refresh` unless it no longer needs it.
	///
	/// After the gate is acquired the stored credential is checked again. It
	/// is kept, and `refresh` is not called, when it is still usable and is
	/// not the token the caller saw `rejected`. Callers that queued behind a
	/// refresh therefore pick up its result instead of exchanging again.
	///
	/// A caller that names a `rejected` token also keeps a stored token that
	/// differs from it and has not expired yet, even inside the safety margin.
	/// The server may hand out tokens that are already within the margin.
	///
	/// If `refresh` fails the stored credential is left untouched.
	pub async fn compare_and_refresh<F, Fut, E>(
		&self,
		rejected: Option<&str>,
		refresh: F,
	) -> Result<Credential, E>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<Credential, E>>,
	{
		let _gate = self.refresh_gate.lock().await;

		let current = self.read().await;
		let was_rejected = rejected.is_some_and(|token| token == current.access_token());
		if current.is_usable() && !was_rejected {
			return Ok(current);
		}
		let replaced = rejected.is_some() && !current.is_empty() && !was_rejected;
		if replaced && current.expires_at() > Utc::now() {
			return Ok(current);
		}

		let fresh = refresh().await?;
		*self.current.write().await = fresh.clone();
		Ok(fresh)
	}
}
