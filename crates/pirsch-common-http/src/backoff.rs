// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Linear backoff between re-authentication retries.
//!
//! The delay grows by a fixed step per attempt so concurrent callers that hit
//! an expired token at the same moment spread out their retries.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
	/// Delay before the first retry.
	pub initial: Duration,
	/// Added for every further attempt.
	pub step: Duration,
}

impl Default for Backoff {
	fn default() -> Self {
		Self {
			initial: Duration::from_millis(50),
			step: Duration::from_millis(100),
		}
	}
}

impl Backoff {
	/// No delay at all. Useful in tests.
	pub fn none() -> Self {
		Self {
			initial: Duration::ZERO,
			step: Duration::ZERO,
		}
	}

	/// Delay before retry number `attempt` (zero-based).
	pub fn delay(&self, attempt: u32) -> Duration {
		self.initial.saturating_add(self.step.saturating_mul(attempt))
	}
}
