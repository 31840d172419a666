// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for chain refreshes.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	refreshed_tokens: AtomicU64,
}
impl RefreshMetrics {
	/// Returns the total number of `refresh_tokens` calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that left a valid chain (including no-op calls).
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of failed calls.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many individual tokens were re-requested across all calls.
	pub fn refreshed_tokens(&self) -> u64 {
		self.refreshed_tokens.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refreshed_token(&self) {
		self.refreshed_tokens.fetch_add(1, Ordering::Relaxed);
	}
}
