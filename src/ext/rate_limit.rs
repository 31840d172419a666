//! Rate limit policy contract consulted before a request leaves the process.

// self
use crate::{_prelude::*, ratelimit::LimitDirection};

/// Boxed future returned by [`RateLimitPolicy::evaluate`].
pub type RateLimitFuture<'a, Error> =
	Pin<Box<dyn Future<Output = Result<RateLimitDecision, Error>> + 'a + Send>>;

/// Strategy that inspects an endpoint budget before a call is sent.
pub trait RateLimitPolicy<Error>
where
	Self: Send + Sync,
{
	/// Evaluates whether the next call should be delayed.
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitFuture<'_, Error>;
}

/// Context shared with a [`RateLimitPolicy`] before an outbound call is made.
#[derive(Clone, Debug)]
pub struct RateLimitContext {
	/// Budget the call draws from.
	pub direction: LimitDirection,
	/// Logical operation being attempted, used in delay reasons.
	pub operation: String,
	/// Instant observed before invoking the policy.
	pub observed_at: OffsetDateTime,
}
impl RateLimitContext {
	/// Creates a context observed at the current UTC instant.
	pub fn new(direction: LimitDirection, operation: impl Into<String>) -> Self {
		Self { direction, operation: operation.into(), observed_at: OffsetDateTime::now_utc() }
	}

	/// Overrides the timestamp associated with the observation.
	pub fn with_observed_at(mut self, instant: OffsetDateTime) -> Self {
		self.observed_at = instant;

		self
	}
}

/// Result emitted by a [`RateLimitPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately.
	Allow,
	/// The request should be delayed.
	Delay(RetryDirective),
}

/// Advises callers when to retry after a [`RateLimitDecision::Delay`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when it is safe to retry.
	pub earliest_retry_at: OffsetDateTime,
	/// Suggested backoff duration.
	pub recommended_backoff: Duration,
	/// Optional descriptive string.
	pub reason: Option<String>,
}
impl RetryDirective {
	/// Creates a new directive with the provided timing metadata.
	pub fn new(earliest_retry_at: OffsetDateTime, recommended_backoff: Duration) -> Self {
		Self { earliest_retry_at, recommended_backoff, reason: None }
	}

	/// Adds a human-readable reason.
	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());

		self
	}
}
