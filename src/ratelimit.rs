//! Client-side admission control mirroring the service's burst and sustain quotas.
//!
//! Callers take a slot with [`EndpointRateLimits::acquire`] right before a request goes out.
//! It admits and counts the request under one guard. [`EndpointRateLimits::admit`] is a
//! non-counting pre-check, and [`EndpointRateLimits::record`] counts without checking.

mod combined;
mod single;

pub use combined::CombinedRateLimit;
pub use single::SingleRateLimit;

// self
use crate::{
	_prelude::*,
	ext::{RateLimitContext, RateLimitDecision, RateLimitFuture, RateLimitPolicy, RetryDirective},
};

/// Window kind of a [`SingleRateLimit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePeriod {
	/// Short window (15 s by default).
	Burst,
	/// Long window (300 s by default).
	Sustain,
}
impl TimePeriod {
	/// Window length used unless a limit is built with an explicit one.
	pub const fn default_window(self) -> Duration {
		match self {
			TimePeriod::Burst => Duration::seconds(15),
			TimePeriod::Sustain => Duration::seconds(300),
		}
	}
}

/// Traffic direction a limit applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LimitDirection {
	/// GET-style requests.
	Read,
	/// Requests that change server state.
	Write,
}
impl LimitDirection {
	/// Returns a stable label suitable for logs and errors.
	pub const fn as_str(self) -> &'static str {
		match self {
			LimitDirection::Read => "read",
			LimitDirection::Write => "write",
		}
	}
}
impl Display for LimitDirection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Counter snapshot returned by every increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IncrementResult {
	/// Counter after the increment.
	pub counter: u32,
	/// Whether the limit is now exhausted.
	pub exceeded: bool,
}

/// Limit for one period, either shared by both directions or split per direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LimitValue {
	/// Same limit for reads and writes.
	Uniform(u32),
	/// Separate limits.
	Split {
		/// Read limit.
		read: u32,
		/// Write limit.
		write: u32,
	},
}
impl LimitValue {
	/// Limit that applies to `direction`.
	pub fn for_direction(self, direction: LimitDirection) -> u32 {
		match (self, direction) {
			(LimitValue::Uniform(value), _) => value,
			(LimitValue::Split { read, .. }, LimitDirection::Read) => read,
			(LimitValue::Split { write, .. }, LimitDirection::Write) => write,
		}
	}
}

/// Rate limits published for one endpoint provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
	/// Burst window limit.
	pub burst: LimitValue,
	/// Sustain window limit.
	pub sustain: LimitValue,
}

/// Read and write limits shared by every call made through one endpoint provider.
#[derive(Clone, Debug)]
pub struct EndpointRateLimits {
	read: Arc<CombinedRateLimit>,
	write: Arc<CombinedRateLimit>,
}
impl EndpointRateLimits {
	/// Builds both directions from a provider configuration.
	pub fn from_config(config: &RateLimitConfig) -> Self {
		Self {
			read: Arc::new(CombinedRateLimit::from_config(config, LimitDirection::Read)),
			write: Arc::new(CombinedRateLimit::from_config(config, LimitDirection::Write)),
		}
	}

	/// Limit for `direction`.
	pub fn get(&self, direction: LimitDirection) -> &Arc<CombinedRateLimit> {
		match direction {
			LimitDirection::Read => &self.read,
			LimitDirection::Write => &self.write,
		}
	}

	/// Fails with [`Error::RateLimitExceeded`] when `direction` is exhausted at `now`.
	pub fn admit_at(&self, direction: LimitDirection, now: OffsetDateTime) -> Result<()> {
		let limit = self.get(direction);

		if limit.is_exceeded_at(now) {
			return Err(Error::RateLimitExceeded {
				limit: limit.clone(),
				reset_after: limit.reset_after_at(now),
			});
		}

		Ok(())
	}

	/// Clock-driven variant of [`admit_at`](Self::admit_at).
	pub fn admit(&self, direction: LimitDirection) -> Result<()> {
		self.admit_at(direction, OffsetDateTime::now_utc())
	}

	/// Admits and counts one request for `direction` at `now` in a single step.
	///
	/// Fails with [`Error::RateLimitExceeded`] and counts nothing when `direction` is
	/// exhausted.
	pub fn acquire_at(
		&self,
		direction: LimitDirection,
		now: OffsetDateTime,
	) -> Result<IncrementResult> {
		let limit = self.get(direction);

		limit.try_increment_at(now).ok_or_else(|| Error::RateLimitExceeded {
			limit: limit.clone(),
			reset_after: limit.reset_after_at(now),
		})
	}

	/// Clock-driven variant of [`acquire_at`](Self::acquire_at).
	pub fn acquire(&self, direction: LimitDirection) -> Result<IncrementResult> {
		self.acquire_at(direction, OffsetDateTime::now_utc())
	}

	/// Counts an attempted request at `now`.
	pub fn record_at(&self, direction: LimitDirection, now: OffsetDateTime) -> IncrementResult {
		self.get(direction).increment_at(now)
	}

	/// Clock-driven variant of [`record_at`](Self::record_at).
	pub fn record(&self, direction: LimitDirection) -> IncrementResult {
		self.record_at(direction, OffsetDateTime::now_utc())
	}
}
impl RateLimitPolicy<Error> for EndpointRateLimits {
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitFuture<'_, Error> {
		let limit = self.get(context.direction).clone();
		let observed_at = context.observed_at;
		let operation = context.operation.clone();

		Box::pin(async move {
			if !limit.is_exceeded_at(observed_at) {
				return Ok(RateLimitDecision::Allow);
			}

			let earliest = limit.reset_after_at(observed_at).unwrap_or(observed_at);
			let backoff = (earliest - observed_at).max(Duration::ZERO);

			Ok(RateLimitDecision::Delay(
				RetryDirective::new(earliest, backoff).with_reason(format!(
					"{} limit exhausted for {operation} after {} requests",
					limit.direction(),
					limit.counter()
				)),
			))
		})
	}
}
