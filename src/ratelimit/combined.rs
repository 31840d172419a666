// self
use crate::{
	_prelude::*,
	ratelimit::{IncrementResult, LimitDirection, RateLimitConfig, SingleRateLimit, TimePeriod},
};

/// Burst and sustain limits for one traffic direction, evaluated together.
#[derive(Debug)]
pub struct CombinedRateLimit {
	direction: LimitDirection,
	burst: SingleRateLimit,
	sustain: SingleRateLimit,
	gate: Mutex<()>,
}
impl CombinedRateLimit {
	/// Creates a combined limit with the default 15 s burst and 300 s sustain windows.
	pub fn new(direction: LimitDirection, burst: u32, sustain: u32) -> Self {
		Self::from_parts(
			direction,
			SingleRateLimit::new(TimePeriod::Burst, direction, burst),
			SingleRateLimit::new(TimePeriod::Sustain, direction, sustain),
		)
	}

	/// Creates a combined limit from explicit sub-limits.
	pub fn from_parts(
		direction: LimitDirection,
		burst: SingleRateLimit,
		sustain: SingleRateLimit,
	) -> Self {
		Self { direction, burst, sustain, gate: Mutex::new(()) }
	}

	/// Creates the combined limit for `direction` from a provider configuration.
	pub fn from_config(config: &RateLimitConfig, direction: LimitDirection) -> Self {
		Self::new(
			direction,
			config.burst.for_direction(direction),
			config.sustain.for_direction(direction),
		)
	}

	/// Read or write.
	pub fn direction(&self) -> LimitDirection {
		self.direction
	}

	/// Burst sub-limit.
	pub fn burst(&self) -> &SingleRateLimit {
		&self.burst
	}

	/// Sustain sub-limit.
	pub fn sustain(&self) -> &SingleRateLimit {
		&self.sustain
	}

	/// Both sub-limits.
	pub fn limits(&self) -> [&SingleRateLimit; 2] {
		[&self.burst, &self.sustain]
	}

	/// Highest counter across the sub-limits; a diagnostic, not a safety bound.
	pub fn counter(&self) -> u32 {
		self.burst.counter().max(self.sustain.counter())
	}

	/// True when either sub-limit is exhausted at `now`.
	pub fn is_exceeded_at(&self, now: OffsetDateTime) -> bool {
		// Evaluate both so each closes its own elapsed window.
		let burst = self.burst.is_exceeded_at(now);
		let sustain = self.sustain.is_exceeded_at(now);

		burst || sustain
	}

	/// Clock-driven variant of [`is_exceeded_at`](Self::is_exceeded_at).
	pub fn is_exceeded(&self) -> bool {
		self.is_exceeded_at(OffsetDateTime::now_utc())
	}

	/// Latest reset instant among the sub-limits exhausted at `now`.
	pub fn reset_after_at(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
		self.limits().into_iter().filter_map(|limit| limit.exceeded_reset_after_at(now)).max()
	}

	/// Clock-driven variant of [`reset_after_at`](Self::reset_after_at).
	pub fn reset_after(&self) -> Option<OffsetDateTime> {
		self.reset_after_at(OffsetDateTime::now_utc())
	}

	/// Counts one request in both sub-limits.
	pub fn increment_at(&self, now: OffsetDateTime) -> IncrementResult {
		let _gate = self.gate.lock();

		self.increment_locked(now)
	}

	/// Counts one request unless the limit is exhausted at `now`.
	///
	/// The check and the increment happen under one guard, so concurrent callers can never
	/// push the counter past the limit.
	pub fn try_increment_at(&self, now: OffsetDateTime) -> Option<IncrementResult> {
		let _gate = self.gate.lock();

		if self.is_exceeded_at(now) {
			return None;
		}

		Some(self.increment_locked(now))
	}

	/// Clock-driven variant of [`try_increment_at`](Self::try_increment_at).
	pub fn try_increment(&self) -> Option<IncrementResult> {
		self.try_increment_at(OffsetDateTime::now_utc())
	}

	/// Clock-driven variant of [`increment_at`](Self::increment_at).
	pub fn increment(&self) -> IncrementResult {
		self.increment_at(OffsetDateTime::now_utc())
	}

	fn increment_locked(&self, now: OffsetDateTime) -> IncrementResult {
		let burst = self.burst.increment_at(now);
		let sustain = self.sustain.increment_at(now);

		IncrementResult {
			counter: burst.counter.max(sustain.counter),
			exceeded: burst.exceeded || sustain.exceeded,
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn reset_after_ignores_unexceeded_limits() {
		let limit = CombinedRateLimit::new(LimitDirection::Read, 2, 100);
		let t0 = macros::datetime!(2025-01-01 00:00:00 UTC);

		assert_eq!(limit.reset_after_at(t0), None);

		limit.increment_at(t0);

		assert_eq!(limit.reset_after_at(t0), None, "Nothing is exceeded after one request.");

		limit.increment_at(t0);

		assert!(limit.is_exceeded_at(t0));
		assert_eq!(limit.reset_after_at(t0), Some(t0 + Duration::seconds(15)));
		assert_eq!(limit.sustain().reset_after(), Some(t0 + Duration::seconds(300)));
	}

	#[test]
	fn reset_after_picks_the_later_exceeded_limit() {
		let limit = CombinedRateLimit::new(LimitDirection::Write, 2, 2);
		let t0 = macros::datetime!(2025-01-01 00:00:00 UTC);

		limit.increment_at(t0);

		let result = limit.increment_at(t0 + Duration::seconds(1));

		assert_eq!(result, IncrementResult { counter: 2, exceeded: true });
		assert_eq!(limit.reset_after_at(t0 + Duration::seconds(1)), Some(t0 + Duration::seconds(300)));
		assert!(
			limit.is_exceeded_at(t0 + Duration::seconds(20)),
			"Sustain keeps the limit exceeded after the burst window closes."
		);
		assert_eq!(limit.burst().counter(), 0);
		assert_eq!(limit.counter(), 2);
	}

	#[test]
	fn try_increment_refuses_exhausted_limits() {
		let limit = CombinedRateLimit::new(LimitDirection::Read, 1, 10);
		let t0 = macros::datetime!(2025-01-01 00:00:00 UTC);

		assert_eq!(limit.try_increment_at(t0), Some(IncrementResult { counter: 1, exceeded: true }));
		assert_eq!(limit.try_increment_at(t0), None);
		assert_eq!(limit.counter(), 1, "A refused request is not counted.");
		assert!(limit.try_increment_at(t0 + Duration::seconds(15)).is_some());
	}
}
