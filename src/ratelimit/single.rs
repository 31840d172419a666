// self
use crate::{
	_prelude::*,
	ratelimit::{IncrementResult, LimitDirection, TimePeriod},
};

#[derive(Debug, Default)]
struct WindowState {
	counter: u32,
	exceeded: bool,
	reset_after: Option<OffsetDateTime>,
}
impl WindowState {
	fn reset_if_elapsed(&mut self, now: OffsetDateTime) {
		if self.reset_after.is_some_and(|reset_after| reset_after < now) {
			*self = Self::default();
		}
	}
}

/// One fixed-window counter (burst or sustain) for one traffic direction.
///
/// The window opens on the first increment after a reset and closes `window` later; the
/// reset instant is never moved by later increments in the same window. All mutation goes
/// through an internal mutex, so a limit can be shared freely between tasks.
#[derive(Debug)]
pub struct SingleRateLimit {
	period: TimePeriod,
	direction: LimitDirection,
	limit: u32,
	window: Duration,
	state: Mutex<WindowState>,
}
impl SingleRateLimit {
	/// Creates a limit using the period's default window.
	pub fn new(period: TimePeriod, direction: LimitDirection, limit: u32) -> Self {
		Self::with_window(period, direction, limit, period.default_window())
	}

	/// Creates a limit with an explicit window length.
	pub fn with_window(
		period: TimePeriod,
		direction: LimitDirection,
		limit: u32,
		window: Duration,
	) -> Self {
		Self { period, direction, limit, window, state: Mutex::new(WindowState::default()) }
	}

	/// Burst or sustain.
	pub fn period(&self) -> TimePeriod {
		self.period
	}

	/// Read or write.
	pub fn direction(&self) -> LimitDirection {
		self.direction
	}

	/// Requests allowed per window.
	pub fn limit(&self) -> u32 {
		self.limit
	}

	/// Window length.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Requests counted in the current window.
	pub fn counter(&self) -> u32 {
		self.state.lock().counter
	}

	/// End of the current window, if one is open.
	pub fn reset_after(&self) -> Option<OffsetDateTime> {
		self.state.lock().reset_after
	}

	/// Returns whether the limit is exhausted at `now`, closing an elapsed window first.
	pub fn is_exceeded_at(&self, now: OffsetDateTime) -> bool {
		let mut state = self.state.lock();

		state.reset_if_elapsed(now);

		state.exceeded
	}

	/// Clock-driven variant of [`is_exceeded_at`](Self::is_exceeded_at).
	pub fn is_exceeded(&self) -> bool {
		self.is_exceeded_at(OffsetDateTime::now_utc())
	}

	/// Counts one request at `now`.
	pub fn increment_at(&self, now: OffsetDateTime) -> IncrementResult {
		let mut state = self.state.lock();

		state.reset_if_elapsed(now);
		state.counter = state.counter.saturating_add(1);

		if state.counter == 1 {
			state.reset_after = Some(now + self.window);
		}
		if state.counter >= self.limit {
			state.exceeded = true;
		}

		IncrementResult { counter: state.counter, exceeded: state.exceeded }
	}

	/// Clock-driven variant of [`increment_at`](Self::increment_at).
	pub fn increment(&self) -> IncrementResult {
		self.increment_at(OffsetDateTime::now_utc())
	}

	/// Reset instant of the current window if the limit is exhausted at `now`.
	pub(crate) fn exceeded_reset_after_at(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
		let mut state = self.state.lock();

		state.reset_if_elapsed(now);

		if state.exceeded { state.reset_after } else { None }
	}
}
