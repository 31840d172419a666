//! Optional observability helpers for token flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `xbl_auth.flow` with the `flow` and `stage`
//!   (call site) fields, plus the warn/debug events raised through the crate-internal `log_warn!` and `log_debug!` macros.
//! - Enable `metrics` to increment the `xbl_auth_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a warn-level event when `tracing` is enabled; evaluates nothing otherwise.
macro_rules! log_warn {
	($($arg:tt)*) => {{
		#[cfg(feature = "tracing")]
		::tracing::warn!($($arg)*);
		#[cfg(not(feature = "tracing"))]
		{
			let _ = format_args!($($arg)*);
		}
	}};
}
pub(crate) use log_warn;

/// Emits a debug-level event when `tracing` is enabled; evaluates nothing otherwise.
macro_rules! log_debug {
	($($arg:tt)*) => {{
		#[cfg(feature = "tracing")]
		::tracing::debug!($($arg)*);
		#[cfg(not(feature = "tracing"))]
		{
			let _ = format_args!($($arg)*);
		}
	}};
}
pub(crate) use log_debug;

/// Flow kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Code exchange followed by the user and service token requests.
	AuthorizationCode,
	/// Lazy refresh of the token chain.
	Refresh,
	/// Proof-of-possession device token request.
	DeviceToken,
	/// Two-factor sub-flow.
	TwoFactor,
	/// Authorized call through a session.
	Session,
	/// XAL sign-in through the SISU endpoints.
	Sisu,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::DeviceToken => "device_token",
			FlowKind::TwoFactor => "two_factor",
			FlowKind::Session => "session",
			FlowKind::Sisu => "sisu",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
