//! Push-approval session state, decoded from the polling endpoint's GIF reply.

// self
use crate::_prelude::*;

const GIF_MIN_LEN: usize = 35;
const GIF_SIGNATURES: [&[u8; 6]; 2] = [b"GIF87a", b"GIF89a"];

/// State of a push-approval session.
///
/// The polling endpoint answers with a tiny GIF whose pixel size carries the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// The reply was not a GIF or had unknown dimensions.
	Error,
	/// The user rejected the request (2x2).
	Rejected,
	/// No decision yet (1x1).
	Pending,
	/// The user approved the request (1x2).
	Approved,
}
impl SessionState {
	/// Decodes the session state from a polling reply body.
	pub fn from_gif(gif: &[u8]) -> Self {
		if gif.len() < GIF_MIN_LEN {
			crate::obs::log_warn!(
				"session state image is {} bytes, expected at least {GIF_MIN_LEN}",
				gif.len()
			);

			return Self::Error;
		}
		if !GIF_SIGNATURES.iter().any(|signature| gif.starts_with(*signature)) {
			crate::obs::log_warn!("session state reply is not a GIF image");

			return Self::Error;
		}

		let width = u16::from_le_bytes([gif[6], gif[7]]);
		let height = u16::from_le_bytes([gif[8], gif[9]]);

		match (width, height) {
			(1, 2) => Self::Approved,
			(1, 1) => Self::Pending,
			(2, 2) => Self::Rejected,
			_ => {
				crate::obs::log_warn!("unknown session state image size {width}x{height}");

				Self::Error
			},
		}
	}

	/// Returns a stable label suitable for logs and errors.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Error => "error",
			Self::Rejected => "rejected",
			Self::Pending => "pending",
			Self::Approved => "approved",
		}
	}
}
impl Display for SessionState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Cadence and ceiling of the push-approval poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushPolling {
	/// Pause between two polls.
	pub interval: StdDuration,
	/// Time after which an unanswered push fails.
	pub deadline: StdDuration,
}
impl PushPolling {
	/// Creates a polling configuration.
	pub const fn new(interval: StdDuration, deadline: StdDuration) -> Self {
		Self { interval, deadline }
	}
}
impl Default for PushPolling {
	fn default() -> Self {
		Self::new(StdDuration::from_secs(1), StdDuration::from_secs(120))
	}
}

/// Builds a minimal GIF of the given size, padded to the length the endpoint produces.
#[cfg(test)]
pub(crate) fn gif_of(width: u16, height: u16) -> Vec<u8> {
	let mut gif = b"GIF89a".to_vec();

	gif.extend_from_slice(&width.to_le_bytes());
	gif.extend_from_slice(&height.to_le_bytes());
	gif.resize(43, 0);

	gif
}
