//! `MS-CV` correlation vector sent with every XAL request.

// std
use std::sync::atomic::{AtomicU32, Ordering};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use rand::RngCore;
// self
use crate::_prelude::*;

/// Header carrying the correlation vector.
pub const CORRELATION_HEADER: &str = "MS-CV";

const BASE_BYTES: usize = 16;

/// Correlation vector of the form `<base>.<counter>`.
///
/// The base is 22 characters of base64 drawn once per vector. The counter starts at zero and
/// moves forward with [`increment`](Self::increment).
#[derive(Debug)]
pub struct CorrelationVector {
	base: String,
	counter: AtomicU32,
}
impl CorrelationVector {
	/// Draws a fresh random base.
	pub fn new() -> Self {
		let mut bytes = [0_u8; BASE_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self::with_base(STANDARD_NO_PAD.encode(bytes))
	}

	/// Starts a vector on a known base.
	pub fn with_base(base: impl Into<String>) -> Self {
		Self { base: base.into(), counter: AtomicU32::new(0) }
	}

	/// Base shared by every value of this vector.
	pub fn base(&self) -> &str {
		&self.base
	}

	/// Current value without advancing the counter.
	pub fn value(&self) -> String {
		format!("{}.{}", self.base, self.counter.load(Ordering::Acquire))
	}

	/// Advances the counter and returns the new value.
	pub fn increment(&self) -> String {
		let next = self.counter.fetch_add(1, Ordering::AcqRel).wrapping_add(1);

		format!("{}.{next}", self.base)
	}
}
impl Default for CorrelationVector {
	fn default() -> Self {
		Self::new()
	}
}
impl Display for CorrelationVector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.value())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn random_base_is_twenty_two_characters() {
		let cv = CorrelationVector::new();

		assert_eq!(cv.base().len(), 22);
		assert_eq!(cv.value(), format!("{}.0", cv.base()));
		assert_ne!(cv.base(), CorrelationVector::new().base());
	}

	#[test]
	fn increment_advances_the_counter() {
		let cv = CorrelationVector::with_base("tul+fx5+Ka0m6OlLZSnSag");

		assert_eq!(cv.increment(), "tul+fx5+Ka0m6OlLZSnSag.1");
		assert_eq!(cv.increment(), "tul+fx5+Ka0m6OlLZSnSag.2");
		assert_eq!(cv.to_string(), "tul+fx5+Ka0m6OlLZSnSag.2");
	}
}
