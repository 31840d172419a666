//! Token material that never shows up in logs.

// self
use crate::_prelude::*;

/// JWT, ticket, or refresh secret; formatting prints `<redacted>`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a raw token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value for headers and request bodies. Never log it.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// True when the value is empty or whitespace, as in token files written without a
	/// refresh token.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
