//! Persisted token file schema and the stores that read and write it.
//!
//! A token file is `{"tokens": [{"name", "jwt", "date_issued", "date_valid"}], "userinfo"}`.
//! Timestamps are written with microsecond precision and a `Z` suffix, and read back as
//! RFC 3339.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Token, TokenKind, TokenSecret, XboxUserInfo},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for token files.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists `file`, replacing any previous contents.
	fn save<'a>(&'a self, file: &'a TokenFile) -> StoreFuture<'a, ()>;

	/// Loads the stored file, or `None` when nothing has been saved yet.
	fn load(&self) -> StoreFuture<'_, Option<TokenFile>>;
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The token file could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure (file system, lock).
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// One token entry of the token file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedToken {
	/// Token kind.
	pub name: TokenKind,
	/// Opaque token value.
	pub jwt: TokenSecret,
	/// Issue instant.
	#[serde(with = "timestamp")]
	pub date_issued: OffsetDateTime,
	/// Expiry instant.
	#[serde(with = "timestamp")]
	pub date_valid: OffsetDateTime,
}
impl PersistedToken {
	/// Builds an entry from its parts.
	pub fn new(
		name: TokenKind,
		jwt: TokenSecret,
		date_issued: OffsetDateTime,
		date_valid: OffsetDateTime,
	) -> Self {
		Self { name, jwt, date_issued, date_valid }
	}
}
impl Token for PersistedToken {
	fn kind(&self) -> TokenKind {
		self.name
	}

	fn secret(&self) -> &TokenSecret {
		&self.jwt
	}

	fn issued_at(&self) -> OffsetDateTime {
		self.date_issued
	}

	fn valid_until(&self) -> OffsetDateTime {
		self.date_valid
	}
}

/// Whole persisted state of one authenticated identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFile {
	/// Persisted tokens; at most one per kind is meaningful.
	#[serde(default)]
	pub tokens: Vec<PersistedToken>,
	/// Identity claims copied from the service token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub userinfo: Option<XboxUserInfo>,
}
impl TokenFile {
	/// Entry for `kind`; when several exist the latest expiring one wins.
	pub fn get(&self, kind: TokenKind) -> Option<&PersistedToken> {
		self.tokens.iter().filter(|token| token.name == kind).max_by_key(|token| token.date_valid)
	}

	/// Parses a token file from JSON text.
	pub fn from_json(json: &str) -> Result<Self, StoreError> {
		let de = &mut serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(de)
			.map_err(|e| StoreError::Serialization { message: format!("Invalid token file: {e}") })
	}

	/// Renders the token file as pretty-printed JSON.
	pub fn to_json(&self) -> Result<String, StoreError> {
		serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize token file: {e}"),
		})
	}
}

/// Serde adapter for token file timestamps.
pub mod timestamp {
	// crates.io
	use serde::{Deserializer, Serializer, de::Error as _, ser::Error as _};
	use time::{UtcOffset, format_description::well_known::Rfc3339, macros::format_description};
	// self
	use crate::_prelude::*;

	/// Formats `value` in UTC with microsecond precision.
	pub fn format(value: OffsetDateTime) -> Result<String, time::error::Format> {
		value.to_offset(UtcOffset::UTC).format(format_description!(
			"[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
		))
	}

	/// Parses an RFC 3339 timestamp.
	pub fn parse(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
		OffsetDateTime::parse(value, &Rfc3339)
	}

	/// Serializes an instant.
	pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		let text = format(*value).map_err(S::Error::custom)?;

		serializer.serialize_str(&text)
	}

	/// Deserializes an instant.
	pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = String::deserialize(deserializer)?;

		parse(&text).map_err(D::Error::custom)
	}
}
