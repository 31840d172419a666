//! Scopes sent to the Windows Live authorize and token endpoints.

// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
}

/// Ordered, duplicate-free scope list.
///
/// Windows Live echoes scopes back with its own casing (`XboxLive.signin`), so duplicates
/// and lookups compare case-insensitively. Request order is kept. The set serializes as one
/// space-delimited string.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Scopes requested by Xbox Live sign-in clients.
	pub const XBOX_LIVE: [&'static str; 2] = ["Xboxlive.signin", "Xboxlive.offline_access"];

	/// Validates and deduplicates `scopes`.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut kept = Vec::<String>::new();

		for scope in scopes {
			let scope = scope.into();

			if scope.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if scope.chars().any(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope });
			}
			if !kept.iter().any(|held| held.eq_ignore_ascii_case(&scope)) {
				kept.push(scope);
			}
		}

		Ok(Self(kept.into()))
	}

	/// `Xboxlive.signin Xboxlive.offline_access`.
	pub fn xbox_live() -> Self {
		Self(Self::XBOX_LIVE.iter().map(|scope| (*scope).to_owned()).collect())
	}

	/// Case-insensitive membership test.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|held| held.eq_ignore_ascii_case(scope))
	}

	/// True when a refresh token can be expected for this scope set.
	pub fn grants_offline_access(&self) -> bool {
		self.iter().any(|scope| scope.to_ascii_lowercase().ends_with("offline_access"))
	}

	/// Scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Space-delimited form used on the wire.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		ScopeSet::from_str(&raw).map_err(DeError::custom)
	}
}
