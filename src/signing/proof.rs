//! JSON Web Key proof sent when registering a device token.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::ecdsa::VerifyingKey;
// self
use crate::_prelude::*;

/// Public half of the signing key as an `ES256` JSON Web Key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofKey {
	/// Key type, always `EC`.
	pub kty: String,
	/// Curve, always `P-256`.
	pub crv: String,
	/// Algorithm, always `ES256`.
	pub alg: String,
	/// Intended use, always `sig`.
	#[serde(rename = "use")]
	pub use_: String,
	/// Base64url (no padding) of the 32-byte big-endian X coordinate.
	pub x: String,
	/// Base64url (no padding) of the 32-byte big-endian Y coordinate.
	pub y: String,
}
impl ProofKey {
	/// Encodes `key` as a JWK.
	pub fn from_verifying_key(key: &VerifyingKey) -> Self {
		let point = key.to_encoded_point(false);
		let coordinate =
			|bytes: Option<&p256::FieldBytes>| bytes.map(|b| URL_SAFE_NO_PAD.encode(b)).unwrap_or_default();

		Self {
			kty: "EC".into(),
			crv: "P-256".into(),
			alg: "ES256".into(),
			use_: "sig".into(),
			x: coordinate(point.x()),
			y: coordinate(point.y()),
		}
	}
}
