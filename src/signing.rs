//! Proof-of-possession request signing.
//!
//! The signature covers a canonical byte string built from the request:
//!
//! ```text
//! version ‖ 0 ‖ filetime ‖ 0 ‖ METHOD ‖ 0 ‖ path?query ‖ 0 ‖ authorization ‖ 0 ‖ body[..max] ‖ 0
//! ```
//!
//! The SHA-256 digest of that string is signed with deterministic ECDSA (RFC 6979) over P-256,
//! and the header value is base64 of `version ‖ filetime ‖ r ‖ s`.

pub mod filetime;
pub mod proof;

pub use filetime::{from_filetime, to_filetime};
pub use proof::ProofKey;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use p256::{
	ecdsa::{
		Signature, SigningKey, VerifyingKey,
		signature::hazmat::{PrehashSigner, PrehashVerifier},
	},
	pkcs8::{DecodePrivateKey, EncodePrivateKey, LineEnding},
};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const VERSION_LEN: usize = 4;
const FILETIME_LEN: usize = 8;
const SIGNATURE_LEN: usize = 64;
const BLOB_LEN: usize = VERSION_LEN + FILETIME_LEN + SIGNATURE_LEN;

/// Errors raised while loading keys, signing, or checking signatures.
#[derive(Debug, ThisError)]
pub enum SignatureError {
	/// The private key could not be decoded.
	#[error("Signing key could not be decoded.")]
	KeyDecode(#[source] p256::pkcs8::Error),
	/// The private key could not be encoded.
	#[error("Signing key could not be encoded.")]
	KeyEncode(#[source] p256::pkcs8::Error),
	/// Signature bytes do not have the expected layout.
	#[error("Signature data is malformed: {reason}.")]
	Malformed {
		/// What was wrong with the input.
		reason: String,
	},
	/// The ECDSA primitive failed.
	#[error("ECDSA operation failed.")]
	Ecdsa(#[source] p256::ecdsa::Error),
}

/// Signing parameters negotiated with the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPolicy {
	/// Signature version placed at the front of the canonical string and the blob.
	pub version: u32,
	/// Number of body bytes covered by the signature.
	pub max_body_bytes: usize,
}
impl Default for SigningPolicy {
	fn default() -> Self {
		Self { version: 1, max_body_bytes: 8192 }
	}
}

/// Decoded `Signature` header value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureBlob {
	/// Signature version.
	pub version: u32,
	/// FILETIME ticks the request was signed at.
	pub filetime: u64,
	/// Raw `r ‖ s` signature.
	pub signature: [u8; SIGNATURE_LEN],
}
impl SignatureBlob {
	/// Decodes a base64 header value.
	pub fn decode(header: &str) -> Result<Self, SignatureError> {
		let raw = STANDARD
			.decode(header)
			.map_err(|e| SignatureError::Malformed { reason: format!("invalid base64: {e}") })?;

		Self::from_bytes(&raw)
	}

	/// Splits raw blob bytes into their parts.
	pub fn from_bytes(raw: &[u8]) -> Result<Self, SignatureError> {
		if raw.len() != BLOB_LEN {
			return Err(SignatureError::Malformed {
				reason: format!("expected {BLOB_LEN} bytes, got {}", raw.len()),
			});
		}

		let (version, rest) = raw.split_at(VERSION_LEN);
		let (filetime, signature) = rest.split_at(FILETIME_LEN);
		let mut version_buf = [0; VERSION_LEN];
		let mut filetime_buf = [0; FILETIME_LEN];
		let mut signature_buf = [0; SIGNATURE_LEN];

		version_buf.copy_from_slice(version);
		filetime_buf.copy_from_slice(filetime);
		signature_buf.copy_from_slice(signature);

		Ok(Self {
			version: u32::from_be_bytes(version_buf),
			filetime: u64::from_be_bytes(filetime_buf),
			signature: signature_buf,
		})
	}

	/// Serializes the blob as `version ‖ filetime ‖ signature`.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut buf = Vec::with_capacity(BLOB_LEN);

		buf.extend_from_slice(&self.version.to_be_bytes());
		buf.extend_from_slice(&self.filetime.to_be_bytes());
		buf.extend_from_slice(&self.signature);

		buf
	}

	/// Base64 header value.
	pub fn encode(&self) -> String {
		STANDARD.encode(self.to_bytes())
	}
}

/// P-256 request signer holding the device's private key.
#[derive(Clone)]
pub struct RequestSigner {
	key: SigningKey,
	policy: SigningPolicy,
}
impl RequestSigner {
	/// Creates a signer around a freshly generated key.
	pub fn generate() -> Self {
		loop {
			let candidate: [u8; 32] = rand::random();

			// Zero and out-of-range scalars are rejected; retrying is practically never needed.
			if let Ok(key) = SigningKey::from_slice(&candidate) {
				return Self::from_signing_key(key);
			}
		}
	}

	/// Wraps an existing key.
	pub fn from_signing_key(key: SigningKey) -> Self {
		Self { key, policy: SigningPolicy::default() }
	}

	/// Imports a PKCS#8 PEM private key.
	pub fn from_pem(pem: &str) -> Result<Self, SignatureError> {
		SigningKey::from_pkcs8_pem(pem).map(Self::from_signing_key).map_err(SignatureError::KeyDecode)
	}

	/// Exports the private key as PKCS#8 PEM.
	pub fn to_pem(&self) -> Result<String, SignatureError> {
		self.key
			.to_pkcs8_pem(LineEnding::LF)
			.map(|pem| pem.to_string())
			.map_err(SignatureError::KeyEncode)
	}

	/// Overrides the signing policy.
	pub fn with_policy(mut self, policy: SigningPolicy) -> Self {
		self.policy = policy;

		self
	}

	/// Active signing policy.
	pub fn policy(&self) -> &SigningPolicy {
		&self.policy
	}

	/// Public key matching the signing key.
	pub fn verifying_key(&self) -> &VerifyingKey {
		self.key.verifying_key()
	}

	/// Public key as the JWK sent in `ProofKey`.
	pub fn proof_field(&self) -> ProofKey {
		ProofKey::from_verifying_key(self.verifying_key())
	}

	/// Signs a request and returns the base64 `Signature` header value.
	///
	/// `timestamp` defaults to the current UTC clock.
	pub fn sign(
		&self,
		method: &str,
		path_and_query: &str,
		body: &[u8],
		authorization: &str,
		timestamp: Option<OffsetDateTime>,
	) -> Result<String, SignatureError> {
		self.sign_raw(method, path_and_query, body, authorization, timestamp)
			.map(|blob| blob.encode())
	}

	/// Signs a request and returns the undecoded blob.
	pub fn sign_raw(
		&self,
		method: &str,
		path_and_query: &str,
		body: &[u8],
		authorization: &str,
		timestamp: Option<OffsetDateTime>,
	) -> Result<SignatureBlob, SignatureError> {
		let filetime = to_filetime(timestamp.unwrap_or_else(OffsetDateTime::now_utc));
		let digest = self.hash(method, path_and_query, body, authorization, filetime);
		let signature: Signature = self.key.sign_prehash(&digest).map_err(SignatureError::Ecdsa)?;
		let mut raw = [0; SIGNATURE_LEN];

		raw.copy_from_slice(&signature.to_bytes());

		Ok(SignatureBlob { version: self.policy.version, filetime, signature: raw })
	}

	/// SHA-256 of the canonical byte string.
	pub fn hash(
		&self,
		method: &str,
		path_and_query: &str,
		body: &[u8],
		authorization: &str,
		filetime: u64,
	) -> [u8; 32] {
		let body = &body[..body.len().min(self.policy.max_body_bytes)];
		let mut hasher = Sha256::new();

		hasher.update(self.policy.version.to_be_bytes());
		hasher.update([0]);
		hasher.update(filetime.to_be_bytes());
		hasher.update([0]);
		hasher.update(method.to_ascii_uppercase().as_bytes());
		hasher.update([0]);
		hasher.update(path_and_query.as_bytes());
		hasher.update([0]);
		hasher.update(authorization.as_bytes());
		hasher.update([0]);
		hasher.update(body);
		hasher.update([0]);

		hasher.finalize().into()
	}

	/// Checks a raw `r ‖ s` signature against `digest`.
	///
	/// Uses `public_key` when given, otherwise this signer's own key. A signature that does not
	/// verify yields `Ok(false)`; bytes that are not a signature at all yield an error.
	pub fn verify_digest(
		&self,
		signature: &[u8],
		digest: &[u8],
		public_key: Option<&VerifyingKey>,
	) -> Result<bool, SignatureError> {
		let signature = Signature::from_slice(signature).map_err(|e| SignatureError::Malformed {
			reason: format!("not a P-256 signature: {e}"),
		})?;
		let key = public_key.unwrap_or_else(|| self.verifying_key());

		Ok(key.verify_prehash(digest, &signature).is_ok())
	}

	/// Recomputes the digest for a request and checks a `Signature` header value against it.
	pub fn verify_header(
		&self,
		header: &str,
		method: &str,
		path_and_query: &str,
		body: &[u8],
		authorization: &str,
	) -> Result<bool, SignatureError> {
		let blob = SignatureBlob::decode(header)?;

		if blob.version != self.policy.version {
			return Err(SignatureError::Malformed {
				reason: format!("unsupported signature version {}", blob.version),
			});
		}

		let digest = self.hash(method, path_and_query, body, authorization, blob.filetime);

		self.verify_digest(&blob.signature, &digest, None)
	}
}
impl Debug for RequestSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestSigner")
			.field("proof", &self.proof_field())
			.field("policy", &self.policy)
			.finish()
	}
}
