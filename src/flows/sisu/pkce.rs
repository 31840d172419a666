//! PKCE (RFC 7636) verifier and challenge used by the SISU login page.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Verifier kept for the code exchange and the challenge sent up front.
#[derive(Clone)]
pub struct PkcePair {
	pub(crate) verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Draws a fresh verifier and derives its challenge.
	pub fn generate() -> Self {
		let verifier = rand::rng()
			.sample_iter(&Alphanumeric)
			.take(PKCE_VERIFIER_LEN)
			.map(char::from)
			.collect::<String>();

		Self::from_verifier(verifier)
	}

	/// Derives the challenge for a known verifier.
	pub fn from_verifier(verifier: impl Into<String>) -> Self {
		let verifier = verifier.into();
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}

	/// Code challenge derived from the secret verifier.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method (always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn challenge_matches_rfc7636_vector() {
		let pkce = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");

		assert_eq!(pkce.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
		assert_eq!(pkce.method().as_str(), "S256");
	}

	#[test]
	fn generated_verifier_is_hidden_from_debug() {
		let pkce = PkcePair::generate();

		assert_eq!(pkce.verifier.len(), PKCE_VERIFIER_LEN);
		assert!(!format!("{pkce:?}").contains(&pkce.verifier));
	}
}
