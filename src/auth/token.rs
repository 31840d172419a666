//! Token models shared by every step of the chain.
//!
//! All tokens share one shape: an opaque value, the instant it was issued, and the instant
//! it stops being valid. [`Token::is_valid_at`] is the only validity rule the crate applies,
//! so refresh decisions and persisted-state merges always agree.

pub mod oauth;
pub mod secret;
pub mod xbox;

// self
use crate::{_prelude::*, auth::TokenSecret, store::PersistedToken};

/// Names used for each token in the persisted token file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
	/// Windows Live access token.
	AccessToken,
	/// Windows Live refresh token.
	RefreshToken,
	/// Xbox user token (XAU).
	UserToken,
	/// Xbox device token (XAD).
	DeviceToken,
	/// Xbox title token (XAT), produced by the SISU flow.
	TitleToken,
	/// Xbox service token (XSTS).
	#[serde(rename = "XSTSToken")]
	XstsToken,
}
impl TokenKind {
	/// Returns the persisted name of the token.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::AccessToken => "AccessToken",
			TokenKind::RefreshToken => "RefreshToken",
			TokenKind::UserToken => "UserToken",
			TokenKind::DeviceToken => "DeviceToken",
			TokenKind::TitleToken => "TitleToken",
			TokenKind::XstsToken => "XSTSToken",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Common behavior of every token in the chain.
pub trait Token {
	/// Persisted name of the token.
	fn kind(&self) -> TokenKind;

	/// Opaque token value.
	fn secret(&self) -> &TokenSecret;

	/// Instant the token was issued.
	fn issued_at(&self) -> OffsetDateTime;

	/// Instant the token stops being valid.
	fn valid_until(&self) -> OffsetDateTime;

	/// Returns true while `now` is strictly before [`valid_until`](Self::valid_until).
	fn is_valid_at(&self, now: OffsetDateTime) -> bool {
		self.valid_until() > now
	}

	/// Checks validity against the current UTC clock.
	fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}

	/// Converts the token into its persisted form.
	fn to_persisted(&self) -> PersistedToken {
		PersistedToken::new(self.kind(), self.secret().clone(), self.issued_at(), self.valid_until())
	}
}
