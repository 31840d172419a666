//! Xbox Live tokens (XAU, XAD, XSTS) returned by the `*.auth.xboxlive.com` endpoints.

// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	auth::{
		DisplayClaims, XboxUserInfo,
		token::{Token, TokenKind, secret::TokenSecret},
	},
};

/// Wire shape shared by every Xbox Live token response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XboxToken {
	/// Issue instant reported by the service.
	#[serde(with = "time::serde::rfc3339")]
	pub issue_instant: OffsetDateTime,
	/// Expiry instant reported by the service.
	#[serde(with = "time::serde::rfc3339")]
	pub not_after: OffsetDateTime,
	/// Opaque token value.
	pub token: TokenSecret,
	/// Claims attached to the token.
	#[serde(default)]
	pub display_claims: DisplayClaims,
}
impl XboxToken {
	/// Builds a token from its parts.
	pub fn new(
		token: impl Into<String>,
		issue_instant: OffsetDateTime,
		not_after: OffsetDateTime,
		display_claims: DisplayClaims,
	) -> Self {
		Self { issue_instant, not_after, token: TokenSecret::new(token), display_claims }
	}
}

macro_rules! def_xbox_token {
	($name:ident, $kind:expr, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(pub XboxToken);
		impl Deref for $name {
			type Target = XboxToken;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl From<XboxToken> for $name {
			fn from(value: XboxToken) -> Self {
				Self(value)
			}
		}
		impl Token for $name {
			fn kind(&self) -> TokenKind {
				$kind
			}

			fn secret(&self) -> &TokenSecret {
				&self.0.token
			}

			fn issued_at(&self) -> OffsetDateTime {
				self.0.issue_instant
			}

			fn valid_until(&self) -> OffsetDateTime {
				self.0.not_after
			}
		}
	};
}

def_xbox_token! { UserToken, TokenKind::UserToken, "Xbox user token (XAU) derived from the OAuth2 access token." }
def_xbox_token! { DeviceToken, TokenKind::DeviceToken, "Xbox device token (XAD) proving possession of the signing key." }
def_xbox_token! { TitleToken, TokenKind::TitleToken, "Xbox title token (XAT) issued by the SISU authorize endpoint." }
def_xbox_token! { ServiceToken, TokenKind::XstsToken, "Xbox service token (XSTS) used to authorize every API call." }

impl UserToken {
	/// User hash claim, if the service returned one.
	pub fn userhash(&self) -> Option<&str> {
		self.display_claims.primary().and_then(|info| info.uhs.as_deref())
	}
}
impl TitleToken {
	/// Title id claim (`xti.tid`).
	pub fn title_id(&self) -> Option<&str> {
		self.display_claims.xti.as_ref().and_then(|claims| claims.tid.as_deref())
	}
}
impl ServiceToken {
	/// Primary identity claims.
	pub fn user_info(&self) -> Option<&XboxUserInfo> {
		self.display_claims.primary()
	}

	/// Numeric Xbox user id (`xid`).
	pub fn xuid(&self) -> Option<&str> {
		self.user_info().and_then(|info| info.xid.as_deref())
	}

	/// User hash (`uhs`).
	pub fn userhash(&self) -> Option<&str> {
		self.user_info().and_then(|info| info.uhs.as_deref())
	}

	/// Gamertag (`gtg`).
	pub fn gamertag(&self) -> Option<&str> {
		self.user_info().and_then(|info| info.gtg.as_deref())
	}

	/// Age group (`agg`).
	pub fn age_group(&self) -> Option<&str> {
		self.user_info().and_then(|info| info.agg.as_deref())
	}

	/// Title privileges (`prv`), split on whitespace.
	pub fn privileges(&self) -> Vec<&str> {
		self.user_info()
			.and_then(|info| info.prv.as_deref())
			.map(|raw| raw.split_whitespace().collect())
			.unwrap_or_default()
	}

	/// User privileges (`usr`), split on whitespace.
	pub fn user_privileges(&self) -> Vec<&str> {
		self.user_info()
			.and_then(|info| info.usr.as_deref())
			.map(|raw| raw.split_whitespace().collect())
			.unwrap_or_default()
	}

	/// `XBL3.0 x=<userhash>;<token>` header value, or `None` without a user hash.
	pub fn authorization_header_value(&self) -> Option<String> {
		self.userhash().map(|uhs| format!("XBL3.0 x={uhs};{}", self.token.expose()))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	const XSTS_RESPONSE: &str = r#"{
		"IssueInstant": "2020-04-16T00:39:25.7142437Z",
		"NotAfter": "2020-04-16T16:39:25.7142437Z",
		"Token": "eyJlbmMiOiJBMTI4Q0JDK0hTMjU2IiwiYWxnIjoiUlNBLU9BRVAiLCJjdHkiOiJKV1QiLCJ6aXAiOiJERUYiLCJ4NXQiOiIxZlVBejExYmtpWklFaE5KSVZnSDFTdTVzX2cifQ",
		"DisplayClaims": {
			"xui": [{
				"gtg": "e",
				"xid": "2669321029139235",
				"uhs": "abcdefg",
				"agg": "Adult",
				"usr": "234 234",
				"prv": "185 186 187 188 191 192 199 200 201 203 204 205 206 207 208 209 210 211 214"
			}]
		}
	}"#;

	#[test]
	fn service_token_parses_seven_digit_fractions() {
		let token: ServiceToken =
			serde_json::from_str(XSTS_RESPONSE).expect("XSTS response should deserialize.");

		assert_eq!(token.issued_at(), macros::datetime!(2020-04-16 00:39:25.7142437 UTC));
		assert_eq!(token.valid_until(), macros::datetime!(2020-04-16 16:39:25.7142437 UTC));
		assert_eq!(token.kind(), TokenKind::XstsToken);
		assert_eq!(token.xuid(), Some("2669321029139235"));
		assert_eq!(token.gamertag(), Some("e"));
		assert_eq!(token.age_group(), Some("Adult"));
		assert_eq!(token.user_privileges(), vec!["234", "234"]);
		assert_eq!(token.privileges().len(), 19);
	}

	#[test]
	fn authorization_header_combines_userhash_and_token() {
		let token = ServiceToken(XboxToken::new(
			"jsonwebtoken",
			macros::datetime!(2025-01-01 00:00 UTC),
			macros::datetime!(2025-01-01 16:00 UTC),
			DisplayClaims::for_user(XboxUserInfo {
				uhs: Some("userid".into()),
				..Default::default()
			}),
		));

		assert_eq!(
			token.authorization_header_value().as_deref(),
			Some("XBL3.0 x=userid;jsonwebtoken")
		);

		let anonymous = ServiceToken(XboxToken::new(
			"jsonwebtoken",
			macros::datetime!(2025-01-01 00:00 UTC),
			macros::datetime!(2025-01-01 16:00 UTC),
			DisplayClaims::default(),
		));

		assert!(anonymous.authorization_header_value().is_none());
	}

	#[test]
	fn validity_follows_not_after() {
		let token = UserToken(XboxToken::new(
			"user",
			macros::datetime!(2025-01-01 00:00 UTC),
			macros::datetime!(2025-01-15 00:00 UTC),
			DisplayClaims::for_user(XboxUserInfo { uhs: Some("123".into()), ..Default::default() }),
		));

		assert!(token.is_valid_at(macros::datetime!(2025-01-14 23:59 UTC)));
		assert!(!token.is_valid_at(macros::datetime!(2025-01-15 00:00 UTC)));
		assert_eq!(token.userhash(), Some("123"));
	}
}
