//! OAuth tokens carried in the fragment of a login redirect.

// self
use crate::{
	_prelude::*,
	auth::{OAuth2Token, ScopeSet, TokenSecret},
	error::ConfigError,
	provider::AuthStage,
};

/// Access and refresh token pair returned in a redirect `Location` fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectTokens {
	/// Access token.
	pub access_token: TokenSecret,
	/// Refresh token.
	pub refresh_token: TokenSecret,
	/// Lifetime of the access token, if the fragment states one.
	pub expires_in: Option<Duration>,
	/// Token type, if the fragment states one.
	pub token_type: Option<String>,
	/// Windows Live user id, if the fragment states one.
	pub user_id: Option<String>,
}
impl RedirectTokens {
	/// Lifetime assumed when the fragment omits `expires_in`.
	pub const DEFAULT_LIFETIME: Duration = Duration::days(1);

	/// Parses `access_token`, `refresh_token`, and the optional fields from a `Location` value.
	pub fn from_location(location: &str) -> Result<Self> {
		let fragment = location.split_once('#').map(|(_, fragment)| fragment).unwrap_or_default();
		let mut access_token = None;
		let mut refresh_token = None;
		let mut expires_in = None;
		let mut token_type = None;
		let mut user_id = None;

		for (key, value) in url::form_urlencoded::parse(fragment.as_bytes()) {
			match key.as_ref() {
				"access_token" => access_token = Some(TokenSecret::new(value)),
				"refresh_token" => refresh_token = Some(TokenSecret::new(value)),
				"expires_in" => expires_in = value.parse::<i64>().ok().map(Duration::seconds),
				"token_type" => token_type = Some(value.into_owned()),
				"user_id" => user_id = Some(value.into_owned()),
				_ => {},
			}
		}

		match (access_token, refresh_token) {
			(Some(access_token), Some(refresh_token)) =>
				Ok(Self { access_token, refresh_token, expires_in, token_type, user_id }),
			_ => Err(Error::Authentication {
				stage: AuthStage::TwoFactor,
				reason: "Location header does not hold access/refresh tokens".into(),
			}),
		}
	}

	/// Converts the pair into an [`OAuth2Token`] issued at `issued_at`.
	pub fn into_oauth2_token(self, scope: ScopeSet, issued_at: OffsetDateTime) -> Result<OAuth2Token> {
		let mut builder = OAuth2Token::builder()
			.access_token(self.access_token.expose())
			.refresh_token(self.refresh_token.expose())
			.scope(scope)
			.issued_at(issued_at)
			.expires_in(self.expires_in.unwrap_or(Self::DEFAULT_LIFETIME));

		if let Some(token_type) = self.token_type {
			builder = builder.token_type(token_type);
		}
		if let Some(user_id) = self.user_id {
			builder = builder.user_id(user_id);
		}

		builder.build().map_err(|e| ConfigError::from(e).into())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::Token;

	#[test]
	fn fragment_tokens_are_extracted() {
		let tokens = RedirectTokens::from_location(
			"https://login.live.com/oauth20_desktop.srf?lc=1033#access_token=Access%2BToken&token_type=bearer&expires_in=86400&scope=service::user.auth.xboxlive.com::MBI_SSL&refresh_token=RefreshToken&user_id=1234",
		)
		.expect("Redirect fragment should parse.");

		assert_eq!(tokens.access_token.expose(), "Access+Token");
		assert_eq!(tokens.refresh_token.expose(), "RefreshToken");
		assert_eq!(tokens.expires_in, Some(Duration::DAY));
		assert_eq!(tokens.user_id.as_deref(), Some("1234"));

		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let token = tokens
			.into_oauth2_token(ScopeSet::xbox_live(), issued)
			.expect("Redirect tokens should convert.");

		assert_eq!(token.valid_until(), macros::datetime!(2025-01-02 00:00 UTC));
		assert_eq!(token.refresh_valid_until(), macros::datetime!(2025-01-15 00:00 UTC));
	}

	#[test]
	fn missing_tokens_fail_authentication() {
		for location in [
			"https://login.live.com/ppsecure/post.srf",
			"https://login.live.com/oauth20_desktop.srf#access_token=only",
			"https://login.live.com/oauth20_desktop.srf#error=access_denied",
		] {
			let err = RedirectTokens::from_location(location)
				.expect_err("Incomplete redirect should be rejected.");

			assert!(matches!(err, Error::Authentication { stage: AuthStage::TwoFactor, .. }));
		}
	}
}
