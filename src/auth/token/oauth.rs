//! Windows Live OAuth2 token and its builder.

// self
use crate::{
	_prelude::*,
	auth::{
		ScopeSet,
		token::{Token, TokenKind, secret::TokenSecret},
	},
	store::PersistedToken,
};

/// Errors produced by [`OAuth2TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum OAuth2TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no lifetime was configured.
	#[error("Lifetime must be supplied via expires_in or valid_until.")]
	MissingExpiry,
	/// Issued when the lifetime is zero or negative.
	#[error("Token lifetime must be positive.")]
	NonPositiveExpiry,
}

/// OAuth2 token pair issued by `login.live.com`.
///
/// Validity is `issued_at + expires_in`. The refresh token, when present, is only used to
/// obtain the next access token and has its own fixed lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth2Token {
	/// Access token used as the RPS ticket for the user token request.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type echoed by the provider (usually `bearer`).
	pub token_type: String,
	/// Scopes granted to this token.
	pub scope: ScopeSet,
	/// Lifetime reported by the provider.
	pub expires_in: Duration,
	/// Windows Live user id, when the provider includes it.
	pub user_id: Option<String>,
	/// Instant the token was received.
	pub issued_at: OffsetDateTime,
}
impl OAuth2Token {
	/// Lifetime Windows Live grants to refresh tokens.
	pub const REFRESH_TOKEN_LIFETIME: Duration = Duration::days(14);

	/// Returns a builder for constructing tokens.
	pub fn builder() -> OAuth2TokenBuilder {
		OAuth2TokenBuilder::default()
	}

	/// Instant after which the refresh token is assumed to be unusable.
	pub fn refresh_valid_until(&self) -> OffsetDateTime {
		self.issued_at + Self::REFRESH_TOKEN_LIFETIME
	}

	/// Persisted record for the refresh token, if one is held.
	pub fn refresh_to_persisted(&self) -> Option<PersistedToken> {
		self.refresh_token.as_ref().map(|secret| {
			PersistedToken::new(
				TokenKind::RefreshToken,
				secret.clone(),
				self.issued_at,
				self.refresh_valid_until(),
			)
		})
	}
}
impl Token for OAuth2Token {
	fn kind(&self) -> TokenKind {
		TokenKind::AccessToken
	}

	fn secret(&self) -> &TokenSecret {
		&self.access_token
	}

	fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	fn valid_until(&self) -> OffsetDateTime {
		self.issued_at + self.expires_in
	}
}
impl Debug for OAuth2Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("expires_in", &self.expires_in)
			.field("user_id", &self.user_id)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

/// Builder for [`OAuth2Token`].
#[derive(Clone, Debug, Default)]
pub struct OAuth2TokenBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	scope: ScopeSet,
	expires_in: Option<Duration>,
	valid_until: Option<OffsetDateTime>,
	user_id: Option<String>,
	issued_at: Option<OffsetDateTime>,
}
impl OAuth2TokenBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type (defaults to `bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the granted scopes.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Sets the lifetime relative to the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Sets an absolute expiry; the lifetime is derived from the issued instant.
	pub fn valid_until(mut self, instant: OffsetDateTime) -> Self {
		self.valid_until = Some(instant);

		self
	}

	/// Records the Windows Live user id.
	pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Consumes the builder and produces an [`OAuth2Token`].
	pub fn build(self) -> Result<OAuth2Token, OAuth2TokenBuilderError> {
		let access_token = self.access_token.ok_or(OAuth2TokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_in = match (self.expires_in, self.valid_until) {
			(Some(duration), _) => duration,
			(None, Some(instant)) => instant - issued_at,
			(None, None) => return Err(OAuth2TokenBuilderError::MissingExpiry),
		};

		if !expires_in.is_positive() {
			return Err(OAuth2TokenBuilderError::NonPositiveExpiry);
		}

		Ok(OAuth2Token {
			access_token,
			refresh_token: self.refresh_token,
			token_type: self.token_type.unwrap_or_else(|| "bearer".into()),
			scope: self.scope,
			expires_in,
			user_id: self.user_id,
			issued_at,
		})
	}
}
