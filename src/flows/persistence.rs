//! Export and import of the held chain through the persisted token file.
//!
//! Importing never replaces a held token that is still valid. Otherwise the copy that
//! expires later wins, so a stale file cannot roll the chain back.

// self
use crate::{
	_prelude::*,
	auth::{
		DeviceToken, DisplayClaims, OAuth2Token, ScopeSet, ServiceToken, TitleToken, Token, TokenKind,
		TokenSecret, UserToken, XboxToken,
	},
	flows::AuthenticationManager,
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	store::{PersistedToken, TokenFile, TokenStore},
};

impl<C, M> AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Snapshot of the held chain in token-file form.
	pub fn export_tokens(&self) -> TokenFile {
		let chain = self.chain();
		let mut tokens = Vec::with_capacity(6);

		if let Some(oauth) = chain.oauth.as_deref() {
			tokens.push(oauth.to_persisted());
			tokens.extend(oauth.refresh_to_persisted());
		}

		tokens.extend(chain.user.as_deref().map(Token::to_persisted));
		tokens.extend(chain.device.as_deref().map(Token::to_persisted));
		tokens.extend(chain.title.as_deref().map(Token::to_persisted));
		tokens.extend(chain.service.as_deref().map(Token::to_persisted));

		TokenFile { tokens, userinfo: chain.service.as_deref().and_then(|s| s.user_info().cloned()) }
	}

	/// Merges `file` into the held chain as of `now`.
	///
	/// A file access token without a refresh entry keeps the held refresh token.
	pub fn import_tokens_at(&self, file: &TokenFile, now: OffsetDateTime) {
		let claims = file.userinfo.clone().map(DisplayClaims::for_user).unwrap_or_default();
		let user = persisted_xbox(file, TokenKind::UserToken, &claims).map(UserToken);
		let device =
			persisted_xbox(file, TokenKind::DeviceToken, &DisplayClaims::default()).map(DeviceToken);
		let title =
			persisted_xbox(file, TokenKind::TitleToken, &DisplayClaims::default()).map(TitleToken);
		let service = persisted_xbox(file, TokenKind::XstsToken, &claims).map(ServiceToken);

		self.update_chain(|chain| {
			let held_refresh = chain.oauth.as_deref().and_then(|oauth| oauth.refresh_token.as_ref());
			let oauth = persisted_oauth(file, &self.scope, held_refresh);

			chain.oauth = merge(chain.oauth.take(), oauth, now);
			chain.user = merge(chain.user.take(), user, now);
			chain.device = merge(chain.device.take(), device, now);
			chain.title = merge(chain.title.take(), title, now);
			chain.service = merge(chain.service.take(), service, now);
		});
	}

	/// Clock-driven variant of [`import_tokens_at`](Self::import_tokens_at).
	pub fn import_tokens(&self, file: &TokenFile) {
		self.import_tokens_at(file, OffsetDateTime::now_utc());
	}

	/// Writes the held chain to `store`.
	pub async fn save_tokens<S>(&self, store: &S) -> Result<()>
	where
		S: ?Sized + TokenStore,
	{
		store.save(&self.export_tokens()).await?;

		Ok(())
	}

	/// Merges the stored chain, if any, returning whether a file was found.
	pub async fn load_tokens<S>(&self, store: &S) -> Result<bool>
	where
		S: ?Sized + TokenStore,
	{
		let Some(file) = store.load().await? else {
			return Ok(false);
		};

		self.import_tokens(&file);

		Ok(true)
	}
}

fn merge<T>(held: Option<Arc<T>>, persisted: Option<T>, now: OffsetDateTime) -> Option<Arc<T>>
where
	T: Token,
{
	match (held, persisted) {
		(Some(held), persisted) if held.is_valid_at(now) => {
			if let Some(persisted) = persisted {
				crate::obs::log_debug!(
					"keeping held {} over persisted copy valid until {}",
					held.kind(),
					persisted.valid_until()
				);
			}

			Some(held)
		},
		(Some(held), Some(persisted)) if held.valid_until() >= persisted.valid_until() => {
			crate::obs::log_debug!("ignoring older persisted {}", persisted.kind());

			Some(held)
		},
		(_, Some(persisted)) => Some(Arc::new(persisted)),
		(held, None) => held,
	}
}

fn persisted_oauth(
	file: &TokenFile,
	scope: &ScopeSet,
	held_refresh: Option<&TokenSecret>,
) -> Option<OAuth2Token> {
	let access = file.get(TokenKind::AccessToken)?;
	let mut builder = OAuth2Token::builder()
		.access_token(access.jwt.expose())
		.scope(scope.clone())
		.issued_at(access.date_issued)
		.valid_until(access.date_valid);

	if let Some(refresh) =
		file.get(TokenKind::RefreshToken).map(|refresh| &refresh.jwt).or(held_refresh)
	{
		builder = builder.refresh_token(refresh.expose());
	}

	builder
		.build()
		.inspect_err(|e| crate::obs::log_warn!("ignoring persisted access token: {e}"))
		.ok()
}

fn persisted_xbox(file: &TokenFile, kind: TokenKind, claims: &DisplayClaims) -> Option<XboxToken> {
	file.get(kind).map(|PersistedToken { jwt, date_issued, date_valid, .. }| {
		XboxToken::new(jwt.expose(), *date_issued, *date_valid, claims.clone())
	})
}
