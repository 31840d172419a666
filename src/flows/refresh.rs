//! Lazy refresh of the token chain.
//!
//! [`AuthenticationManager::refresh_tokens`] is meant to run before every protected call.
//! It checks the OAuth, user, and service tokens in that order and re-requests only the ones
//! that are missing or expired, so a healthy chain costs no round-trips. Concurrent callers
//! are serialized by a single async guard; whoever waits re-reads the chain afterwards and
//! finds the work already done.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::Token,
	error::ConfigError,
	flows::AuthenticationManager,
	http::AuthHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Renews whichever chain tokens are missing or expired at the current instant.
	pub async fn refresh_tokens(&self) -> Result<()> {
		self.refresh_tokens_at(OffsetDateTime::now_utc()).await
	}

	/// Renews whichever chain tokens are missing or expired at `now`.
	///
	/// Fails fast with [`Error::InvalidCredentials`] once XSTS has rejected the account.
	pub async fn refresh_tokens_at(&self, now: OffsetDateTime) -> Result<()> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_tokens");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_guard.lock().await;

				self.refresh_chain(now).await
			})
			.await;

		match &result {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn refresh_chain(&self, now: OffsetDateTime) -> Result<()> {
		let chain = self.chain();

		if chain.invalidated {
			return Err(Error::InvalidCredentials);
		}

		let oauth = match chain.oauth {
			Some(oauth) if oauth.is_valid_at(now) => oauth,
			held => {
				let refresh_token = held
					.as_deref()
					.and_then(|oauth| oauth.refresh_token.as_ref())
					.filter(|secret| !secret.is_blank())
					.ok_or(ConfigError::MissingRefreshToken)?;
				let renewed = self
					.facade()?
					.refresh_token(
						self.exchange().strategy.as_ref(),
						refresh_token.expose(),
						&self.scope,
						&self.redirect_uri,
					)
					.await?;
				let renewed = Arc::new(renewed);

				self.refresh_metrics.record_refreshed_token();
				self.update_chain(|chain| chain.oauth = Some(renewed.clone()));

				renewed
			},
		};
		let user = match chain.user {
			Some(user) if user.is_valid_at(now) => user,
			_ => {
				let renewed = Arc::new(self.request_user_token(&oauth).await?);

				self.refresh_metrics.record_refreshed_token();
				self.update_chain(|chain| chain.user = Some(renewed.clone()));

				renewed
			},
		};

		if chain.service.as_deref().is_some_and(|service| service.is_valid_at(now)) {
			return Ok(());
		}

		let renewed = Arc::new(self.request_service_token(&user).await?);

		self.refresh_metrics.record_refreshed_token();
		self.update_chain(|chain| chain.service = Some(renewed));

		Ok(())
	}
}
