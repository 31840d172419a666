//! Windows Live second-factor sub-flow.
//!
//! A login page that demands a second factor surfaces as [`Error::TwoFactorRequired`]
//! carrying a [`TwoFactorChallenge`]. The caller picks one of its strategies, collects the
//! proof named by [`AuthStrategy::verification_prompt`], calls
//! [`TwoFactorAuthentication::check_otc`] to have a code sent (or a push raised), and finally
//! [`TwoFactorAuthentication::authenticate`] to obtain the token pair. The pair is handed to
//! `AuthenticationManager::complete_login` to derive the Xbox tokens.

pub mod challenge;
pub mod poll;
pub mod redirect;

pub use challenge::*;
pub use poll::*;
pub use redirect::*;

// crates.io
use oauth2::http::{StatusCode, header::LOCATION};
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	flows::common::{self, HttpExchange},
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::{AuthStage, ProviderStrategy, XboxLiveDescriptor},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper, provider::XboxLiveStrategy};

const PURPOSE: &str = "eOTT_OneTimePassword";
const I18N_STRINGS: &str = "__DefaultSAStrings|1,__DefaultSA_Core|1,__DefaultSA_Wizard|1";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OneTimeCodeReply {
	#[serde(default)]
	state: Option<serde_json::Value>,
	#[serde(default)]
	session_lookup_key: Option<String>,
}

#[cfg(feature = "reqwest")]
/// Two-factor sub-flow on the crate's default reqwest transport stack.
pub type ReqwestTwoFactorAuthentication =
	TwoFactorAuthentication<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Drives one second-factor challenge to completion.
pub struct TwoFactorAuthentication<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	exchange: HttpExchange<C, M>,
	challenge: TwoFactorChallenge,
	login: String,
	one_time_code_url: Url,
	polling_url: Url,
	polling: PushPolling,
	cancellation: CancellationToken,
	session_lookup_key: Mutex<Option<String>>,
}
impl<C, M> TwoFactorAuthentication<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates the sub-flow for `login` (the account's sign-in name) on a caller transport.
	pub fn with_http_client(
		descriptor: &XboxLiveDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		challenge: TwoFactorChallenge,
		login: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self::from_exchange(
			HttpExchange::new(http_client.into(), mapper.into(), strategy),
			descriptor,
			challenge,
			login,
		)
	}

	pub(crate) fn from_exchange(
		exchange: HttpExchange<C, M>,
		descriptor: &XboxLiveDescriptor,
		challenge: TwoFactorChallenge,
		login: impl Into<String>,
	) -> Self {
		let polling_url =
			challenge.polling_url.clone().unwrap_or_else(|| descriptor.endpoints.session_state.clone());

		Self {
			exchange,
			challenge,
			login: login.into(),
			one_time_code_url: descriptor.endpoints.one_time_code.clone(),
			polling_url,
			polling: PushPolling::default(),
			cancellation: CancellationToken::new(),
			session_lookup_key: Mutex::new(None),
		}
	}

	/// Overrides the push polling cadence and ceiling.
	pub fn with_polling(mut self, polling: PushPolling) -> Self {
		self.polling = polling;

		self
	}

	/// Uses `token` to abort push polling.
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = token;

		self
	}

	/// Token that aborts push polling when cancelled.
	pub fn cancellation_token(&self) -> CancellationToken {
		self.cancellation.clone()
	}

	/// Challenge being answered.
	pub fn challenge(&self) -> &TwoFactorChallenge {
		&self.challenge
	}

	/// Offered strategies, in server order.
	pub fn strategies(&self) -> &[AuthStrategy] {
		&self.challenge.strategies
	}

	/// Prompt for the proof required by the strategy at `index`.
	pub fn verification_prompt(&self, index: usize) -> Result<Option<String>> {
		self.challenge.strategy(index).map(AuthStrategy::verification_prompt)
	}

	/// Session lookup key cached by a push request, if any.
	pub fn session_lookup_key(&self) -> Option<String> {
		self.session_lookup_key.lock().clone()
	}

	/// Requests a one-time code (or a push) for the strategy at `index`.
	///
	/// Returns whether the caller must now collect a code. The offline authenticator needs
	/// no request and returns `true`; the push method returns `false` and caches the session
	/// lookup key used by [`authenticate`](Self::authenticate).
	pub async fn check_otc(&self, index: usize, proof: Option<&str>) -> Result<bool> {
		const KIND: FlowKind = FlowKind::TwoFactor;

		let span = FlowSpan::new(KIND, "check_otc");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.request_one_time_code(index, proof)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Completes the strategy at `index` and returns the issued token pair.
	///
	/// For the push method this first polls until the user answers, the deadline passes, or
	/// the cancellation token fires.
	pub async fn authenticate(
		&self,
		index: usize,
		proof: Option<&str>,
		otc: Option<&str>,
	) -> Result<RedirectTokens> {
		const KIND: FlowKind = FlowKind::TwoFactor;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.finish(index, proof, otc)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn request_one_time_code(&self, index: usize, proof: Option<&str>) -> Result<bool> {
		let strategy = self.challenge.strategy(index)?;

		if let AuthStrategy::Totp { .. } = strategy {
			return Ok(true);
		}

		let (channel, field) = strategy.delivery_channel().ok_or_else(|| strategy.unsupported_error())?;
		let data = strategy.data().unwrap_or_default();
		let mut form = vec![
			("login", self.login.as_str()),
			("flowtoken", self.challenge.flow_token.as_str()),
			("purpose", PURPOSE),
			("UIMode", "11"),
			("channel", channel),
			(field, data),
		];

		if let Some(proof) = proof.filter(|proof| !proof.is_empty()) {
			form.push(("ProofConfirmation", proof));
		}

		let request = common::form_request(&self.one_time_code_url, &form)?;
		let (response, _) = self.exchange.send(AuthStage::TwoFactor, request).await?;

		if response.status() != StatusCode::OK {
			return Err(Error::Authentication {
				stage: AuthStage::TwoFactor,
				reason: format!("Error requesting OTC, HTTP Code: {}", response.status().as_u16()),
			});
		}

		let reply: OneTimeCodeReply = common::parse_json(AuthStage::TwoFactor, &response)?;

		crate::obs::log_debug!("one-time code request answered with state {:?}", reply.state);

		if strategy.is_push() {
			*self.session_lookup_key.lock() = reply.session_lookup_key;

			return Ok(false);
		}

		Ok(true)
	}

	async fn finish(
		&self,
		index: usize,
		proof: Option<&str>,
		otc: Option<&str>,
	) -> Result<RedirectTokens> {
		let strategy = self.challenge.strategy(index)?;
		let completion_type = strategy.completion_type().ok_or_else(|| strategy.unsupported_error())?;
		let session_lookup_key = self.session_lookup_key();
		let mut sent_proof = strategy.data();

		if strategy.is_push() {
			let key = session_lookup_key.as_deref().ok_or_else(|| Error::Authentication {
				stage: AuthStage::TwoFactor,
				reason: "no session lookup key was received from the push request".into(),
			})?;
			let state = self.poll_session_state(key).await?;

			if state != SessionState::Approved {
				return Err(Error::Authentication {
					stage: AuthStage::TwoFactor,
					reason: format!("push approval failed with state {state}"),
				});
			}

			// The approved session is identified by `slk` alone.
			sent_proof = None;
		}

		let mut form = vec![("login", self.login.as_str()), ("PPFT", self.challenge.flow_token.as_str())];

		if let Some(sent_proof) = sent_proof {
			form.push(("SentProofIDE", sent_proof));
		}

		form.extend([("sacxt", "1"), ("saav", "0")]);

		if !strategy.is_push() {
			form.push(("GeneralVerify", "False"));
		}

		form.extend([("type", completion_type), ("purpose", PURPOSE), ("i18", I18N_STRINGS)]);

		if let Some(otc) = otc.filter(|otc| !otc.is_empty()) {
			form.push(("otc", otc));
		}
		if let Some(key) = session_lookup_key.as_deref() {
			form.push(("slk", key));
		}
		if let Some(proof) = proof.filter(|proof| !proof.is_empty()) {
			form.push(("ProofConfirmation", proof));
		}

		let request = common::form_request(&self.challenge.post_url, &form)?;
		let (response, _) = self.exchange.send(AuthStage::TwoFactor, request).await?;
		let tokens = response
			.headers()
			.get(LOCATION)
			.and_then(|value| value.to_str().ok())
			.ok_or_else(|| Error::Authentication {
				stage: AuthStage::TwoFactor,
				reason: "Location header does not hold access/refresh tokens".into(),
			})
			.and_then(RedirectTokens::from_location);

		if tokens.is_err() {
			crate::obs::log_debug!(
				"completion answered HTTP {} without a token redirect",
				response.status().as_u16()
			);
		}

		tokens
	}

	async fn poll_session_state(&self, session_lookup_key: &str) -> Result<SessionState> {
		let mut url = self.polling_url.clone();

		url.query_pairs_mut().append_pair("slk", session_lookup_key);

		tokio::select! {
			biased;
			_ = self.cancellation.cancelled() => Err(Error::Cancelled),
			outcome = tokio::time::timeout(self.polling.deadline, self.poll_until_answered(&url)) => match outcome {
				Ok(state) => state,
				Err(_) => Err(Error::Authentication {
					stage: AuthStage::TwoFactor,
					reason: format!(
						"push approval was not answered within {} seconds",
						self.polling.deadline.as_secs()
					),
				}),
			},
		}
	}

	async fn poll_until_answered(&self, url: &Url) -> Result<SessionState> {
		loop {
			let request = common::get_request(url)?;
			let (response, _) = self.exchange.send(AuthStage::TwoFactor, request).await?;
			let state = SessionState::from_gif(response.body());

			if state != SessionState::Pending {
				return Ok(state);
			}

			tokio::time::sleep(self.polling.interval).await;
		}
	}
}
#[cfg(feature = "reqwest")]
impl TwoFactorAuthentication<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates the sub-flow on a fresh reqwest transport with the default strategy.
	pub fn new(
		descriptor: &XboxLiveDescriptor,
		challenge: TwoFactorChallenge,
		login: impl Into<String>,
	) -> Result<Self> {
		Ok(Self::with_http_client(
			descriptor,
			Arc::new(XboxLiveStrategy),
			challenge,
			login,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Debug for TwoFactorAuthentication<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TwoFactorAuthentication")
			.field("login", &self.login)
			.field("strategies", &self.challenge.strategies.len())
			.field("polling", &self.polling)
			.finish()
	}
}
