//! Authorized request path shared by endpoint wrappers.
//!
//! Every call goes through the same steps: refresh the chain, pre-check the rate limiter,
//! attach `Authorization: XBL3.0 x=<userhash>;<token>`, sign when a key is attached, take a
//! rate-limit slot, send, and classify the response status. Taking the slot checks and counts
//! under one guard, so concurrent sends cannot overshoot the limit.

// crates.io
use oauth2::{
	HttpRequest, HttpResponse,
	http::{HeaderValue, header::AUTHORIZATION},
};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	ext::RequestSignerExt,
	flows::{AuthenticationManager, common},
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::AuthStage,
	ratelimit::{EndpointRateLimits, LimitDirection, RateLimitConfig},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Session on the crate's default reqwest transport stack.
pub type ReqwestXblSession = XblSession<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authenticated, rate-limited, optionally signed view of one identity.
pub struct XblSession<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	manager: AuthenticationManager<C, M>,
	limits: EndpointRateLimits,
	sign_requests: bool,
}
impl<C, M> XblSession<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps `manager`, drawing every call from `limits`.
	///
	/// Requests are signed whenever the manager carries a signer.
	pub fn new(manager: AuthenticationManager<C, M>, limits: EndpointRateLimits) -> Self {
		let sign_requests = manager.signer().is_some();

		Self { manager, limits, sign_requests }
	}

	/// Builds the limits from a provider configuration.
	pub fn with_rate_limit_config(
		manager: AuthenticationManager<C, M>,
		config: &RateLimitConfig,
	) -> Self {
		Self::new(manager, EndpointRateLimits::from_config(config))
	}

	/// Forces signing on or off.
	pub fn with_signing(mut self, enabled: bool) -> Self {
		self.sign_requests = enabled;

		self
	}

	/// Underlying manager.
	pub fn manager(&self) -> &AuthenticationManager<C, M> {
		&self.manager
	}

	/// Limits consulted before every call.
	pub fn rate_limits(&self) -> &EndpointRateLimits {
		&self.limits
	}

	/// Sends `request` on behalf of the held identity, counting it against `direction`.
	///
	/// Fails with [`Error::RateLimitExceeded`] without touching the network when the limit
	/// is exhausted. Non-2xx responses are classified like chain failures.
	pub async fn send(
		&self,
		mut request: HttpRequest,
		direction: LimitDirection,
	) -> Result<HttpResponse> {
		const KIND: FlowKind = FlowKind::Session;

		let span = FlowSpan::new(KIND, "send");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.manager.refresh_tokens().await?;
				self.limits.admit(direction)?;

				let authorization = self.manager.authorization_header_value()?;

				request.headers_mut().insert(
					AUTHORIZATION,
					HeaderValue::from_str(&authorization)
						.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?,
				);

				if self.sign_requests {
					let signer = self.manager.signer().ok_or(ConfigError::MissingSigner)?;

					request = signer.sign_request(request)?;
				}

				self.limits.acquire(direction)?;

				let exchange = self.manager.exchange();
				let (response, meta) = exchange.send(AuthStage::Session, request).await?;

				exchange.ensure_success(AuthStage::Session, &response, meta.as_ref())?;

				Ok(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Sends an authorized `GET` for `url` against the read budget.
	pub async fn get(&self, url: &Url) -> Result<HttpResponse> {
		self.send(common::get_request(url)?, LimitDirection::Read).await
	}

	/// Sends an authorized JSON `POST` for `url` against the write budget.
	pub async fn post_json<T>(&self, url: &Url, body: &T) -> Result<HttpResponse>
	where
		T: ?Sized + Serialize,
	{
		self.send(common::json_request(url, body, &[])?, LimitDirection::Write).await
	}
}
impl<C, M> Debug for XblSession<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("XblSession")
			.field("manager", &self.manager)
			.field("limits", &self.limits)
			.field("sign_requests", &self.sign_requests)
			.finish()
	}
}
