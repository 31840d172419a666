//! Token chain orchestration: `OAuth2Token → UserToken → ServiceToken`, plus the device and
//! title tokens.
//!
//! [`AuthenticationManager`] owns exactly one instance of each token and replaces it wholesale
//! whenever a step succeeds. Individual operations live in per-flow modules that add `impl`
//! blocks to the manager.

pub mod authorization;
pub mod device;
pub mod persistence;
pub mod refresh;
pub mod sisu;

pub(crate) mod common;

pub use refresh::RefreshMetrics;
pub use sisu::{CorrelationVector, SisuAuthorization, SisuSession, XalApp};

// self
use crate::{
	_prelude::*,
	auth::{DeviceToken, OAuth2Token, ScopeSet, ServiceToken, TitleToken, Token, UserToken},
	error::ConfigError,
	flows::common::HttpExchange,
	http::AuthHttpClient,
	oauth::{LiveFacade, TransportErrorMapper},
	provider::{ProviderStrategy, XboxLiveDescriptor},
	signing::RequestSigner,
	two_factor::{TwoFactorAuthentication, TwoFactorChallenge},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Manager specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthenticationManager =
	AuthenticationManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Validity of the held token chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChainState {
	/// No service token has been obtained yet.
	Absent,
	/// Every held chain token is valid.
	Valid,
	/// At least one chain token has expired; a refresh will renew it.
	Expired,
	/// XSTS rejected the account; only a fresh authorization can recover.
	InvalidCredentials,
}

/// Immutable snapshot of the held tokens. Steps swap in a new snapshot on success.
#[derive(Clone, Debug, Default)]
pub(crate) struct TokenChain {
	pub(crate) oauth: Option<Arc<OAuth2Token>>,
	pub(crate) user: Option<Arc<UserToken>>,
	pub(crate) service: Option<Arc<ServiceToken>>,
	pub(crate) device: Option<Arc<DeviceToken>>,
	pub(crate) title: Option<Arc<TitleToken>>,
	pub(crate) invalidated: bool,
}

/// Produces and keeps current the Xbox Live token chain for one identity.
///
/// The manager holds the client identity (id, optional secret, redirect URI, scopes), the
/// service descriptor, and a transport. Tokens are read through cheap `Arc` snapshots, so
/// callers never observe a half-updated chain.
pub struct AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Service endpoints, relying parties, and device profile.
	pub descriptor: XboxLiveDescriptor,
	/// Windows Live client identifier.
	pub client_id: String,
	/// Optional client secret for confidential clients.
	pub client_secret: Option<String>,
	/// Redirect URI registered with the client.
	pub redirect_uri: Url,
	/// Scopes requested at authorization and refresh.
	pub scope: ScopeSet,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	exchange: HttpExchange<C, M>,
	signer: Option<Arc<RequestSigner>>,
	correlation: Arc<CorrelationVector>,
	tokens: Arc<RwLock<TokenChain>>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that reuses the caller-provided transport and mapper pair.
	pub fn with_http_client(
		descriptor: XboxLiveDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		redirect_uri: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			descriptor,
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scope: ScopeSet::xbox_live(),
			refresh_metrics: Default::default(),
			exchange: HttpExchange::new(http_client.into(), mapper.into(), strategy),
			signer: None,
			correlation: Default::default(),
			tokens: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the requested scopes (defaults to the Xbox Live sign-in scopes).
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Attaches the key that signs device token requests.
	pub fn with_signer(mut self, signer: impl Into<Arc<RequestSigner>>) -> Self {
		self.signer = Some(signer.into());

		self
	}

	/// Signer attached with [`with_signer`](Self::with_signer), if any.
	pub fn signer(&self) -> Option<&Arc<RequestSigner>> {
		self.signer.as_ref()
	}

	/// Correlation vector stamped on XAL requests as `MS-CV`.
	pub fn correlation_vector(&self) -> &CorrelationVector {
		&self.correlation
	}

	/// Held OAuth token.
	pub fn oauth_token(&self) -> Option<Arc<OAuth2Token>> {
		self.tokens.read().oauth.clone()
	}

	/// Held user token.
	pub fn user_token(&self) -> Option<Arc<UserToken>> {
		self.tokens.read().user.clone()
	}

	/// Held service token.
	pub fn service_token(&self) -> Option<Arc<ServiceToken>> {
		self.tokens.read().service.clone()
	}

	/// Held device token.
	pub fn device_token(&self) -> Option<Arc<DeviceToken>> {
		self.tokens.read().device.clone()
	}

	/// Held title token, present after a SISU sign-in.
	pub fn title_token(&self) -> Option<Arc<TitleToken>> {
		self.tokens.read().title.clone()
	}

	/// Reports the chain validity at `now`.
	pub fn state_at(&self, now: OffsetDateTime) -> ChainState {
		let chain = self.tokens.read();

		if chain.invalidated {
			return ChainState::InvalidCredentials;
		}

		let Some(service) = chain.service.as_deref() else {
			return ChainState::Absent;
		};
		let valid = service.is_valid_at(now)
			&& chain.user.as_deref().is_some_and(|user| user.is_valid_at(now))
			&& chain.oauth.as_deref().is_some_and(|oauth| oauth.is_valid_at(now));

		if valid { ChainState::Valid } else { ChainState::Expired }
	}

	/// Reports the chain validity against the current UTC clock.
	pub fn state(&self) -> ChainState {
		self.state_at(OffsetDateTime::now_utc())
	}

	/// `XBL3.0 x=<userhash>;<token>` for the held service token.
	pub fn authorization_header_value(&self) -> Result<String> {
		let service = self.service_token().ok_or(ConfigError::MissingToken("service"))?;

		service.authorization_header_value().ok_or_else(|| ConfigError::MissingUserhash.into())
	}

	/// Starts the second-factor sub-flow for `challenge` on this manager's transport.
	pub fn two_factor(
		&self,
		challenge: TwoFactorChallenge,
		login: impl Into<String>,
	) -> TwoFactorAuthentication<C, M> {
		TwoFactorAuthentication::from_exchange(
			self.exchange.clone(),
			&self.descriptor,
			challenge,
			login,
		)
	}

	pub(crate) fn exchange(&self) -> &HttpExchange<C, M> {
		&self.exchange
	}

	pub(crate) fn chain(&self) -> TokenChain {
		self.tokens.read().clone()
	}

	pub(crate) fn update_chain(&self, update: impl FnOnce(&mut TokenChain)) {
		update(&mut *self.tokens.write());
	}

	pub(crate) fn facade(&self) -> Result<LiveFacade<C, M>> {
		LiveFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_deref(),
			self.exchange.http.clone(),
			self.exchange.mapper.clone(),
		)
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticationManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager with its own reqwest-backed transport.
	///
	/// Use [`AuthenticationManager::with_client_secret`] to attach a confidential client
	/// secret and [`AuthenticationManager::with_signer`] before requesting device tokens.
	pub fn new(
		descriptor: XboxLiveDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		redirect_uri: Url,
	) -> Result<Self> {
		Ok(Self::with_http_client(
			descriptor,
			strategy,
			client_id,
			redirect_uri,
			ReqwestHttpClient::new()?,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			descriptor: self.descriptor.clone(),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			redirect_uri: self.redirect_uri.clone(),
			scope: self.scope.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			exchange: self.exchange.clone(),
			signer: self.signer.clone(),
			correlation: self.correlation.clone(),
			tokens: self.tokens.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C, M> Debug for AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticationManager")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("scope", &self.scope)
			.field("signer_set", &self.signer.is_some())
			.field("correlation_vector", &self.correlation.value())
			.finish()
	}
}
