//! Internal OAuth client facade over the Windows Live token endpoint.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, RedirectUrl, RefreshToken, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{OAuth2Token, ScopeSet},
	error::{ConfigError, TransientError, TransportError},
	http::{AuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		AuthStage, ProviderErrorContext, ProviderErrorKind, ProviderStrategy, XboxLiveDescriptor,
	},
};

/// Extra fields Windows Live adds to token responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTokenFields {
	/// Windows Live user id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
}
impl ExtraTokenFields for LiveTokenFields {}

/// Token response returned by `oauth20_token.srf`.
pub type LiveTokenResponse = StandardTokenResponse<LiveTokenFields, BasicTokenType>;

type LiveClient = Client<
	BasicErrorResponse,
	LiveTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		stage: AuthStage,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		stage: AuthStage,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(strategy, stage, meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(stage, meta, message),
			_ => map_unknown_transport_error(stage, meta),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'strategy, 'code, 'scope, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		requested_scope: &'scope ScopeSet,
		redirect_uri: &'redirect Url,
	) -> FacadeFuture<'a, OAuth2Token>
	where
		'strategy: 'a,
		'code: 'a,
		'scope: 'a,
		'redirect: 'a;

	fn refresh_token<'a, 'strategy, 'refresh, 'scope, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
		requested_scope: &'scope ScopeSet,
		redirect_uri: &'redirect Url,
	) -> FacadeFuture<'a, OAuth2Token>
	where
		'strategy: 'a,
		'refresh: 'a,
		'scope: 'a,
		'redirect: 'a;
}

/// Windows Live facade sending client credentials in the form body.
pub(crate) struct LiveFacade<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: LiveClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> LiveFacade<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &XboxLiveDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client: LiveClient = Client::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.to_owned()));
		}

		Ok(Self { oauth_client, http_client, error_mapper })
	}
}
impl<C, M> OAuth2Facade for LiveFacade<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'scope, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		requested_scope: &'scope ScopeSet,
		redirect_uri: &'redirect Url,
	) -> FacadeFuture<'a, OAuth2Token>
	where
		'strategy: 'a,
		'code: 'a,
		'scope: 'a,
		'redirect: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::new(redirect_uri.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.add_extra_param("scope", requested_scope.normalized())
				.set_redirect_uri(Cow::Owned(redirect_url))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(strategy, meta.take(), err, self.error_mapper.as_ref()))?;

			map_token_response(requested_scope, response, None)
		})
	}

	fn refresh_token<'a, 'strategy, 'refresh, 'scope, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		refresh_token: &'refresh str,
		requested_scope: &'scope ScopeSet,
		redirect_uri: &'redirect Url,
	) -> FacadeFuture<'a, OAuth2Token>
	where
		'strategy: 'a,
		'refresh: 'a,
		'scope: 'a,
		'redirect: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.add_extra_param("scope", requested_scope.normalized())
				.add_extra_param("redirect_uri", redirect_uri.to_string())
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(strategy, meta.take(), err, self.error_mapper.as_ref()))?;

			// Windows Live may omit a rotated refresh token; the previous one stays usable.
			map_token_response(requested_scope, response, Some(refresh_token))
		})
	}
}

pub(crate) fn map_token_response(
	requested_scope: &ScopeSet,
	response: LiveTokenResponse,
	previous_refresh: Option<&str>,
) -> Result<OAuth2Token> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	let scope = match response.scopes() {
		Some(scopes) =>
			ScopeSet::new(scopes.iter().map(|scope| scope.as_ref())).map_err(ConfigError::from)?,
		None => requested_scope.clone(),
	};
	let mut builder = OAuth2Token::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref())
		.scope(scope)
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	if let Some(refresh) =
		response.refresh_token().map(|token| token.secret().as_str()).or(previous_refresh)
	{
		builder = builder.refresh_token(refresh);
	} else if requested_scope.grants_offline_access() {
		crate::obs::log_warn!("token response carried no refresh token for an offline_access request");
	}
	if let Some(user_id) = &response.extra_fields().user_id {
		builder = builder.user_id(user_id.clone());
	}

	builder.build().map_err(|e| ConfigError::from(e).into())
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	meta: Option<ResponseMetadata>,
	err: RequestTokenError<HttpClientError<E>, BasicErrorResponse>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) =>
			mapper.map_transport_error(strategy, AuthStage::OAuth, meta_ref, error),
		RequestTokenError::Parse(source, _body) => TransientError::ResponseParse {
			stage: AuthStage::OAuth,
			source,
			status: meta_status(meta_ref),
		}
		.into(),
		RequestTokenError::Other(message) => TransientError::Upstream {
			stage: AuthStage::OAuth,
			message: format!("unexpected token endpoint response: {message}"),
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx = ProviderErrorContext::new(AuthStage::OAuth)
		.with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	classify(strategy, &ctx, meta)
}

/// Turns a classified failure into the matching crate error.
pub(crate) fn classify(
	strategy: &dyn ProviderStrategy,
	ctx: &ProviderErrorContext,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let reason = ctx.reason();

	match strategy.classify(ctx) {
		ProviderErrorKind::Rejected => Error::Authentication { stage: ctx.stage, reason },
		ProviderErrorKind::Ineligible => Error::IneligibleAccount { xerr: ctx.xerr, reason },
		ProviderErrorKind::Transient => TransientError::Upstream {
			stage: ctx.stage,
			message: reason,
			status: ctx.http_status.or_else(|| meta_status(meta)),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		ProviderErrorKind::Status => TransportError::Status {
			stage: ctx.stage,
			status: ctx.http_status.or_else(|| meta_status(meta)).unwrap_or_default(),
			body: ctx.body_preview.clone(),
		}
		.into(),
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(
	strategy: &dyn ProviderStrategy,
	stage: AuthStage,
	meta: Option<&ResponseMetadata>,
	err: ReqwestError,
) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() || err.is_connect() {
		let ctx = ProviderErrorContext::network_failure(stage);

		return match strategy.classify(&ctx) {
			ProviderErrorKind::Transient => TransientError::Upstream {
				stage,
				message: if err.is_timeout() {
					"request timed out".into()
				} else {
					"connection failed".into()
				},
				status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
				retry_after: meta_retry_after(meta),
			}
			.into(),
			_ => TransportError::from(err).into(),
		};
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(
	stage: AuthStage,
	meta: Option<&ResponseMetadata>,
	message: impl Display,
) -> Error {
	TransientError::Upstream {
		stage,
		message: format!("HTTP client error: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_unknown_transport_error(stage: AuthStage, meta: Option<&ResponseMetadata>) -> Error {
	TransientError::Upstream {
		stage,
		message: "unknown HTTP client error".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::{http::ReqwestHttpClient, provider::XboxLiveStrategy};

	#[test]
	fn builds_facade_with_and_without_secret() {
		let descriptor = XboxLiveDescriptor::live().expect("Production descriptor should build.");
		let http = Arc::new(ReqwestHttpClient::new().expect("Reqwest client should build."));

		for secret in [None, Some("secret")] {
			let facade = <LiveFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>>::from_descriptor(
				&descriptor,
				"0000000048093EE3",
				secret,
				http.clone(),
				Arc::new(ReqwestTransportErrorMapper),
			);

			assert!(facade.is_ok());
		}
	}

	#[test]
	fn token_response_keeps_previous_refresh_and_user_id() {
		let response: LiveTokenResponse = serde_json::from_str(
			r#"{"token_type":"bearer","expires_in":3600,"scope":"service::user.auth.xboxlive.com::MBI_SSL","access_token":"access","user_id":"abc123"}"#,
		)
		.expect("Token response fixture should deserialize.");
		let token = map_token_response(&ScopeSet::xbox_live(), response, Some("old-refresh"))
			.expect("Token response should map.");

		assert_eq!(token.access_token.expose(), "access");
		assert_eq!(token.refresh_token.as_ref().map(|secret| secret.expose()), Some("old-refresh"));
		assert_eq!(token.user_id.as_deref(), Some("abc123"));
		assert_eq!(token.expires_in, Duration::HOUR);
	}

	#[test]
	fn classification_maps_to_error_variants() {
		let strategy = XboxLiveStrategy;
		let meta = ResponseMetadata {
			status: Some(503),
			retry_after: Some(Duration::seconds(5)),
			..Default::default()
		};
		let transient =
			classify(&strategy, &ProviderErrorContext::new(AuthStage::UserToken).with_http_status(503), Some(&meta));

		assert!(matches!(
			transient,
			Error::Transient(TransientError::Upstream { status: Some(503), retry_after: Some(_), .. })
		));

		let rejected = classify(
			&strategy,
			&ProviderErrorContext::new(AuthStage::OAuth).with_oauth_error("invalid_grant"),
			None,
		);

		assert!(matches!(rejected, Error::Authentication { stage: AuthStage::OAuth, .. }));

		let status = classify(
			&strategy,
			&ProviderErrorContext::new(AuthStage::UserToken).with_http_status(400),
			None,
		);

		assert_eq!(status.status(), Some(400));
	}
}
