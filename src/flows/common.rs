//! Shared helpers for flow implementations (request building, dispatch, status classification).

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method,
		header::{ACCEPT, CONTENT_TYPE, HeaderName, HeaderValue},
	},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError},
	http::{AuthHttpClient, ResponseMetadata, ResponseMetadataSlot},
	oauth::{self, TransportErrorMapper},
	provider::{AuthStage, ProviderErrorContext, ProviderStrategy, XErrBody},
};

/// Contract version header sent to the Xbox token endpoints.
pub(crate) const CONTRACT_VERSION: (&str, &str) = ("x-xbl-contract-version", "1");

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Envelope shared by the user, device, and service token requests.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct XboxAuthRequest<'a, P> {
	pub(crate) relying_party: &'a str,
	pub(crate) token_type: &'a str,
	pub(crate) properties: P,
}
impl<'a, P> XboxAuthRequest<'a, P> {
	pub(crate) fn jwt(relying_party: &'a str, properties: P) -> Self {
		Self { relying_party, token_type: "JWT", properties }
	}
}

/// OAuth-style error fields some Windows Live endpoints return outside the token grant.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	error_description: Option<String>,
}

/// Transport, mapper, and strategy bundle every non-OAuth request goes through.
pub(crate) struct HttpExchange<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) http: Arc<C>,
	pub(crate) mapper: Arc<M>,
	pub(crate) strategy: Arc<dyn ProviderStrategy>,
}
impl<C, M> HttpExchange<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(http: Arc<C>, mapper: Arc<M>, strategy: Arc<dyn ProviderStrategy>) -> Self {
		Self { http, mapper, strategy }
	}

	/// Dispatches `request`, returning the raw response and the captured metadata.
	///
	/// Transport failures are mapped; HTTP statuses are left for the caller to judge.
	pub(crate) async fn send(
		&self,
		stage: AuthStage,
		request: HttpRequest,
	) -> Result<(HttpResponse, Option<ResponseMetadata>)> {
		let slot = ResponseMetadataSlot::default();
		let handle = self.http.with_metadata(slot.clone());

		match handle.call(request).await {
			Ok(response) => Ok((response, slot.take())),
			Err(err) => {
				let meta = slot.take();

				Err(self.mapper.map_transport_error(self.strategy.as_ref(), stage, meta.as_ref(), err))
			},
		}
	}

	/// Sends `request` and fails unless the response status is 2xx.
	pub(crate) async fn send_checked(
		&self,
		stage: AuthStage,
		request: HttpRequest,
	) -> Result<HttpResponse> {
		let (response, meta) = self.send(stage, request).await?;

		self.ensure_success(stage, &response, meta.as_ref())?;

		Ok(response)
	}

	/// Classifies a non-2xx response through the provider strategy.
	pub(crate) fn ensure_success(
		&self,
		stage: AuthStage,
		response: &HttpResponse,
		meta: Option<&ResponseMetadata>,
	) -> Result<()> {
		let status = response.status();

		if status.is_success() {
			return Ok(());
		}

		let body = response.body();
		let mut ctx = ProviderErrorContext::new(stage).with_http_status(status.as_u16());
		let preview = String::from_utf8_lossy(body);

		if !preview.trim().is_empty() {
			ctx = ctx.with_body_preview(preview.into_owned());
		}
		if let Some(code) = serde_json::from_slice::<XErrBody>(body)
			.ok()
			.and_then(|b| b.xerr)
			.or_else(|| meta.and_then(|m| m.xerr))
		{
			ctx = ctx.with_xerr(code);
		}
		if let Ok(oauth_body) = serde_json::from_slice::<OAuthErrorBody>(body) {
			if let Some(error) = oauth_body.error {
				ctx = ctx.with_oauth_error(error);
			}
			if let Some(description) = oauth_body.error_description {
				ctx = ctx.with_error_description(description);
			}
		}

		Err(oauth::classify(self.strategy.as_ref(), &ctx, meta))
	}
}
impl<C, M> Clone for HttpExchange<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self { http: self.http.clone(), mapper: self.mapper.clone(), strategy: self.strategy.clone() }
	}
}

/// Parses a JSON body, naming the offending field on failure.
pub(crate) fn parse_json<T>(stage: AuthStage, response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let de = &mut serde_json::Deserializer::from_slice(response.body());

	serde_path_to_error::deserialize(de).map_err(|source| {
		TransientError::ResponseParse { stage, source, status: Some(response.status().as_u16()) }
			.into()
	})
}

/// Builds a JSON `POST` with the given extra headers.
pub(crate) fn json_request<T>(url: &Url, body: &T, headers: &[(&str, &str)]) -> Result<HttpRequest>
where
	T: ?Sized + Serialize,
{
	let payload = serde_json::to_vec(body).map_err(ConfigError::RequestBody)?;
	let mut builder = oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, JSON)
		.header(ACCEPT, JSON);

	for (name, value) in headers {
		builder = builder.header(*name, *value);
	}

	builder.body(payload).map_err(|e| ConfigError::from(e).into())
}

/// Builds a form-encoded `POST`.
pub(crate) fn form_request(url: &Url, pairs: &[(&str, &str)]) -> Result<HttpRequest> {
	let payload = url::form_urlencoded::Serializer::new(String::new())
		.extend_pairs(pairs.iter().copied())
		.finish();

	oauth2::http::Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(CONTENT_TYPE, FORM)
		.header(ACCEPT, JSON)
		.body(payload.into_bytes())
		.map_err(|e| ConfigError::from(e).into())
}

/// Appends `headers` to an already built request.
pub(crate) fn with_headers(mut request: HttpRequest, headers: &[(&str, &str)]) -> Result<HttpRequest> {
	for (name, value) in headers {
		let name = HeaderName::from_bytes(name.as_bytes())
			.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;
		let value = HeaderValue::from_str(value)
			.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

		request.headers_mut().append(name, value);
	}

	Ok(request)
}

/// Builds a bodiless `GET`.
pub(crate) fn get_request(url: &Url) -> Result<HttpRequest> {
	oauth2::http::Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}
