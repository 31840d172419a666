//! HTTP seam between the flows and whatever client sends the bytes.
//!
//! Every request (OAuth grants, Xbox token requests, the two-factor sub-flow and session
//! calls) goes through an [`AuthHttpClient`] handle. The handle reports status, `Retry-After`
//! and `x-err` through a [`ResponseMetadataSlot`] so failures can be classified afterwards.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
#[cfg(feature = "reqwest")] use crate::error::ConfigError;
use crate::_prelude::*;

/// HTTP transport used by the flows.
///
/// Handles must own their state so request futures stay `Send`. Implementations must not
/// follow redirects: two-factor completion reads the tokens from the `Location` header of a
/// 302 response.
pub trait AuthHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Per-request handle; its futures must be `Send`.
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle that clears `slot` before sending and stores the response metadata
	/// once a status is known.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Status details of the latest response, consumed by error classification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code, if a response was received.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Xbox Live error code from the `x-err` response header.
	pub xerr: Option<u64>,
}
impl ResponseMetadata {
	/// Reads the status and the hint headers of a response.
	#[cfg(feature = "reqwest")]
	pub fn from_headers(status: u16, headers: &HeaderMap) -> Self {
		Self { status: Some(status), retry_after: parse_retry_after(headers), xerr: parse_xerr(headers) }
	}
}

/// Per-request slot the transport fills and the error layer drains.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Default transport: a [`ReqwestClient`] that never follows redirects.
///
/// A client passed to [`with_client`](Self::with_client) must be built with
/// `redirect::Policy::none()` as well.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled.
	pub fn new() -> Result<Self, ConfigError> {
		ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map(Self)
			.map_err(ConfigError::from)
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl AuthHttpClient for ReqwestHttpClient {
	type Handle = MeteredHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		MeteredHandle { client: self.0.clone(), slot }
	}
}

/// Request handle of [`ReqwestHttpClient`] that records [`ResponseMetadata`] into its slot.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct MeteredHandle {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
#[cfg(feature = "reqwest")]
impl MeteredHandle {
	async fn execute(
		client: ReqwestClient,
		slot: ResponseMetadataSlot,
		request: HttpRequest,
	) -> Result<HttpResponse, HttpClientError<ReqwestError>> {
		slot.take();

		let response = client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
		let status = response.status();
		let headers = response.headers().to_owned();

		slot.store(ResponseMetadata::from_headers(status.as_u16(), &headers));

		let body = response.bytes().await.map_err(Box::new)?;
		let mut converted = HttpResponse::new(body.to_vec());

		*converted.status_mut() = status;
		*converted.headers_mut() = headers;

		Ok(converted)
	}
}
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for MeteredHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(Self::execute(self.client.clone(), self.slot.clone(), request))
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u32>() {
		return Some(Duration::seconds(secs.into()));
	}

	let delta = OffsetDateTime::parse(raw, &Rfc2822).ok()? - OffsetDateTime::now_utc();

	delta.is_positive().then_some(delta)
}

#[cfg(feature = "reqwest")]
fn parse_xerr(headers: &HeaderMap) -> Option<u64> {
	headers.get("x-err")?.to_str().ok()?.trim().parse().ok()
}
