//! Attaches the `Signature` header to outbound requests without constraining the client type.

// crates.io
use oauth2::{
	HttpRequest,
	http::{HeaderValue, header::AUTHORIZATION},
};
// self
use crate::signing::{RequestSigner, SignatureError};

/// Header carrying the base64 signature blob.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Signs a request in place, reading method, path, body, and `Authorization` from it.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it with a fresh `Signature` header.
	fn sign_request(&self, request: Request) -> Result<Request, Error>;
}

impl RequestSignerExt<HttpRequest, SignatureError> for RequestSigner {
	fn sign_request(&self, mut request: HttpRequest) -> Result<HttpRequest, SignatureError> {
		let path_and_query =
			request.uri().path_and_query().map(|pq| pq.as_str().to_owned()).unwrap_or_else(|| "/".into());
		let authorization = request
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.unwrap_or_default()
			.to_owned();
		let signature = self.sign(
			request.method().as_str(),
			&path_and_query,
			request.body(),
			&authorization,
			None,
		)?;

		request.headers_mut().insert(SIGNATURE_HEADER, header_value(&signature)?);

		Ok(request)
	}
}

#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::Request, SignatureError> for RequestSigner {
	fn sign_request(&self, mut request: reqwest::Request) -> Result<reqwest::Request, SignatureError> {
		let url = request.url();
		let path_and_query = match url.query() {
			Some(query) => format!("{}?{query}", url.path()),
			None => url.path().to_owned(),
		};
		let authorization = request
			.headers()
			.get(reqwest::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.unwrap_or_default()
			.to_owned();
		// Streaming bodies are signed as empty.
		let body = request.body().and_then(|body| body.as_bytes()).unwrap_or_default();
		let signature =
			self.sign(request.method().as_str(), &path_and_query, body, &authorization, None)?;

		request.headers_mut().insert(SIGNATURE_HEADER, header_value(&signature)?);

		Ok(request)
	}
}

fn header_value(signature: &str) -> Result<HeaderValue, SignatureError> {
	HeaderValue::from_str(signature)
		.map_err(|e| SignatureError::Malformed { reason: format!("header value: {e}") })
}
