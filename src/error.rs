//! Crate-level error types shared across flows, signers, rate limits, and stores.

// self
use crate::{_prelude::*, provider::AuthStage, ratelimit::CombinedRateLimit};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS) or a non-retryable HTTP status.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Signing key, signature encoding, or verification failure.
	#[error(transparent)]
	Signature(#[from] crate::signing::SignatureError),

	/// Credentials were rejected or a chain step failed.
	#[error("Authentication failed during the {stage} stage: {reason}.")]
	Authentication {
		/// Stage of the token chain that failed.
		stage: AuthStage,
		/// Provider- or crate-supplied reason string.
		reason: String,
	},
	/// The login response demands a second factor before tokens are issued.
	#[error("Two-factor authentication is required ({} strategies offered).", .0.strategies.len())]
	TwoFactorRequired(Box<crate::two_factor::TwoFactorChallenge>),
	/// A local rate limit is exhausted; wait until `reset_after` before retrying.
	#[error("Rate limit exceeded for {} traffic.", .limit.direction())]
	RateLimitExceeded {
		/// The exhausted limit.
		limit: Arc<CombinedRateLimit>,
		/// Latest reset instant across the exceeded sub-limits.
		reset_after: Option<OffsetDateTime>,
	},
	/// XSTS answered 401: the account cannot use the service.
	#[error("Account is not eligible for Xbox Live: {reason}.")]
	IneligibleAccount {
		/// Decoded `XErr` code, if the body carried one.
		xerr: Option<u64>,
		/// Human-readable reason.
		reason: String,
	},
	/// The token chain hit a terminal failure and needs a fresh authorization.
	#[error("Stored credentials are invalid; a fresh authorization is required.")]
	InvalidCredentials,
	/// The caller selected a two-factor strategy that does not exist.
	#[error("Two-factor strategy index {index} is out of range ({available} available).")]
	InvalidStrategyIndex {
		/// Requested index.
		index: usize,
		/// Number of strategies offered by the server.
		available: usize,
	},
	/// The operation was cancelled by the caller.
	#[error("Operation was cancelled.")]
	Cancelled,
}
impl Error {
	/// Returns the upstream HTTP status preserved by this error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Transient(TransientError::Upstream { status, .. })
			| Self::Transient(TransientError::ResponseParse { status, .. }) => *status,
			Self::Transport(TransportError::Status { status, .. }) => Some(*status),
			Self::IneligibleAccount { .. } => Some(401),
			_ => None,
		}
	}

	/// Returns true when the chain must be restarted from a fresh authorization.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::IneligibleAccount { .. } | Self::InvalidCredentials)
	}
}

/// Configuration and validation failures raised locally.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[source] serde_json::Error),

	/// No OAuth token (or refresh secret) is held, so nothing can be refreshed.
	#[error("No refresh token is available; request tokens first.")]
	MissingRefreshToken,
	/// An earlier chain step has not produced the token this step consumes.
	#[error("The {0} token is missing; complete the previous chain step first.")]
	MissingToken(&'static str),
	/// A signed request was attempted without a signing key.
	#[error("No request signer is configured.")]
	MissingSigner,
	/// XSTS token carries no user hash, so no authorization header can be built.
	#[error("Service token is missing the user hash claim.")]
	MissingUserhash,
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// OAuth token builder validation failed.
	#[error("Unable to build OAuth token.")]
	TokenBuild(#[from] crate::auth::OAuth2TokenBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Upstream returned a retryable failure (429, 5xx, `temporarily_unavailable`).
	#[error("The {stage} endpoint returned a retryable failure: {message}.")]
	Upstream {
		/// Stage that issued the request.
		stage: AuthStage,
		/// Provider- or crate-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Upstream responded with malformed JSON that could not be parsed.
	#[error("The {stage} endpoint returned malformed JSON.")]
	ResponseParse {
		/// Stage that issued the request.
		stage: AuthStage,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO, unexpected HTTP status).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling an Xbox Live endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling an Xbox Live endpoint.")]
	Io(#[from] std::io::Error),
	/// Endpoint answered with a non-success status that is not retryable.
	#[error("The {stage} endpoint answered with HTTP {status}.")]
	Status {
		/// Stage that issued the request.
		stage: AuthStage,
		/// HTTP status code.
		status: u16,
		/// Preview of the response body.
		body: Option<String>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
