//! Strategy hooks that classify failed responses from each chain stage.
//!
//! Implementations map status codes, OAuth error fields, and `XErr` codes onto
//! [`ProviderErrorKind`] without tying flows to any particular HTTP client.

// self
use crate::_prelude::*;

/// Step of the token chain (or sub-flow) that issued a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStage {
	/// Windows Live OAuth2 token endpoint.
	OAuth,
	/// XAU user token endpoint.
	UserToken,
	/// XSTS endpoint.
	ServiceToken,
	/// XAD device token endpoint.
	DeviceToken,
	/// Two-factor one-time-code, polling, and completion endpoints.
	TwoFactor,
	/// Authorized API calls made through a session.
	Session,
	/// Title endpoint catalogue.
	TitleEndpoints,
	/// SISU authenticate and authorize endpoints.
	Sisu,
}
impl AuthStage {
	/// Returns a stable label suitable for logs, spans, and errors.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthStage::OAuth => "oauth",
			AuthStage::UserToken => "user_token",
			AuthStage::ServiceToken => "service_token",
			AuthStage::DeviceToken => "device_token",
			AuthStage::TwoFactor => "two_factor",
			AuthStage::Session => "session",
			AuthStage::TitleEndpoints => "title_endpoints",
			AuthStage::Sisu => "sisu",
		}
	}
}
impl Display for AuthStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Strategy hook that classifies failed responses.
///
/// Implementors must be `Send + Sync`; the context holds only primitive data so strategies
/// never depend on reqwest-specific structures.
pub trait ProviderStrategy: Send + Sync {
	/// Maps a failed response into the crate taxonomy.
	fn classify(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical error categories produced by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Credentials or grant were rejected; surfaced as an authentication failure.
	Rejected,
	/// The account cannot use the service; terminal.
	Ineligible,
	/// Failure is temporary and may be retried by the caller.
	Transient,
	/// Any other HTTP failure; surfaced with its status preserved.
	Status,
}

/// Context passed to strategies when classifying a failed response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Stage that issued the request.
	pub stage: AuthStage,
	/// HTTP status code, when a response was received.
	pub http_status: Option<u16>,
	/// OAuth `error` field.
	pub oauth_error: Option<String>,
	/// OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Decoded `XErr` code from Xbox Live error bodies.
	pub xerr: Option<u64>,
	/// Preview of the response body.
	pub body_preview: Option<String>,
	/// Whether the failure came from the network layer.
	pub network_error: bool,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to `stage`.
	pub fn new(stage: AuthStage) -> Self {
		Self {
			stage,
			http_status: None,
			oauth_error: None,
			error_description: None,
			xerr: None,
			body_preview: None,
			network_error: false,
		}
	}

	/// Convenience constructor for transport-level failures.
	pub fn network_failure(stage: AuthStage) -> Self {
		Self { network_error: true, ..Self::new(stage) }
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description`.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds an `XErr` code.
	pub fn with_xerr(mut self, xerr: u64) -> Self {
		self.xerr = Some(xerr);

		self
	}

	/// Adds a truncated body preview.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}

	/// Best human-readable reason available in the context.
	pub fn reason(&self) -> String {
		if let Some(reason) = self.xerr.and_then(xerr_reason) {
			return reason.into();
		}

		self.error_description
			.clone()
			.or_else(|| self.oauth_error.clone())
			.or_else(|| self.body_preview.clone().filter(|body| !body.trim().is_empty()))
			.or_else(|| self.http_status.map(|status| format!("HTTP status {status}")))
			.unwrap_or_else(|| "no response details".into())
	}
}

/// `XErr` error body returned by the XSTS endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XErrBody {
	/// Numeric error code.
	#[serde(rename = "XErr")]
	pub xerr: Option<u64>,
	/// Service message.
	#[serde(default)]
	pub message: Option<String>,
	/// URL the user can visit to resolve the problem.
	#[serde(default)]
	pub redirect: Option<String>,
}

/// Readable explanation for known `XErr` codes.
pub fn xerr_reason(code: u64) -> Option<&'static str> {
	match code {
		2_148_916_233 => Some("the account has no Xbox profile; sign up first"),
		2_148_916_235 => Some("the account is from a country where Xbox Live is not available"),
		2_148_916_236 | 2_148_916_237 =>
			Some("the account needs adult verification on the Xbox homepage"),
		2_148_916_238 => Some("the account is a child account and must be added to a family"),
		_ => None,
	}
}

/// Default strategy for the Xbox Live service.
///
/// Network failures, 429, 5xx and OAuth `temporarily_unavailable` are transient. A 401 from
/// XSTS is the terminal ineligible-account signal. OAuth grant and client errors are rejected
/// credentials. Everything else keeps its HTTP status.
#[derive(Debug, Default)]
pub struct XboxLiveStrategy;
impl Display for XboxLiveStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("xbox-live-strategy")
	}
}
impl ProviderStrategy for XboxLiveStrategy {
	fn classify(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}
		if ctx.stage == AuthStage::ServiceToken && ctx.http_status == Some(401) {
			return ProviderErrorKind::Ineligible;
		}
		if let Some(kind) = ctx.oauth_error.as_deref().and_then(classify_oauth_error) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn classify_oauth_error(value: &str) -> Option<ProviderErrorKind> {
	match value.to_ascii_lowercase().as_str() {
		"invalid_grant" | "access_denied" | "invalid_client" | "unauthorized_client" =>
			Some(ProviderErrorKind::Rejected),
		"temporarily_unavailable" | "server_error" => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(429) => ProviderErrorKind::Transient,
		Some(code) if code >= 500 => ProviderErrorKind::Transient,
		Some(_) => ProviderErrorKind::Status,
		None => ProviderErrorKind::Transient,
	}
}
