// self
use crate::{
	_prelude::*,
	provider::{DeviceProfile, RelyingParties, XboxLiveDescriptor, XboxLiveEndpoints},
};

const AUTHORIZATION_ENDPOINT: &str = "https://login.live.com/oauth20_authorize.srf";
const TOKEN_ENDPOINT: &str = "https://login.live.com/oauth20_token.srf";
const USER_AUTHENTICATE_ENDPOINT: &str = "https://user.auth.xboxlive.com/user/authenticate";
const DEVICE_AUTHENTICATE_ENDPOINT: &str = "https://device.auth.xboxlive.com/device/authenticate";
const XSTS_AUTHORIZE_ENDPOINT: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
const ONE_TIME_CODE_ENDPOINT: &str = "https://login.live.com/pp1600/GetOneTimeCode.srf";
const SESSION_STATE_ENDPOINT: &str = "https://login.live.com/GetSessionState.srf";
const TITLE_ENDPOINTS_ENDPOINT: &str = "https://title.mgt.xboxlive.com/titles/default/endpoints";
const SISU_AUTHENTICATE_ENDPOINT: &str = "https://sisu.xboxlive.com/authenticate";
const SISU_AUTHORIZE_ENDPOINT: &str = "https://sisu.xboxlive.com/authorize";

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum XboxLiveDescriptorError {
	/// A built-in or overridden endpoint is not a valid URL.
	#[error("The {endpoint} endpoint is not a valid URL: {source}.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoint cannot carry requests (`data:` URLs, missing host).
	#[error("The {endpoint} endpoint has no host: {url}.")]
	MissingHost {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A relying party, sandbox, or profile field is empty.
	#[error("Descriptor field {field} cannot be empty.")]
	EmptyField {
		/// Offending field.
		field: &'static str,
	},
}

/// Builder for [`XboxLiveDescriptor`] values.
///
/// Every endpoint defaults to the production service; overrides exist so tests and proxies can
/// aim the crate at another host.
#[derive(Debug, Default)]
pub struct XboxLiveDescriptorBuilder {
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	user_authenticate_endpoint: Option<Url>,
	device_authenticate_endpoint: Option<Url>,
	xsts_authorize_endpoint: Option<Url>,
	one_time_code_endpoint: Option<Url>,
	session_state_endpoint: Option<Url>,
	title_endpoints_endpoint: Option<Url>,
	sisu_authenticate_endpoint: Option<Url>,
	sisu_authorize_endpoint: Option<Url>,
	relying_parties: Option<RelyingParties>,
	sandbox_id: Option<String>,
	site_name: Option<String>,
	device_profile: Option<DeviceProfile>,
}
impl XboxLiveDescriptorBuilder {
	/// Overrides the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the user token endpoint.
	pub fn user_authenticate_endpoint(mut self, url: Url) -> Self {
		self.user_authenticate_endpoint = Some(url);

		self
	}

	/// Overrides the device token endpoint.
	pub fn device_authenticate_endpoint(mut self, url: Url) -> Self {
		self.device_authenticate_endpoint = Some(url);

		self
	}

	/// Overrides the XSTS endpoint.
	pub fn xsts_authorize_endpoint(mut self, url: Url) -> Self {
		self.xsts_authorize_endpoint = Some(url);

		self
	}

	/// Overrides the one-time-code endpoint.
	pub fn one_time_code_endpoint(mut self, url: Url) -> Self {
		self.one_time_code_endpoint = Some(url);

		self
	}

	/// Overrides the push polling endpoint.
	pub fn session_state_endpoint(mut self, url: Url) -> Self {
		self.session_state_endpoint = Some(url);

		self
	}

	/// Overrides the title endpoint catalogue.
	pub fn title_endpoints_endpoint(mut self, url: Url) -> Self {
		self.title_endpoints_endpoint = Some(url);

		self
	}

	/// Overrides the SISU authenticate endpoint.
	pub fn sisu_authenticate_endpoint(mut self, url: Url) -> Self {
		self.sisu_authenticate_endpoint = Some(url);

		self
	}

	/// Overrides the SISU authorize endpoint.
	pub fn sisu_authorize_endpoint(mut self, url: Url) -> Self {
		self.sisu_authorize_endpoint = Some(url);

		self
	}

	/// Points every endpoint at `base`, keeping each production path.
	pub fn base_url(self, base: &Url) -> Result<Self, XboxLiveDescriptorError> {
		let rebase = |endpoint: &'static str, default: &str| {
			let path = parse(endpoint, default)?;

			base.join(path.path())
				.map_err(|source| XboxLiveDescriptorError::InvalidEndpoint { endpoint, source })
		};

		Ok(self
			.authorization_endpoint(rebase("authorization", AUTHORIZATION_ENDPOINT)?)
			.token_endpoint(rebase("token", TOKEN_ENDPOINT)?)
			.user_authenticate_endpoint(rebase("user_authenticate", USER_AUTHENTICATE_ENDPOINT)?)
			.device_authenticate_endpoint(rebase(
				"device_authenticate",
				DEVICE_AUTHENTICATE_ENDPOINT,
			)?)
			.xsts_authorize_endpoint(rebase("xsts_authorize", XSTS_AUTHORIZE_ENDPOINT)?)
			.one_time_code_endpoint(rebase("one_time_code", ONE_TIME_CODE_ENDPOINT)?)
			.session_state_endpoint(rebase("session_state", SESSION_STATE_ENDPOINT)?)
			.title_endpoints_endpoint(rebase("title_endpoints", TITLE_ENDPOINTS_ENDPOINT)?)
			.sisu_authenticate_endpoint(rebase("sisu_authenticate", SISU_AUTHENTICATE_ENDPOINT)?)
			.sisu_authorize_endpoint(rebase("sisu_authorize", SISU_AUTHORIZE_ENDPOINT)?))
	}

	/// Overrides the relying parties.
	pub fn relying_parties(mut self, relying_parties: RelyingParties) -> Self {
		self.relying_parties = Some(relying_parties);

		self
	}

	/// Overrides the XSTS sandbox.
	pub fn sandbox_id(mut self, sandbox_id: impl Into<String>) -> Self {
		self.sandbox_id = Some(sandbox_id.into());

		self
	}

	/// Overrides the user token `SiteName`.
	pub fn site_name(mut self, site_name: impl Into<String>) -> Self {
		self.site_name = Some(site_name.into());

		self
	}

	/// Overrides the device profile.
	pub fn device_profile(mut self, profile: DeviceProfile) -> Self {
		self.device_profile = Some(profile);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<XboxLiveDescriptor, XboxLiveDescriptorError> {
		let endpoint = |value: Option<Url>, name: &'static str, default: &str| match value {
			Some(url) => Ok(url),
			None => parse(name, default),
		};
		let endpoints = XboxLiveEndpoints {
			authorization: endpoint(
				self.authorization_endpoint,
				"authorization",
				AUTHORIZATION_ENDPOINT,
			)?,
			token: endpoint(self.token_endpoint, "token", TOKEN_ENDPOINT)?,
			user_authenticate: endpoint(
				self.user_authenticate_endpoint,
				"user_authenticate",
				USER_AUTHENTICATE_ENDPOINT,
			)?,
			device_authenticate: endpoint(
				self.device_authenticate_endpoint,
				"device_authenticate",
				DEVICE_AUTHENTICATE_ENDPOINT,
			)?,
			xsts_authorize: endpoint(
				self.xsts_authorize_endpoint,
				"xsts_authorize",
				XSTS_AUTHORIZE_ENDPOINT,
			)?,
			one_time_code: endpoint(
				self.one_time_code_endpoint,
				"one_time_code",
				ONE_TIME_CODE_ENDPOINT,
			)?,
			session_state: endpoint(
				self.session_state_endpoint,
				"session_state",
				SESSION_STATE_ENDPOINT,
			)?,
			title_endpoints: endpoint(
				self.title_endpoints_endpoint,
				"title_endpoints",
				TITLE_ENDPOINTS_ENDPOINT,
			)?,
			sisu_authenticate: endpoint(
				self.sisu_authenticate_endpoint,
				"sisu_authenticate",
				SISU_AUTHENTICATE_ENDPOINT,
			)?,
			sisu_authorize: endpoint(
				self.sisu_authorize_endpoint,
				"sisu_authorize",
				SISU_AUTHORIZE_ENDPOINT,
			)?,
		};
		let descriptor = XboxLiveDescriptor {
			endpoints,
			relying_parties: self.relying_parties.unwrap_or_default(),
			sandbox_id: self.sandbox_id.unwrap_or_else(|| "RETAIL".into()),
			site_name: self.site_name.unwrap_or_else(|| "user.auth.xboxlive.com".into()),
			device_profile: self.device_profile.unwrap_or_default(),
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl XboxLiveDescriptor {
	fn validate(&self) -> Result<(), XboxLiveDescriptorError> {
		let endpoints = &self.endpoints;

		for (name, url) in [
			("authorization", &endpoints.authorization),
			("token", &endpoints.token),
			("user_authenticate", &endpoints.user_authenticate),
			("device_authenticate", &endpoints.device_authenticate),
			("xsts_authorize", &endpoints.xsts_authorize),
			("one_time_code", &endpoints.one_time_code),
			("session_state", &endpoints.session_state),
			("title_endpoints", &endpoints.title_endpoints),
			("sisu_authenticate", &endpoints.sisu_authenticate),
			("sisu_authorize", &endpoints.sisu_authorize),
		] {
			validate_endpoint(name, url)?;
		}
		for (field, value) in [
			("relying_parties.user", &self.relying_parties.user),
			("relying_parties.device", &self.relying_parties.device),
			("relying_parties.service", &self.relying_parties.service),
			("sandbox_id", &self.sandbox_id),
			("site_name", &self.site_name),
			("device_profile.device_type", &self.device_profile.device_type),
			("device_profile.version", &self.device_profile.version),
			("device_profile.query_display", &self.device_profile.query_display),
		] {
			if value.trim().is_empty() {
				return Err(XboxLiveDescriptorError::EmptyField { field });
			}
		}

		Ok(())
	}
}

fn parse(endpoint: &'static str, value: &str) -> Result<Url, XboxLiveDescriptorError> {
	Url::parse(value).map_err(|source| XboxLiveDescriptorError::InvalidEndpoint { endpoint, source })
}

fn validate_endpoint(endpoint: &'static str, url: &Url) -> Result<(), XboxLiveDescriptorError> {
	if url.host_str().is_none_or(str::is_empty) {
		Err(XboxLiveDescriptorError::MissingHost { endpoint, url: url.to_string() })
	} else {
		Ok(())
	}
}
