//! XAL sign-in through the SISU endpoints, the flow the Xbox mobile apps use.
//!
//! [`start_sisu`](AuthenticationManager::start_sisu) registers the device and opens a SISU
//! session whose login page carries a PKCE challenge. Once the user has signed in,
//! [`complete_sisu`](AuthenticationManager::complete_sisu) checks the redirect, exchanges the
//! code with the verifier and lets SISU issue the user, title and service tokens in one call.
//! Every request is signed and stamped with the manager's `MS-CV` correlation vector.

pub mod correlation;
pub mod pkce;

pub use correlation::*;
pub use pkce::*;

// self
use crate::{
	_prelude::*,
	auth::{
		DeviceId, DeviceToken, OAuth2Token, ScopeSet, ServiceToken, TitleToken, Token, UserToken,
		XboxToken,
	},
	error::ConfigError,
	ext::RequestSignerExt,
	flows::{
		AuthenticationManager,
		common::{self, CONTRACT_VERSION, XboxAuthRequest},
	},
	http::AuthHttpClient,
	oauth::{self, LiveTokenResponse, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::AuthStage,
	signing::{ProofKey, RequestSigner, SigningPolicy},
};

/// Offer requested from SISU and scope of the XAL code exchange.
pub const MBI_SSL_SCOPE: &str = "service::user.auth.xboxlive.com::MBI_SSL";

const SESSION_ID_HEADER: &str = "x-sessionid";

/// Identity of an XAL application: Windows Live app id, title id and redirect URI.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XalApp {
	/// Windows Live client id of the app.
	pub app_id: String,
	/// Xbox title id of the app.
	pub title_id: String,
	/// Redirect URI the login page returns to.
	pub redirect_uri: String,
}
impl XalApp {
	/// Builds an app identity from its parts.
	pub fn new(
		app_id: impl Into<String>,
		title_id: impl Into<String>,
		redirect_uri: impl Into<String>,
	) -> Self {
		Self { app_id: app_id.into(), title_id: title_id.into(), redirect_uri: redirect_uri.into() }
	}

	/// Xbox app.
	pub fn xbox_app() -> Self {
		Self::new("000000004c12ae6f", "328178078", "ms-xal-000000004c12ae6f://auth")
	}

	/// Xbox beta app.
	pub fn xbox_beta_app() -> Self {
		Self::new("000000004415494b", "177887386", "ms-xal-000000004415494b://auth")
	}

	/// Game Pass app.
	pub fn gamepass() -> Self {
		Self::new("000000004c20a908", "1016898439", "ms-xal-000000004c20a908://auth")
	}

	/// Game Pass public beta app.
	pub fn gamepass_beta() -> Self {
		Self::new("000000004c20a908", "1016898439", "ms-xal-public-beta-000000004c20a908://auth")
	}

	/// Family Settings app.
	pub fn family_settings() -> Self {
		Self::new("00000000482C8F49", "1618633878", "https://login.live.com/oauth20_desktop.srf")
	}
}

/// Open SISU session waiting for the user to finish the login page.
#[derive(Clone, Debug)]
pub struct SisuSession {
	/// App the session was opened for.
	pub app: XalApp,
	/// Session id from the `X-SessionId` response header.
	pub session_id: String,
	/// Opaque state value that must round-trip through the redirect.
	pub state: String,
	/// Login page the user must open (`MsaOauthRedirect`).
	pub authorize_url: Url,
	pkce: PkcePair,
}
impl SisuSession {
	/// PKCE code challenge sent to SISU.
	pub fn code_challenge(&self) -> &str {
		self.pkce.challenge()
	}

	/// Validates the returned `state` parameter.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(sisu_error("authorization state mismatch"))
		}
	}

	/// Extracts the authorization code from the URL the login page redirected to.
	///
	/// The URL must start with the app's redirect URI and carry the session's state.
	pub fn authorization_code(&self, redirect: &str) -> Result<String> {
		if !redirect.starts_with(&self.app.redirect_uri) {
			return Err(sisu_error("redirect does not target the app redirect URI"));
		}

		let url = Url::parse(redirect)
			.map_err(|e| sisu_error(format!("redirect is not a valid URL: {e}")))?;
		let param = |name: &str| {
			url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
		};

		if let Some(error) = param("error") {
			return Err(Error::Authentication {
				stage: AuthStage::OAuth,
				reason: param("error_description").unwrap_or(error),
			});
		}

		let state = param("state").ok_or_else(|| sisu_error("redirect carries no state"))?;

		self.validate_state(&state)?;

		param("code").ok_or_else(|| sisu_error("redirect carries no authorization code"))
	}
}

/// Tokens issued by a SISU authorization.
#[derive(Clone, Debug)]
pub struct SisuAuthorization {
	/// SISU session the tokens belong to; reused by [`AuthenticationManager::refresh_sisu`].
	pub session_id: String,
	/// Xbox user token.
	pub user: Arc<UserToken>,
	/// Xbox title token.
	pub title: Arc<TitleToken>,
	/// XSTS token for the default relying party.
	pub service: Arc<ServiceToken>,
	/// Account page returned alongside the tokens.
	pub web_page: Option<String>,
}

/// Catalogue returned by the title endpoints service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TitleEndpoints {
	/// Hosts and the relying party each one expects.
	#[serde(default)]
	pub end_points: Vec<TitleEndpoint>,
	/// Signature policies referenced by index.
	#[serde(default)]
	pub signature_policies: Vec<TitleSignaturePolicy>,
	/// Server certificates referenced by index.
	#[serde(default)]
	pub certs: Vec<TitleEndpointCertificate>,
	/// Root certificates referenced by index.
	#[serde(default)]
	pub root_certs: Vec<String>,
}
impl TitleEndpoints {
	/// First endpoint serving `host` over `protocol`.
	pub fn find(&self, protocol: &str, host: &str) -> Option<&TitleEndpoint> {
		self.end_points
			.iter()
			.find(|endpoint| endpoint.protocol.eq_ignore_ascii_case(protocol) && endpoint.matches_host(host))
	}

	/// Signature policy `endpoint` must be signed with, if any.
	pub fn signature_policy(&self, endpoint: &TitleEndpoint) -> Option<&TitleSignaturePolicy> {
		endpoint.signature_policy_index.and_then(|index| self.signature_policies.get(index))
	}
}

/// One entry of the title endpoint catalogue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TitleEndpoint {
	/// `http` or `https`.
	pub protocol: String,
	/// Host name, or a `*.`-prefixed pattern for wildcard entries.
	pub host: String,
	/// `fqdn` or `wildcard`.
	pub host_type: String,
	/// Optional path prefix.
	#[serde(default)]
	pub path: Option<String>,
	/// XSTS relying party for the host.
	#[serde(default)]
	pub relying_party: Option<String>,
	/// Secondary relying party.
	#[serde(default)]
	pub sub_relying_party: Option<String>,
	/// Token type the host expects.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Index into [`TitleEndpoints::signature_policies`].
	#[serde(default)]
	pub signature_policy_index: Option<usize>,
	/// Indexes into [`TitleEndpoints::certs`].
	#[serde(default)]
	pub server_cert_index: Option<Vec<usize>>,
}
impl TitleEndpoint {
	/// Whether this entry serves `host`.
	pub fn matches_host(&self, host: &str) -> bool {
		if self.host_type.eq_ignore_ascii_case("wildcard") {
			let host = host.to_ascii_lowercase();

			self.host
				.strip_prefix('*')
				.is_some_and(|suffix| host.ends_with(&suffix.to_ascii_lowercase()))
		} else {
			self.host.eq_ignore_ascii_case(host)
		}
	}
}

/// Signature policy of the title endpoint catalogue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TitleSignaturePolicy {
	/// Signature version.
	pub version: u32,
	/// Accepted algorithms (`ES256`).
	#[serde(default)]
	pub supported_algorithms: Vec<String>,
	/// Number of body bytes covered by the signature.
	pub max_body_bytes: usize,
	/// Extra headers covered by the signature.
	#[serde(default)]
	pub extra_headers: Vec<String>,
}
impl TitleSignaturePolicy {
	/// Signer settings matching this policy.
	pub fn signing_policy(&self) -> SigningPolicy {
		SigningPolicy { version: self.version, max_body_bytes: self.max_body_bytes }
	}
}

/// Server certificate of the title endpoint catalogue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TitleEndpointCertificate {
	/// Certificate thumbprint.
	pub thumbprint: String,
	/// Whether the thumbprint names an issuer.
	#[serde(default)]
	pub is_issuer: Option<bool>,
	/// Index into [`TitleEndpoints::root_certs`].
	pub root_cert_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SisuAuthenticateRequest<'a> {
	app_id: &'a str,
	title_id: &'a str,
	redirect_uri: &'a str,
	device_token: &'a str,
	sandbox: &'a str,
	token_type: &'a str,
	offers: [&'a str; 1],
	query: SisuQuery<'a>,
}

#[derive(Debug, Serialize)]
struct SisuQuery<'a> {
	display: &'a str,
	code_challenge: &'a str,
	code_challenge_method: &'a str,
	state: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SisuAuthenticateResponse {
	msa_oauth_redirect: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SisuAuthorizeRequest<'a> {
	access_token: String,
	app_id: &'a str,
	device_token: &'a str,
	sandbox: &'a str,
	site_name: &'a str,
	session_id: &'a str,
	proof_key: ProofKey,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SisuAuthorizeResponse {
	title_token: XboxToken,
	user_token: XboxToken,
	authorization_token: XboxToken,
	#[serde(default)]
	web_page: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct TitleServiceProperties<'a> {
	sandbox_id: &'a str,
	device_token: &'a str,
	title_token: &'a str,
	user_tokens: [&'a str; 1],
}

impl<C, M> AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches the title endpoint catalogue.
	pub async fn get_title_endpoints(&self) -> Result<TitleEndpoints> {
		observe("get_title_endpoints", async move {
			let mut url = self.descriptor.endpoints.title_endpoints.clone();

			url.query_pairs_mut().append_pair("type", "1");

			let request = common::with_headers(common::get_request(&url)?, &[CONTRACT_VERSION])?;
			let response = self.exchange().send_checked(AuthStage::TitleEndpoints, request).await?;

			common::parse_json(AuthStage::TitleEndpoints, &response)
		})
		.await
	}

	/// Opens a SISU session for `app`.
	///
	/// Reuses a valid held device token or requests one for `device_id`, then asks SISU for the
	/// login page. Open [`SisuSession::authorize_url`] in a browser and pass the final redirect
	/// to [`complete_sisu`](Self::complete_sisu).
	pub async fn start_sisu(&self, app: XalApp, device_id: &DeviceId) -> Result<SisuSession> {
		observe("start_sisu", async move {
			let signer = self.signer().cloned().ok_or(ConfigError::MissingSigner)?;
			let device = match self.device_token().filter(|device| device.is_valid()) {
				Some(device) => device,
				None => self.request_device_token(device_id).await?,
			};
			let pkce = PkcePair::generate();
			let state = Self::generate_state();
			let body = SisuAuthenticateRequest {
				app_id: &app.app_id,
				title_id: &app.title_id,
				redirect_uri: &app.redirect_uri,
				device_token: device.token.expose(),
				sandbox: &self.descriptor.sandbox_id,
				token_type: "code",
				offers: [MBI_SSL_SCOPE],
				query: SisuQuery {
					display: &self.descriptor.device_profile.query_display,
					code_challenge: pkce.challenge(),
					code_challenge_method: pkce.method().as_str(),
					state: &state,
				},
			};
			let cv = self.correlation_vector().increment();
			let request = common::json_request(
				&self.descriptor.endpoints.sisu_authenticate,
				&body,
				&[CONTRACT_VERSION, (CORRELATION_HEADER, cv.as_str())],
			)?;
			let request = signer.sign_request(request)?;
			let response = self.exchange().send_checked(AuthStage::Sisu, request).await?;
			let session_id = response
				.headers()
				.get(SESSION_ID_HEADER)
				.and_then(|value| value.to_str().ok())
				.filter(|value| !value.is_empty())
				.map(str::to_owned)
				.ok_or_else(|| sisu_error("response carries no X-SessionId header"))?;
			let redirect =
				common::parse_json::<SisuAuthenticateResponse>(AuthStage::Sisu, &response)?;
			let authorize_url = Url::parse(&redirect.msa_oauth_redirect)
				.map_err(|e| sisu_error(format!("login page URL is invalid: {e}")))?;

			Ok(SisuSession { app, session_id, state, authorize_url, pkce })
		})
		.await
	}

	/// Finishes `session` with the URL the login page redirected to.
	///
	/// Exchanges the code with the PKCE verifier and adopts every token SISU issues.
	pub async fn complete_sisu(
		&self,
		session: SisuSession,
		redirect: &str,
	) -> Result<SisuAuthorization> {
		observe("complete_sisu", async move {
			let signer = self.signer().cloned().ok_or(ConfigError::MissingSigner)?;
			let code = session.authorization_code(redirect)?;
			let device = self.device_token().ok_or(ConfigError::MissingToken("device"))?;
			let oauth = self
				.request_xal_token(
					&session.app,
					&[
						("code", code.as_str()),
						("code_verifier", session.pkce.verifier.as_str()),
						("grant_type", "authorization_code"),
					],
					None,
				)
				.await?;

			self.sisu_authorize(&signer, &session.app, &session.session_id, &oauth, &device).await
		})
		.await
	}

	/// Refreshes the OAuth token with `app` and re-authorizes SISU session `session_id`.
	pub async fn refresh_sisu(&self, app: &XalApp, session_id: &str) -> Result<SisuAuthorization> {
		observe("refresh_sisu", async move {
			let signer = self.signer().cloned().ok_or(ConfigError::MissingSigner)?;
			let refresh = self
				.oauth_token()
				.and_then(|oauth| oauth.refresh_token.clone())
				.filter(|secret| !secret.is_blank())
				.ok_or(ConfigError::MissingRefreshToken)?;
			let device = self.device_token().ok_or(ConfigError::MissingToken("device"))?;
			let oauth = self
				.request_xal_token(
					app,
					&[("refresh_token", refresh.expose()), ("grant_type", "refresh_token")],
					Some(refresh.expose()),
				)
				.await?;

			self.sisu_authorize(&signer, app, session_id, &oauth, &device).await
		})
		.await
	}

	/// Requests an XSTS token for `relying_party` from the held device, title and user tokens.
	///
	/// The token is returned to the caller and not stored in the chain.
	pub async fn xsts_authorize_for(&self, relying_party: &str) -> Result<ServiceToken> {
		observe("xsts_authorize_for", async move {
			let signer = self.signer().cloned().ok_or(ConfigError::MissingSigner)?;
			let chain = self.chain();
			let device = chain.device.ok_or(ConfigError::MissingToken("device"))?;
			let title = chain.title.ok_or(ConfigError::MissingToken("title"))?;
			let user = chain.user.ok_or(ConfigError::MissingToken("user"))?;
			let body = XboxAuthRequest::jwt(
				relying_party,
				TitleServiceProperties {
					sandbox_id: &self.descriptor.sandbox_id,
					device_token: device.token.expose(),
					title_token: title.token.expose(),
					user_tokens: [user.token.expose()],
				},
			);
			let cv = self.correlation_vector().increment();
			let request = common::json_request(
				&self.descriptor.endpoints.xsts_authorize,
				&body,
				&[CONTRACT_VERSION, (CORRELATION_HEADER, cv.as_str())],
			)?;
			let request = signer.sign_request(request)?;
			let response = self.exchange().send_checked(AuthStage::ServiceToken, request).await?;

			Ok(ServiceToken(common::parse_json(AuthStage::ServiceToken, &response)?))
		})
		.await
	}

	async fn request_xal_token(
		&self,
		app: &XalApp,
		grant: &[(&str, &str)],
		previous_refresh: Option<&str>,
	) -> Result<Arc<OAuth2Token>> {
		let scope = ScopeSet::new([MBI_SSL_SCOPE]).map_err(ConfigError::from)?;
		let mut pairs = vec![("client_id", app.app_id.as_str())];

		pairs.extend_from_slice(grant);
		pairs.push(("redirect_uri", app.redirect_uri.as_str()));
		pairs.push(("scope", MBI_SSL_SCOPE));

		let cv = self.correlation_vector().increment();
		let request = common::with_headers(
			common::form_request(&self.descriptor.endpoints.token, &pairs)?,
			&[(CORRELATION_HEADER, cv.as_str())],
		)?;
		let response = self.exchange().send_checked(AuthStage::OAuth, request).await?;
		let response = common::parse_json::<LiveTokenResponse>(AuthStage::OAuth, &response)?;
		let oauth = Arc::new(oauth::map_token_response(&scope, response, previous_refresh)?);

		self.update_chain(|chain| chain.oauth = Some(oauth.clone()));

		Ok(oauth)
	}

	async fn sisu_authorize(
		&self,
		signer: &RequestSigner,
		app: &XalApp,
		session_id: &str,
		oauth: &OAuth2Token,
		device: &DeviceToken,
	) -> Result<SisuAuthorization> {
		let body = SisuAuthorizeRequest {
			access_token: format!("t={}", oauth.access_token.expose()),
			app_id: &app.app_id,
			device_token: device.token.expose(),
			sandbox: &self.descriptor.sandbox_id,
			site_name: &self.descriptor.site_name,
			session_id,
			proof_key: signer.proof_field(),
		};
		let cv = self.correlation_vector().increment();
		let request = common::json_request(
			&self.descriptor.endpoints.sisu_authorize,
			&body,
			&[(CORRELATION_HEADER, cv.as_str())],
		)?;
		let request = signer.sign_request(request)?;
		let response = self.exchange().send_checked(AuthStage::Sisu, request).await?;
		let issued = common::parse_json::<SisuAuthorizeResponse>(AuthStage::Sisu, &response)?;
		let user = Arc::new(UserToken(issued.user_token));
		let title = Arc::new(TitleToken(issued.title_token));
		let service = Arc::new(ServiceToken(issued.authorization_token));

		self.update_chain(|chain| {
			chain.user = Some(user.clone());
			chain.title = Some(title.clone());
			chain.service = Some(service.clone());
			chain.invalidated = false;
		});

		Ok(SisuAuthorization {
			session_id: session_id.to_owned(),
			user,
			title,
			service,
			web_page: issued.web_page,
		})
	}
}

async fn observe<T, F>(stage: &'static str, flow: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	const KIND: FlowKind = FlowKind::Sisu;

	let span = FlowSpan::new(KIND, stage);

	obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

	let result = span.instrument(flow).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
		Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
	}

	result
}

fn sisu_error(reason: impl Into<String>) -> Error {
	Error::Authentication { stage: AuthStage::Sisu, reason: reason.into() }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session() -> SisuSession {
		SisuSession {
			app: XalApp::xbox_app(),
			session_id: "session".into(),
			state: "expected".into(),
			authorize_url: Url::parse("https://login.live.com/oauth20_authorize.srf")
				.expect("Login page fixture should parse."),
			pkce: PkcePair::generate(),
		}
	}

	#[test]
	fn redirect_yields_code_when_state_matches() {
		let code = session()
			.authorization_code("ms-xal-000000004c12ae6f://auth?code=M.C123&state=expected")
			.expect("Matching redirect should yield the code.");

		assert_eq!(code, "M.C123");
	}

	#[test]
	fn redirect_checks_target_and_state() {
		let session = session();
		let err = session
			.authorization_code("https://example.com/?code=M.C123&state=expected")
			.expect_err("Foreign redirect should be rejected.");

		assert!(matches!(err, Error::Authentication { stage: AuthStage::Sisu, .. }));

		let err = session
			.authorization_code("ms-xal-000000004c12ae6f://auth?code=M.C123&state=forged")
			.expect_err("Forged state should be rejected.");

		assert!(
			matches!(err, Error::Authentication { stage: AuthStage::Sisu, ref reason } if reason.contains("state"))
		);

		let err = session
			.authorization_code(
				"ms-xal-000000004c12ae6f://auth?error=access_denied&error_description=The+user+declined",
			)
			.expect_err("Declined login should be rejected.");

		assert!(
			matches!(err, Error::Authentication { stage: AuthStage::OAuth, ref reason } if reason == "The user declined")
		);
	}

	#[test]
	fn session_debug_hides_the_verifier() {
		let session = session();

		assert!(!format!("{session:?}").contains(&session.pkce.verifier));
	}

	#[test]
	fn presets_match_published_apps() {
		assert_eq!(XalApp::xbox_app().title_id, "328178078");
		assert_eq!(XalApp::gamepass_beta().app_id, XalApp::gamepass().app_id);
		assert_ne!(XalApp::gamepass_beta().redirect_uri, XalApp::gamepass().redirect_uri);
		assert_eq!(XalApp::family_settings().redirect_uri, "https://login.live.com/oauth20_desktop.srf");
	}

	#[test]
	fn authenticate_body_uses_service_field_names() {
		let app = XalApp::xbox_app();
		let pkce = PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
		let body = SisuAuthenticateRequest {
			app_id: &app.app_id,
			title_id: &app.title_id,
			redirect_uri: &app.redirect_uri,
			device_token: "device",
			sandbox: "RETAIL",
			token_type: "code",
			offers: [MBI_SSL_SCOPE],
			query: SisuQuery {
				display: "android_phone",
				code_challenge: pkce.challenge(),
				code_challenge_method: pkce.method().as_str(),
				state: "state",
			},
		};
		let value = serde_json::to_value(&body).expect("Body should serialize.");

		assert_eq!(value["AppId"], "000000004c12ae6f");
		assert_eq!(value["TitleId"], "328178078");
		assert_eq!(value["Offers"][0], MBI_SSL_SCOPE);
		assert_eq!(value["Query"]["code_challenge"], "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
		assert_eq!(value["Query"]["code_challenge_method"], "S256");
		assert_eq!(value["Query"]["display"], "android_phone");
	}

	#[test]
	fn title_endpoints_resolve_hosts_and_policies() {
		let catalogue: TitleEndpoints = serde_json::from_str(
			r#"{
				"EndPoints": [
					{"Protocol": "https", "Host": "xboxlive.com", "HostType": "fqdn", "RelyingParty": "http://xboxlive.com", "TokenType": "JWT", "SignaturePolicyIndex": 0},
					{"Protocol": "https", "Host": "*.xboxlive.com", "HostType": "wildcard", "RelyingParty": "http://xboxlive.com", "TokenType": "JWT", "SignaturePolicyIndex": 0, "ServerCertIndex": [0]}
				],
				"SignaturePolicies": [{"Version": 1, "SupportedAlgorithms": ["ES256"], "MaxBodyBytes": 8192}],
				"Certs": [{"Thumbprint": "54D9D20239080C32316ED9FF980A48988F4ADF2D", "IsIssuer": true, "RootCertIndex": 0}],
				"RootCerts": ["MIIF7TCCA9WgAwIBAgIQP4vItfyfspZDtWnWbELhRDANBgkqhkiG9w0BAQsFADCB"]
			}"#,
		)
		.expect("Title endpoint catalogue should deserialize.");
		let endpoint = catalogue
			.find("https", "profile.xboxlive.com")
			.expect("Wildcard entry should serve subdomains.");

		assert_eq!(endpoint.host_type, "wildcard");
		assert_eq!(endpoint.relying_party.as_deref(), Some("http://xboxlive.com"));
		assert_eq!(
			catalogue.signature_policy(endpoint).map(TitleSignaturePolicy::signing_policy),
			Some(SigningPolicy::default())
		);
		assert!(catalogue.find("http", "profile.xboxlive.com").is_none());
		assert!(catalogue.find("https", "example.com").is_none());
	}
}
