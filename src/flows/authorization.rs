//! Interactive sign-in: authorization URL, code exchange, and the user/service token steps.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{OAuth2Token, ServiceToken, UserToken, XboxToken},
	flows::{
		AuthenticationManager,
		common::{self, CONTRACT_VERSION, XboxAuthRequest},
	},
	http::AuthHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::AuthStage,
	two_factor::RedirectTokens,
};

const STATE_LEN: usize = 32;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct UserTokenProperties<'a> {
	auth_method: &'a str,
	site_name: &'a str,
	rps_ticket: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ServiceTokenProperties<'a> {
	user_tokens: [&'a str; 1],
	sandbox_id: &'a str,
}

impl<C, M> AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Random alphanumeric value for the `state` parameter of the authorization URL.
	pub fn generate_state() -> String {
		rand::rng().sample_iter(&Alphanumeric).take(STATE_LEN).map(char::from).collect()
	}

	/// Builds the interactive sign-in URL. No request is sent.
	pub fn generate_authorization_url(&self, state: Option<&str>) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();

		{
			let mut query = url.query_pairs_mut();

			query
				.append_pair("client_id", &self.client_id)
				.append_pair("response_type", "code")
				.append_pair("approval_prompt", "auto")
				.append_pair("scope", &self.scope.normalized())
				.append_pair("redirect_uri", self.redirect_uri.as_str());

			if let Some(state) = state {
				query.append_pair("state", state);
			}
		}

		url
	}

	/// Exchanges `authorization_code` and derives the user and service tokens from it.
	///
	/// The three steps run strictly in order; the first failure aborts the chain.
	pub async fn request_tokens(&self, authorization_code: &str) -> Result<()> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "request_tokens");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let facade = self.facade()?;
				let oauth = facade
					.exchange_authorization_code(
						self.exchange().strategy.as_ref(),
						authorization_code,
						&self.scope,
						&self.redirect_uri,
					)
					.await?;

				self.adopt_oauth_token(oauth).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Adopts the token pair of a finished redirect login (such as the second-factor flow)
	/// and derives the user and service tokens from it.
	pub async fn complete_login(&self, tokens: RedirectTokens) -> Result<()> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "complete_login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let oauth =
					tokens.into_oauth2_token(self.scope.clone(), OffsetDateTime::now_utc())?;

				self.adopt_oauth_token(oauth).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn adopt_oauth_token(&self, oauth: OAuth2Token) -> Result<()> {
		let oauth = Arc::new(oauth);

		self.update_chain(|chain| chain.oauth = Some(oauth.clone()));

		let user = Arc::new(self.request_user_token(&oauth).await?);

		self.update_chain(|chain| chain.user = Some(user.clone()));

		let service = self.request_service_token(&user).await?;

		self.update_chain(|chain| {
			chain.service = Some(Arc::new(service));
			chain.invalidated = false;
		});

		Ok(())
	}

	/// Requests a user token (XAU) using the OAuth access token as the RPS ticket.
	pub(crate) async fn request_user_token(&self, oauth: &OAuth2Token) -> Result<UserToken> {
		let properties = UserTokenProperties {
			auth_method: "RPS",
			site_name: &self.descriptor.site_name,
			rps_ticket: format!("d={}", oauth.access_token.expose()),
		};
		let body = XboxAuthRequest::jwt(&self.descriptor.relying_parties.user, properties);
		let request = common::json_request(
			&self.descriptor.endpoints.user_authenticate,
			&body,
			&[CONTRACT_VERSION],
		)?;
		let response = self.exchange().send_checked(AuthStage::UserToken, request).await?;

		common::parse_json::<XboxToken>(AuthStage::UserToken, &response).map(UserToken)
	}

	/// Requests a service token (XSTS) for `user`.
	///
	/// A 401 marks the chain as holding invalid credentials: the account cannot use the
	/// service, so refreshing is pointless until a new sign-in succeeds.
	pub(crate) async fn request_service_token(&self, user: &UserToken) -> Result<ServiceToken> {
		let properties = ServiceTokenProperties {
			user_tokens: [user.token.expose()],
			sandbox_id: &self.descriptor.sandbox_id,
		};
		let body = XboxAuthRequest::jwt(&self.descriptor.relying_parties.service, properties);
		let request = common::json_request(
			&self.descriptor.endpoints.xsts_authorize,
			&body,
			&[CONTRACT_VERSION],
		)?;
		let response = match self.exchange().send_checked(AuthStage::ServiceToken, request).await {
			Ok(response) => response,
			Err(err) => {
				if matches!(err, Error::IneligibleAccount { .. }) {
					crate::obs::log_warn!("service token request rejected the account: {err}");

					self.update_chain(|chain| {
						chain.service = None;
						chain.invalidated = true;
					});
				}

				return Err(err);
			},
		};

		common::parse_json::<XboxToken>(AuthStage::ServiceToken, &response).map(ServiceToken)
	}
}
