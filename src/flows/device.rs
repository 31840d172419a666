//! Proof-of-possession device token (XAD).

// self
use crate::{
	_prelude::*,
	auth::{DeviceId, DeviceToken, XboxToken},
	error::ConfigError,
	ext::RequestSignerExt,
	flows::{
		AuthenticationManager,
		common::{self, CONTRACT_VERSION, XboxAuthRequest},
		sisu::CORRELATION_HEADER,
	},
	http::AuthHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::AuthStage,
	signing::ProofKey,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DeviceTokenProperties<'a> {
	auth_method: &'a str,
	id: String,
	device_type: &'a str,
	version: &'a str,
	proof_key: ProofKey,
}

impl<C, M> AuthenticationManager<C, M>
where
	C: ?Sized + AuthHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Requests a device token for `device_id`, proving possession of the signer's key.
	///
	/// The request carries the signer's public key as `ProofKey` and is always signed. Fails
	/// with [`ConfigError::MissingSigner`] when no signer is attached.
	pub async fn request_device_token(&self, device_id: &DeviceId) -> Result<Arc<DeviceToken>> {
		const KIND: FlowKind = FlowKind::DeviceToken;

		let span = FlowSpan::new(KIND, "request_device_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let signer = self.signer().cloned().ok_or(ConfigError::MissingSigner)?;
				let profile = &self.descriptor.device_profile;
				let properties = DeviceTokenProperties {
					auth_method: "ProofOfPossession",
					id: device_id.format_for(&profile.device_type),
					device_type: &profile.device_type,
					version: &profile.version,
					proof_key: signer.proof_field(),
				};
				let body = XboxAuthRequest::jwt(&self.descriptor.relying_parties.device, properties);
				let cv = self.correlation_vector().value();
				let request = common::json_request(
					&self.descriptor.endpoints.device_authenticate,
					&body,
					&[CONTRACT_VERSION, (CORRELATION_HEADER, cv.as_str())],
				)?;
				let request = signer.sign_request(request)?;
				let response =
					self.exchange().send_checked(AuthStage::DeviceToken, request).await?;
				let token = Arc::new(DeviceToken(common::parse_json::<XboxToken>(
					AuthStage::DeviceToken,
					&response,
				)?));

				self.update_chain(|chain| chain.device = Some(token.clone()));

				Ok(token)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
