//! Endpoint and identity metadata for the Windows Live and Xbox Live services.

/// Builder API for assembling descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Endpoint set used by the token chain and the two-factor sub-flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XboxLiveEndpoints {
	/// Interactive Windows Live authorization page.
	pub authorization: Url,
	/// Windows Live token endpoint for code exchanges and refreshes.
	pub token: Url,
	/// XAU user token endpoint.
	pub user_authenticate: Url,
	/// XAD device token endpoint.
	pub device_authenticate: Url,
	/// XSTS authorization endpoint.
	pub xsts_authorize: Url,
	/// One-time-code dispatch endpoint of the two-factor sub-flow.
	pub one_time_code: Url,
	/// Push approval polling endpoint.
	pub session_state: Url,
	/// Title endpoint catalogue used by XAL clients.
	pub title_endpoints: Url,
	/// SISU session start endpoint.
	pub sisu_authenticate: Url,
	/// SISU token issuance endpoint.
	pub sisu_authorize: Url,
}

/// Relying parties requested at each chain step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelyingParties {
	/// Audience of the user token.
	pub user: String,
	/// Audience of the device token.
	pub device: String,
	/// Audience of the service token.
	pub service: String,
}
impl Default for RelyingParties {
	fn default() -> Self {
		Self {
			user: "http://auth.xboxlive.com".into(),
			device: "http://auth.xboxlive.com".into(),
			service: "http://xboxlive.com".into(),
		}
	}
}

/// Device type and client version reported by the device token request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
	/// `DeviceType` property (`Android`, `iOS`, `Win32`, ...).
	pub device_type: String,
	/// `Version` property.
	pub version: String,
	/// `display` query value the SISU login page is rendered for.
	pub query_display: String,
}
impl DeviceProfile {
	/// Profile of the XAL Android client.
	pub fn android() -> Self {
		Self {
			device_type: "Android".into(),
			version: "8.0.0".into(),
			query_display: "android_phone".into(),
		}
	}

	/// Profile of the XAL iOS client.
	pub fn ios() -> Self {
		Self { device_type: "iOS".into(), version: "15.6.1".into(), query_display: "ios_phone".into() }
	}
}
impl Default for DeviceProfile {
	fn default() -> Self {
		Self::android()
	}
}

/// Immutable service descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct XboxLiveDescriptor {
	/// Endpoint definitions.
	pub endpoints: XboxLiveEndpoints,
	/// Relying parties per chain step.
	pub relying_parties: RelyingParties,
	/// XSTS sandbox (`RETAIL` for production).
	pub sandbox_id: String,
	/// `SiteName` property of the user token request.
	pub site_name: String,
	/// Profile used by the device token request.
	pub device_profile: DeviceProfile,
}
impl XboxLiveDescriptor {
	/// Creates a builder seeded with the production endpoints.
	pub fn builder() -> XboxLiveDescriptorBuilder {
		XboxLiveDescriptorBuilder::default()
	}

	/// Production descriptor.
	pub fn live() -> Result<Self, XboxLiveDescriptorError> {
		Self::builder().build()
	}
}
