//! Display claims attached to Xbox Live tokens.

// self
use crate::_prelude::*;

/// `DisplayClaims` block returned alongside user, device, and XSTS tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayClaims {
	/// One entry per authorized identity (`xui`).
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub xui: Vec<XboxUserInfo>,
	/// Device claims (`xdi`), only present on device tokens.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xdi: Option<DeviceClaims>,
	/// Title claims (`xti`), only present on title tokens.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xti: Option<TitleClaims>,
}
impl DisplayClaims {
	/// Builds a claim set holding a single identity.
	pub fn for_user(info: XboxUserInfo) -> Self {
		Self { xui: vec![info], ..Default::default() }
	}

	/// First identity in the claim set, which is the one every caller cares about.
	pub fn primary(&self) -> Option<&XboxUserInfo> {
		self.xui.first()
	}
}

/// Per-identity claims (`xui` entry). The user token only fills `uhs`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XboxUserInfo {
	/// Numeric Xbox user id.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xid: Option<String>,
	/// User hash used in the `XBL3.0` authorization header.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uhs: Option<String>,
	/// Gamertag.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub gtg: Option<String>,
	/// Age group (`Adult`, `Teen`, `Child`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub agg: Option<String>,
	/// Space-separated title privileges.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub prv: Option<String>,
	/// Space-separated user privileges.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub usr: Option<String>,
}

/// Device claims (`xdi`) returned by the device endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceClaims {
	/// Device id as seen by the service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub did: Option<String>,
	/// Device console serial/class marker.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub dcs: Option<String>,
}

/// Title claims (`xti`) returned by the SISU authorize endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleClaims {
	/// Title id the token was issued for.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub tid: Option<String>,
}
