#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
// self
use xbl_auth::{
	flows::ReqwestAuthenticationManager,
	provider::{XboxLiveDescriptor, XboxLiveStrategy},
	signing::RequestSigner,
	url::Url,
};

pub const CLIENT_ID: &str = "0000000048093EE3";
pub const REDIRECT_URI: &str = "https://login.live.com/oauth20_desktop.srf";
pub const USERHASH: &str = "abcdefg";
pub const TEST_SIGNING_KEY: &str = include_str!("../data/test_signing_key.pem");

pub fn descriptor(server: &MockServer) -> XboxLiveDescriptor {
	let base = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	XboxLiveDescriptor::builder()
		.base_url(&base)
		.expect("Descriptor endpoints should rebase onto the mock server.")
		.build()
		.expect("Descriptor should build for the mock server.")
}

pub fn manager(server: &MockServer) -> ReqwestAuthenticationManager {
	ReqwestAuthenticationManager::new(
		descriptor(server),
		Arc::new(XboxLiveStrategy),
		CLIENT_ID,
		Url::parse(REDIRECT_URI).expect("Redirect URI fixture should parse."),
	)
	.expect("Manager should build with the default transport.")
}

pub fn test_signer() -> RequestSigner {
	RequestSigner::from_pem(TEST_SIGNING_KEY).expect("Test signing key should load.")
}

pub fn oauth_body(access: &str, refresh: &str, expires_in: i64) -> String {
	json!({
		"token_type": "bearer",
		"expires_in": expires_in,
		"access_token": access,
		"refresh_token": refresh,
		"user_id": "a1b2c3d4e5f6",
	})
	.to_string()
}

/// Xbox token response issued now and expiring after `lifetime`.
pub fn xbox_token_body(token: &str, lifetime: Duration) -> String {
	xbox_token_body_at(token, OffsetDateTime::now_utc(), lifetime)
}

pub fn xbox_token_body_at(token: &str, issued: OffsetDateTime, lifetime: Duration) -> String {
	let format = |instant: OffsetDateTime| {
		instant.format(&Rfc3339).expect("Fixture instant should format as RFC 3339.")
	};

	json!({
		"IssueInstant": format(issued),
		"NotAfter": format(issued + lifetime),
		"Token": token,
		"DisplayClaims": {
			"xui": [{
				"uhs": USERHASH,
				"xid": "2669321029139235",
				"gtg": "e",
				"agg": "Adult",
			}]
		}
	})
	.to_string()
}
