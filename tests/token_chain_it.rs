#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use xbl_auth::{
	error::{ConfigError, Error},
	flows::ChainState,
};

const XERR_CHILD: u64 = 2_148_916_238;

#[tokio::test]
async fn authorization_code_builds_full_chain() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf").body_includes("code=auth-code");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access", "refresh", 3600));
		})
		.await;
	let user = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/user/authenticate")
				.header("x-xbl-contract-version", "1")
				.body_includes(r#""RpsTicket":"d=access""#)
				.body_includes(r#""SiteName":"user.auth.xboxlive.com""#);
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("user-token", Duration::days(14)));
		})
		.await;
	let xsts = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/xsts/authorize")
				.header("x-xbl-contract-version", "1")
				.body_includes(r#""UserTokens":["user-token"]"#)
				.body_includes(r#""SandboxId":"RETAIL""#);
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("xsts-token", Duration::hours(16)));
		})
		.await;

	assert_eq!(manager.state(), ChainState::Absent);

	manager.request_tokens("auth-code").await.expect("Authorization code chain should complete.");

	token.assert_async().await;
	user.assert_async().await;
	xsts.assert_async().await;

	assert_eq!(manager.state(), ChainState::Valid);
	assert_eq!(
		manager.authorization_header_value().expect("Header should build from the chain."),
		"XBL3.0 x=abcdefg;xsts-token"
	);

	let oauth = manager.oauth_token().expect("OAuth token should be held.");

	assert_eq!(oauth.user_id.as_deref(), Some("a1b2c3d4e5f6"));
	assert_eq!(
		manager.service_token().and_then(|s| s.gamertag().map(str::to_owned)).as_deref(),
		Some("e")
	);
}

#[tokio::test]
async fn refresh_renews_only_expired_tokens() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf").body_includes("grant_type=authorization_code");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access", "refresh", 3600));
		})
		.await;
	let user = server
		.mock_async(|when, then| {
			when.method(POST).path("/user/authenticate");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("user-token", Duration::days(14)));
		})
		.await;
	let xsts = server
		.mock_async(|when, then| {
			when.method(POST).path("/xsts/authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("xsts-token", Duration::minutes(15)));
		})
		.await;

	manager.request_tokens("auth-code").await.expect("Initial chain should complete.");

	let t0 = manager.oauth_token().expect("OAuth token should be held.").issued_at;

	// The OAuth token lives for an hour; the service token has lapsed by the half-hour mark.
	manager
		.refresh_tokens_at(t0 + Duration::seconds(1800))
		.await
		.expect("Refresh at half-life should succeed.");

	token.assert_calls_async(1).await;
	user.assert_calls_async(1).await;
	xsts.assert_calls_async(2).await;

	assert_eq!(manager.refresh_metrics.refreshed_tokens(), 1);
	assert_eq!(manager.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn refresh_uses_refresh_grant_for_expired_oauth_token() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf").body_includes("grant_type=authorization_code");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access", "refresh", 3600));
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth20_token.srf")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access-2", "refresh-2", 3600));
		})
		.await;
	let user = server
		.mock_async(|when, then| {
			when.method(POST).path("/user/authenticate");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("user-token", Duration::days(14)));
		})
		.await;
	let xsts = server
		.mock_async(|when, then| {
			when.method(POST).path("/xsts/authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("xsts-token", Duration::hours(16)));
		})
		.await;

	manager.request_tokens("auth-code").await.expect("Initial chain should complete.");
	manager
		.refresh_tokens_at(OffsetDateTime::now_utc() + Duration::hours(2))
		.await
		.expect("Expired OAuth token should be refreshed.");

	refresh.assert_calls_async(1).await;
	user.assert_calls_async(1).await;
	xsts.assert_calls_async(1).await;

	let oauth = manager.oauth_token().expect("Refreshed OAuth token should be held.");

	assert_eq!(oauth.access_token.expose(), "access-2");
	assert_eq!(oauth.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-2"));
}

#[tokio::test]
async fn concurrent_refreshes_share_one_round_trip() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access", "refresh", 3600));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/user/authenticate");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("user-token", Duration::days(14)));
		})
		.await;

	let mut stale = server
		.mock_async(|when, then| {
			when.method(POST).path("/xsts/authorize");
			then.status(200).header("content-type", "application/json").body(xbox_token_body_at(
				"stale-xsts",
				OffsetDateTime::now_utc() - Duration::hours(2),
				Duration::hours(1),
			));
		})
		.await;

	manager.request_tokens("auth-code").await.expect("Initial chain should complete.");

	assert_eq!(manager.state(), ChainState::Expired);

	stale.delete_async().await;

	let fresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/xsts/authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("fresh-xsts", Duration::hours(16)));
		})
		.await;
	let (first, second) = tokio::join!(manager.refresh_tokens(), manager.refresh_tokens());

	first.expect("First concurrent refresh should succeed.");
	second.expect("Second concurrent refresh should succeed.");
	fresh.assert_calls_async(1).await;

	assert_eq!(manager.state(), ChainState::Valid);
	assert_eq!(manager.refresh_metrics.attempts(), 2);
}

#[tokio::test]
async fn xsts_unauthorized_invalidates_chain() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access", "refresh", 3600));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/user/authenticate");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("user-token", Duration::days(14)));
		})
		.await;

	let xsts = server
		.mock_async(|when, then| {
			when.method(POST).path("/xsts/authorize");
			then.status(401)
				.header("content-type", "application/json")
				.body(format!(r#"{{"Identity":"0","XErr":{XERR_CHILD},"Message":"","Redirect":""}}"#));
		})
		.await;
	let err = manager
		.request_tokens("auth-code")
		.await
		.expect_err("XSTS 401 should fail the chain.");

	assert!(matches!(err, Error::IneligibleAccount { xerr: Some(XERR_CHILD), .. }));
	assert!(err.is_terminal());
	assert_eq!(manager.state(), ChainState::InvalidCredentials);

	let err = manager.refresh_tokens().await.expect_err("Invalidated chain should not refresh.");

	assert!(matches!(err, Error::InvalidCredentials));
	xsts.assert_calls_async(1).await;
}

#[tokio::test]
async fn xsts_error_code_is_read_from_header() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf");
			then.status(200)
				.header("content-type", "application/json")
				.body(oauth_body("access", "refresh", 3600));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/user/authenticate");
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("user-token", Duration::days(14)));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/xsts/authorize");
			then.status(401).header("x-err", "2148916233");
		})
		.await;

	let err = manager
		.request_tokens("auth-code")
		.await
		.expect_err("XSTS 401 without a body should still fail the chain.");
	let Error::IneligibleAccount { xerr, reason } = err else {
		panic!("XSTS 401 should map to an ineligible account.");
	};

	assert_eq!(xerr, Some(2_148_916_233));
	assert!(reason.contains("no Xbox profile"));
}

#[tokio::test]
async fn refresh_without_tokens_needs_authorization() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);
	let err = manager.refresh_tokens().await.expect_err("Empty chain should not refresh.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRefreshToken)));
	assert_eq!(manager.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn rejected_code_surfaces_authentication_error() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth20_token.srf");
			then.status(400).header("content-type", "application/json").body(
				r#"{"error":"invalid_grant","error_description":"The provided value for the 'code' parameter is not valid."}"#,
			);
		})
		.await;

	let err = manager.request_tokens("bad-code").await.expect_err("Invalid code should fail.");

	assert!(matches!(err, Error::Authentication { .. }));
	assert_eq!(manager.state(), ChainState::Absent);
	assert!(manager.oauth_token().is_none());
}
