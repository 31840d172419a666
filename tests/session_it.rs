#![cfg(feature = "reqwest")]

mod common;

// crates.io
use httpmock::prelude::*;
use time::Duration;
// self
use common::*;
use xbl_auth::{
	error::{Error, TransportError},
	flows::ReqwestAuthenticationManager,
	ratelimit::{LimitDirection, LimitValue, RateLimitConfig},
	session::XblSession,
	url::Url,
};

const CONFIG: RateLimitConfig =
	RateLimitConfig { burst: LimitValue::Uniform(10), sustain: LimitValue::Uniform(30) };

async fn mock_chain(server: &MockServer) {
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
			then.status(200)
				.header("content-type", "application/json")
				.body(xbox_token_body("xsts-token", Duration::hours(16)));
		})
		.await;
}

async fn signed_in(server: &MockServer) -> ReqwestAuthenticationManager {
	mock_chain(server).await;

	let manager = manager(server);

	manager.request_tokens("auth-code").await.expect("Chain should complete for the session.");

	manager
}

#[tokio::test]
async fn eleventh_read_in_burst_window_is_refused() {
	let server = MockServer::start_async().await;
	let session = XblSession::with_rate_limit_config(signed_in(&server).await, &CONFIG);
	let profile = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/users/me/profile/settings")
				.header("Authorization", "XBL3.0 x=abcdefg;xsts-token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let url = Url::parse(&server.url("/users/me/profile/settings"))
		.expect("Profile URL fixture should parse.");

	for _ in 0..10 {
		session.get(&url).await.expect("Calls within the burst limit should succeed.");
	}

	let err = session.get(&url).await.expect_err("The eleventh call should be rate limited.");
	let Error::RateLimitExceeded { limit, reset_after } = err else {
		panic!("The eleventh call should fail with a rate limit error.");
	};

	assert_eq!(limit.counter(), 10);
	assert_eq!(reset_after, limit.burst().reset_after());
	assert!(reset_after.is_some());
	profile.assert_calls_async(10).await;

	// Writes draw from their own budget.
	let write = server
		.mock_async(|when, then| {
			when.method(POST).path("/users/me/profile/settings");
			then.status(200);
		})
		.await;

	session
		.post_json(&url, &serde_json::json!({"settings": ["Gamertag"]}))
		.await
		.expect("Write budget should be untouched by reads.");
	write.assert_async().await;
}

#[tokio::test]
async fn concurrent_reads_never_exceed_the_burst_limit() {
	let server = MockServer::start_async().await;
	let config = RateLimitConfig { burst: LimitValue::Uniform(2), sustain: LimitValue::Uniform(30) };
	let session = XblSession::with_rate_limit_config(signed_in(&server).await, &config);
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me/profile/settings");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let url = Url::parse(&server.url("/users/me/profile/settings"))
		.expect("Profile URL fixture should parse.");
	let (first, second, third) =
		tokio::join!(session.get(&url), session.get(&url), session.get(&url));
	let refused = [first, second, third]
		.into_iter()
		.filter(|result| matches!(result, Err(Error::RateLimitExceeded { .. })))
		.count();

	assert_eq!(refused, 1);
	assert_eq!(session.rate_limits().get(LimitDirection::Read).counter(), 2);
	profile.assert_calls_async(2).await;
}

#[tokio::test]
async fn signer_adds_signature_header() {
	let server = MockServer::start_async().await;
	let manager = signed_in(&server).await.with_signer(test_signer());
	let session = XblSession::with_rate_limit_config(manager, &CONFIG);
	let signed = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/titles/123")
				.header("Authorization", "XBL3.0 x=abcdefg;xsts-token")
				.header_exists("Signature");
			then.status(200);
		})
		.await;
	let url = Url::parse(&server.url("/titles/123")).expect("Title URL fixture should parse.");

	session.get(&url).await.expect("Signed call should succeed.");
	signed.assert_async().await;
}

#[tokio::test]
async fn unsigned_session_omits_signature() {
	let server = MockServer::start_async().await;
	let manager = signed_in(&server).await.with_signer(test_signer());
	let session = XblSession::with_rate_limit_config(manager, &CONFIG).with_signing(false);
	let unsigned = server
		.mock_async(|when, then| {
			when.method(GET).path("/titles/123").header_missing("Signature");
			then.status(200);
		})
		.await;
	let url = Url::parse(&server.url("/titles/123")).expect("Title URL fixture should parse.");

	session.get(&url).await.expect("Unsigned call should succeed.");
	unsigned.assert_async().await;
}

#[tokio::test]
async fn error_status_is_classified() {
	let server = MockServer::start_async().await;
	let session = XblSession::with_rate_limit_config(signed_in(&server).await, &CONFIG);

	server
		.mock_async(|when, then| {
			when.method(GET).path("/forbidden");
			then.status(403).body("no access");
		})
		.await;

	let url = Url::parse(&server.url("/forbidden")).expect("URL fixture should parse.");
	let err = session.get(&url).await.expect_err("A 403 response should fail.");

	assert!(matches!(err, Error::Transport(TransportError::Status { status: 403, .. })));
	assert_eq!(session.rate_limits().get(LimitDirection::Read).counter(), 1);
}

#[tokio::test]
async fn session_requires_chain() {
	let server = MockServer::start_async().await;
	let session = XblSession::with_rate_limit_config(manager(&server), &CONFIG);
	let url = Url::parse(&server.url("/titles/123")).expect("Title URL fixture should parse.");
	let err = session.get(&url).await.expect_err("A session without tokens should fail.");

	assert!(matches!(err, Error::Config(_)));
	assert_eq!(session.rate_limits().get(LimitDirection::Read).counter(), 0);
}
