#![cfg(feature = "reqwest")]

mod common;

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::Duration;
// self
use common::*;
use xbl_auth::{
	error::Error,
	flows::ChainState,
	two_factor::{AuthStrategy, PushPolling, TwoFactorChallenge},
};

const LOGIN: &str = "someone@example.com";
const EMAIL: usize = 0;
const TOTP: usize = 1;
const PUSH: usize = 2;

fn server_data(server: &MockServer) -> Value {
	json!({
		"sFT": "flow-token",
		"urlPost": server.url("/ppsecure/post.srf?contextid=ABC"),
		"urlSessionState": server.url("/GetSessionState.srf?mkt=en-US"),
		"D": [
			{"data": "email-proof", "type": 1, "display": "so*****@example.com", "otcEnabled": true},
			{"data": "totp-proof", "type": 10, "display": "Authenticator", "otcEnabled": false},
			{"data": "app-id", "type": 14, "display": "Authenticator push", "otcEnabled": false},
		],
	})
}

fn challenge(server: &MockServer) -> TwoFactorChallenge {
	let data = server_data(server);
	let err = TwoFactorChallenge::ensure_single_factor(&data)
		.expect_err("Server data with methods should require a second factor.");
	let Error::TwoFactorRequired(challenge) = err else {
		panic!("Second-factor requirement should carry the challenge.");
	};

	*challenge
}

fn gif(width: u16, height: u16) -> Vec<u8> {
	let mut gif = b"GIF89a".to_vec();

	gif.extend_from_slice(&width.to_le_bytes());
	gif.extend_from_slice(&height.to_le_bytes());
	gif.resize(43, 0);

	gif
}

fn token_redirect() -> String {
	"https://login.live.com/oauth20_desktop.srf?lc=1033#access_token=2fa-access&token_type=bearer&expires_in=86400&scope=service::user.auth.xboxlive.com::MBI_SSL&refresh_token=2fa-refresh&user_id=a1b2c3d4e5f6".into()
}

async fn mock_push_request(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/pp1600/GetOneTimeCode.srf")
				.form_urlencoded_tuple("channel", "PushNotifications")
				.form_urlencoded_tuple("SAPId", "app-id");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"State":201,"SessionLookupKey":"slk-key"}"#);
		})
		.await;
}

#[tokio::test]
async fn email_code_completes_login() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);
	let flow = manager.two_factor(challenge(&server), LOGIN);

	assert_eq!(flow.strategies().len(), 3);
	assert!(matches!(flow.strategies()[EMAIL], AuthStrategy::Email { .. }));
	assert_eq!(
		flow.verification_prompt(EMAIL).expect("Email strategy should exist.").as_deref(),
		Some("Enter the full mail address 'so*****@example.com'")
	);

	let otc = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/pp1600/GetOneTimeCode.srf")
				.form_urlencoded_tuple("login", LOGIN)
				.form_urlencoded_tuple("flowtoken", "flow-token")
				.form_urlencoded_tuple("purpose", "eOTT_OneTimePassword")
				.form_urlencoded_tuple("UIMode", "11")
				.form_urlencoded_tuple("channel", "Email")
				.form_urlencoded_tuple("AltEmailE", "email-proof")
				.form_urlencoded_tuple("ProofConfirmation", LOGIN);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"State":201,"SessionLookupKey":null}"#);
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/ppsecure/post.srf")
				.query_param("contextid", "ABC")
				.form_urlencoded_tuple("PPFT", "flow-token")
				.form_urlencoded_tuple("SentProofIDE", "email-proof")
				.form_urlencoded_tuple("GeneralVerify", "False")
				.form_urlencoded_tuple("type", "18")
				.form_urlencoded_tuple("otc", "123456");
			then.status(302).header("Location", token_redirect());
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/user/authenticate").body_includes(r#""RpsTicket":"d=2fa-access""#);
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

	assert!(flow.check_otc(EMAIL, Some(LOGIN)).await.expect("Code request should succeed."));

	let tokens = flow
		.authenticate(EMAIL, Some(LOGIN), Some("123456"))
		.await
		.expect("Code completion should redirect with tokens.");

	otc.assert_async().await;
	post.assert_async().await;

	assert_eq!(tokens.access_token.expose(), "2fa-access");
	assert_eq!(tokens.refresh_token.expose(), "2fa-refresh");
	assert_eq!(tokens.expires_in, Some(Duration::seconds(86400)));

	manager.complete_login(tokens).await.expect("Completed login should derive the chain.");

	assert_eq!(manager.state(), ChainState::Valid);
}

#[tokio::test]
async fn totp_needs_no_code_request() {
	let server = MockServer::start_async().await;
	let manager = manager(&server);
	let flow = manager.two_factor(challenge(&server), LOGIN);
	let otc = server
		.mock_async(|when, then| {
			when.method(POST).path("/pp1600/GetOneTimeCode.srf");
			then.status(200);
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/ppsecure/post.srf")
				.form_urlencoded_tuple("type", "19")
				.form_urlencoded_tuple("SentProofIDE", "totp-proof")
				.form_urlencoded_tuple("otc", "654321");
			then.status(302).header("Location", token_redirect());
		})
		.await;

	assert!(flow.check_otc(TOTP, None).await.expect("TOTP should not need a request."));
	assert_eq!(flow.verification_prompt(TOTP).expect("TOTP strategy should exist."), None);

	flow.authenticate(TOTP, None, Some("654321")).await.expect("TOTP completion should succeed.");

	otc.assert_calls_async(0).await;
	post.assert_async().await;
}

#[tokio::test]
async fn completion_without_tokens_fails() {
	let server = MockServer::start_async().await;
	let flow = manager(&server).two_factor(challenge(&server), LOGIN);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/ppsecure/post.srf");
			then.status(200).body("<html>Something went wrong</html>");
		})
		.await;

	let err = flow
		.authenticate(TOTP, None, Some("000000"))
		.await
		.expect_err("A page without a token redirect should fail.");

	assert!(matches!(err, Error::Authentication { .. }));
}

#[tokio::test]
async fn code_request_failure_reports_status() {
	let server = MockServer::start_async().await;
	let flow = manager(&server).two_factor(challenge(&server), LOGIN);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/pp1600/GetOneTimeCode.srf");
			then.status(500);
		})
		.await;

	let err = flow
		.check_otc(EMAIL, Some(LOGIN))
		.await
		.expect_err("A failed code request should be an authentication failure.");
	let Error::Authentication { reason, .. } = err else {
		panic!("Code request failure should be an authentication error.");
	};

	assert_eq!(reason, "Error requesting OTC, HTTP Code: 500");
}

#[tokio::test]
async fn strategy_index_out_of_range_is_caller_error() {
	let server = MockServer::start_async().await;
	let flow = manager(&server).two_factor(challenge(&server), LOGIN);
	let err = flow.check_otc(9, None).await.expect_err("Index 9 should be out of range.");

	assert!(matches!(err, Error::InvalidStrategyIndex { index: 9, available: 3 }));

	let err = flow.authenticate(3, None, None).await.expect_err("Index 3 should be out of range.");

	assert!(matches!(err, Error::InvalidStrategyIndex { index: 3, available: 3 }));
}

#[tokio::test]
async fn approved_push_completes_without_proof() {
	let server = MockServer::start_async().await;
	let flow = manager(&server)
		.two_factor(challenge(&server), LOGIN)
		.with_polling(PushPolling::new(StdDuration::from_millis(10), StdDuration::from_secs(5)));

	mock_push_request(&server).await;

	let poll = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/GetSessionState.srf")
				.query_param("mkt", "en-US")
				.query_param("slk", "slk-key");
			then.status(200).header("content-type", "image/gif").body(gif(1, 2));
		})
		.await;
	let post = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/ppsecure/post.srf")
				.form_urlencoded_tuple("type", "22")
				.form_urlencoded_tuple("slk", "slk-key")
				.body_excludes("SentProofIDE")
				.body_excludes("GeneralVerify");
			then.status(302).header("Location", token_redirect());
		})
		.await;

	assert!(!flow.check_otc(PUSH, None).await.expect("Push request should succeed."));
	assert_eq!(flow.session_lookup_key().as_deref(), Some("slk-key"));

	let tokens =
		flow.authenticate(PUSH, None, None).await.expect("Approved push should yield tokens.");

	poll.assert_calls_async(1).await;
	post.assert_async().await;

	assert_eq!(tokens.user_id.as_deref(), Some("a1b2c3d4e5f6"));
}

#[tokio::test]
async fn rejected_push_fails() {
	let server = MockServer::start_async().await;
	let flow = manager(&server).two_factor(challenge(&server), LOGIN);

	mock_push_request(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/GetSessionState.srf");
			then.status(200).body(gif(2, 2));
		})
		.await;

	let post = server
		.mock_async(|when, then| {
			when.method(POST).path("/ppsecure/post.srf");
			then.status(302).header("Location", token_redirect());
		})
		.await;

	flow.check_otc(PUSH, None).await.expect("Push request should succeed.");

	let err = flow.authenticate(PUSH, None, None).await.expect_err("Rejected push should fail.");
	let Error::Authentication { reason, .. } = err else {
		panic!("Rejected push should be an authentication error.");
	};

	assert!(reason.contains("rejected"));
	post.assert_calls_async(0).await;
}

#[tokio::test]
async fn unanswered_push_times_out() {
	let server = MockServer::start_async().await;
	let flow = manager(&server)
		.two_factor(challenge(&server), LOGIN)
		.with_polling(PushPolling::new(StdDuration::from_millis(20), StdDuration::from_millis(200)));

	mock_push_request(&server).await;

	let poll = server
		.mock_async(|when, then| {
			when.method(GET).path("/GetSessionState.srf");
			then.status(200).body(gif(1, 1));
		})
		.await;

	flow.check_otc(PUSH, None).await.expect("Push request should succeed.");

	let err = flow.authenticate(PUSH, None, None).await.expect_err("Pending push should time out.");

	assert!(matches!(err, Error::Authentication { .. }));
	assert!(poll.calls_async().await > 1);
}

#[tokio::test]
async fn cancelled_push_stops_polling() {
	let server = MockServer::start_async().await;
	let flow = manager(&server).two_factor(challenge(&server), LOGIN);

	mock_push_request(&server).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/GetSessionState.srf");
			then.status(200).body(gif(1, 1));
		})
		.await;

	flow.check_otc(PUSH, None).await.expect("Push request should succeed.");

	let cancel = flow.cancellation_token();
	let canceller = tokio::spawn(async move {
		tokio::time::sleep(StdDuration::from_millis(50)).await;
		cancel.cancel();
	});
	let err = flow.authenticate(PUSH, None, None).await.expect_err("Cancelled push should stop.");

	canceller.await.expect("Canceller task should finish.");

	assert!(matches!(err, Error::Cancelled));
}
