//! Interactive sign-in walkthrough against the live Xbox Live service.
//!
//! The demo prints the authorization URL, waits for the `code` returned to the redirect URI,
//! builds the token chain, registers a signed device token, and writes everything to a token
//! file. Re-running it reuses the file and only refreshes what has expired.

// std
use std::{
	io::{self, Write},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use xbl_auth::{
	auth::DeviceId,
	flows::{ChainState, ReqwestAuthenticationManager},
	provider::{XboxLiveDescriptor, XboxLiveStrategy},
	signing::RequestSigner,
	store::FileStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = prompt_with_default("Enter your Windows Live client ID", None)?;
	let redirect_input = prompt_with_default(
		"Enter the redirect URI registered for the client",
		Some("https://login.live.com/oauth20_desktop.srf"),
	)?;
	let token_path = prompt_with_default("Token file", Some("xbl-tokens.json"))?;
	let store = FileStore::open(&token_path)?;
	let manager = ReqwestAuthenticationManager::new(
		XboxLiveDescriptor::live()?,
		Arc::new(XboxLiveStrategy),
		client_id,
		Url::parse(&redirect_input)?,
	)?
	.with_signer(RequestSigner::generate());

	if manager.load_tokens(&store).await? {
		println!("Loaded tokens from {token_path}.");
	}

	match manager.state() {
		ChainState::Valid => println!("Held chain is still valid."),
		ChainState::Expired => {
			manager.refresh_tokens().await?;

			println!("Refreshed the expired parts of the chain.");
		},
		ChainState::Absent | ChainState::InvalidCredentials => {
			let state = ReqwestAuthenticationManager::generate_state();

			println!("Authorize URL: {}", manager.generate_authorization_url(Some(&state)));
			println!("After signing in, copy the `code` query parameter of the redirect and paste it here.");

			let Some(code) = prompt_optional("Authorization code")? else {
				println!("Authorization code not provided; nothing to do.");

				return Ok(());
			};

			manager.request_tokens(&code).await?;
		},
	}

	if let Some(service) = manager.service_token() {
		println!(
			"Signed in as {} (xuid {}).",
			service.gamertag().unwrap_or("<unknown>"),
			service.xuid().unwrap_or("<unknown>")
		);
	}

	let device = manager.request_device_token(&DeviceId::generate()).await?;

	println!("Device token valid until {}.", device.not_after);

	manager.save_tokens(&store).await?;

	println!("Tokens written to {}.", store.path().display());

	Ok(())
}

fn prompt_with_default(message: &str, default: Option<&str>) -> Result<String> {
	loop {
		if let Some(value) = default {
			print!("{message} [{value}]: ");
		} else {
			print!("{message}: ");
		}

		io::stdout().flush()?;

		let mut input = String::new();

		io::stdin().read_line(&mut input)?;

		let trimmed = input.trim();

		if trimmed.is_empty() {
			if let Some(value) = default {
				return Ok(value.to_owned());
			}
		} else {
			return Ok(trimmed.to_owned());
		}
	}
}

fn prompt_optional(message: &str) -> Result<Option<String>> {
	print!("{message}: ");

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let trimmed = input.trim();

	if trimmed.is_empty() { Ok(None) } else { Ok(Some(trimmed.to_owned())) }
}
