//! Second-factor methods offered by the login page and the challenge that carries them.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, error::TransientError, provider::AuthStage};

const VOICE: i64 = -3;
const EMAIL: i64 = 1;
const SMS: i64 = 3;
const TOTP: i64 = 10;
const TOTP_PUSH: i64 = 14;

/// One verification method offered by the login page.
///
/// `display` is the masked hint shown to the user; `data` is the opaque value echoed back to
/// the server when the method is used.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawStrategy")]
pub enum AuthStrategy {
	/// Code sent to an alternate mail address.
	Email {
		/// Masked mail address.
		display: String,
		/// Opaque method data.
		data: String,
	},
	/// Code sent by text message.
	Sms {
		/// Masked phone number.
		display: String,
		/// Opaque method data.
		data: String,
	},
	/// Code read out by a voice call.
	Voice {
		/// Masked phone number.
		display: String,
		/// Opaque method data.
		data: String,
	},
	/// Code generated offline by an authenticator app.
	Totp {
		/// Authenticator label.
		display: String,
		/// Opaque method data.
		data: String,
	},
	/// Approval pushed to the authenticator app.
	TotpPush {
		/// Authenticator label.
		display: String,
		/// Authenticator app id.
		data: String,
	},
	/// Method type this crate cannot complete.
	Unsupported {
		/// Raw method type code.
		kind: i64,
		/// Masked hint, if any.
		display: String,
	},
}
impl AuthStrategy {
	/// Raw method type code.
	pub fn kind(&self) -> i64 {
		match self {
			Self::Email { .. } => EMAIL,
			Self::Sms { .. } => SMS,
			Self::Voice { .. } => VOICE,
			Self::Totp { .. } => TOTP,
			Self::TotpPush { .. } => TOTP_PUSH,
			Self::Unsupported { kind, .. } => *kind,
		}
	}

	/// Masked hint shown to the user.
	pub fn display(&self) -> &str {
		match self {
			Self::Email { display, .. }
			| Self::Sms { display, .. }
			| Self::Voice { display, .. }
			| Self::Totp { display, .. }
			| Self::TotpPush { display, .. }
			| Self::Unsupported { display, .. } => display,
		}
	}

	/// Opaque method data, absent for unsupported methods.
	pub fn data(&self) -> Option<&str> {
		match self {
			Self::Email { data, .. }
			| Self::Sms { data, .. }
			| Self::Voice { data, .. }
			| Self::Totp { data, .. }
			| Self::TotpPush { data, .. } => Some(data),
			Self::Unsupported { .. } => None,
		}
	}

	/// Returns true for the push-approval method.
	pub fn is_push(&self) -> bool {
		matches!(self, Self::TotpPush { .. })
	}

	/// Prompt describing the proof the user must enter before a code is sent.
	///
	/// Phone methods ask for the last four digits, mail asks for the full address, and the
	/// authenticator methods need no proof.
	pub fn verification_prompt(&self) -> Option<String> {
		match self {
			Self::Sms { display, .. } | Self::Voice { display, .. } =>
				Some(format!("Enter last four digits of following phone number '{display}'")),
			Self::Email { display, .. } => Some(format!("Enter the full mail address '{display}'")),
			_ => None,
		}
	}

	/// `channel` and the form field carrying `data` for the one-time-code request.
	pub(crate) fn delivery_channel(&self) -> Option<(&'static str, &'static str)> {
		match self {
			Self::Email { .. } => Some(("Email", "AltEmailE")),
			Self::Sms { .. } => Some(("SMS", "MobileNumE")),
			Self::Voice { .. } => Some(("Voice", "MobileNumE")),
			Self::TotpPush { .. } => Some(("PushNotifications", "SAPId")),
			Self::Totp { .. } | Self::Unsupported { .. } => None,
		}
	}

	/// `type` value of the completion form.
	pub(crate) fn completion_type(&self) -> Option<&'static str> {
		match self {
			Self::Email { .. } | Self::Sms { .. } | Self::Voice { .. } => Some("18"),
			Self::Totp { .. } => Some("19"),
			Self::TotpPush { .. } => Some("22"),
			Self::Unsupported { .. } => None,
		}
	}

	pub(crate) fn unsupported_error(&self) -> Error {
		Error::Authentication {
			stage: AuthStage::TwoFactor,
			reason: format!("unsupported two-factor method type {}", self.kind()),
		}
	}
}

#[derive(Deserialize)]
struct RawStrategy {
	#[serde(rename = "type")]
	kind: i64,
	#[serde(default)]
	display: String,
	#[serde(default)]
	data: String,
}
impl From<RawStrategy> for AuthStrategy {
	fn from(raw: RawStrategy) -> Self {
		let RawStrategy { kind, display, data } = raw;

		match kind {
			EMAIL => Self::Email { display, data },
			SMS => Self::Sms { display, data },
			VOICE => Self::Voice { display, data },
			TOTP => Self::Totp { display, data },
			TOTP_PUSH => Self::TotpPush { display, data },
			kind => Self::Unsupported { kind, display },
		}
	}
}

/// Second-factor requirement parsed from the login page's `ServerData` object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TwoFactorChallenge {
	/// Offered methods, in server order.
	pub strategies: Vec<AuthStrategy>,
	/// Flow token (`sFT`), sent as `flowtoken` and `PPFT`.
	pub flow_token: String,
	/// Completion endpoint (`urlPost`).
	pub post_url: Url,
	/// Push approval polling endpoint, when the page names one.
	pub polling_url: Option<Url>,
}
impl TwoFactorChallenge {
	/// Extracts the challenge from the parsed `ServerData` object.
	///
	/// The method list moves between page revisions, so it is located by shape: the first
	/// array whose first element is an object with `otcEnabled` and `data` keys.
	pub fn from_server_data(server_data: &Value) -> Result<Self> {
		let list = find_strategy_list(server_data)
			.ok_or_else(|| rejected("no second-factor methods found"))?;
		let strategies: Vec<AuthStrategy> = serde_path_to_error::deserialize(list)
			.map_err(|source| TransientError::ResponseParse {
				stage: AuthStage::TwoFactor,
				source,
				status: None,
			})?;
		let flow_token = server_data
			.get("sFT")
			.and_then(Value::as_str)
			.ok_or_else(|| rejected("login page carries no flow token"))?
			.to_owned();
		let post_url = server_data
			.get("urlPost")
			.and_then(Value::as_str)
			.ok_or_else(|| rejected("login page carries no completion URL"))
			.and_then(|raw| {
				Url::parse(raw).map_err(|e| rejected(&format!("completion URL is invalid: {e}")))
			})?;
		let polling_url = server_data.as_object().and_then(|object| {
			object
				.values()
				.filter_map(Value::as_str)
				.find(|raw| raw.contains("GetSessionState.srf"))
				.and_then(|raw| Url::parse(raw).ok())
		});

		Ok(Self { strategies, flow_token, post_url, polling_url })
	}

	/// Fails with [`Error::TwoFactorRequired`] when the page asks for a second factor.
	pub fn ensure_single_factor(server_data: &Value) -> Result<()> {
		if find_strategy_list(server_data).is_none() {
			return Ok(());
		}

		Err(Error::TwoFactorRequired(Box::new(Self::from_server_data(server_data)?)))
	}

	/// Method at `index`, or [`Error::InvalidStrategyIndex`].
	pub fn strategy(&self, index: usize) -> Result<&AuthStrategy> {
		self.strategies
			.get(index)
			.ok_or(Error::InvalidStrategyIndex { index, available: self.strategies.len() })
	}
}

fn find_strategy_list(server_data: &Value) -> Option<&Value> {
	server_data.as_object()?.values().find(|value| {
		value
			.as_array()
			.and_then(|items| items.first())
			.and_then(Value::as_object)
			.is_some_and(|first| first.contains_key("otcEnabled") && first.contains_key("data"))
	})
}

fn rejected(reason: &str) -> Error {
	Error::Authentication { stage: AuthStage::TwoFactor, reason: reason.to_owned() }
}
