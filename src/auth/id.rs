//! Strongly typed identifiers used by the token chain.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:path) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				Ok(Self($validate($kind, value.as_ref())?))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (client, device).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (client, device).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (client, device).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
	/// The identifier is not a hyphenated UUID.
	#[error("{kind} identifier must be a hyphenated UUID.")]
	NotUuid {
		/// Kind of identifier (client, device).
		kind: &'static str,
	},
}

def_id! { ClientId, "OAuth client identifier registered with Windows Live.", "Client", validate_view }
def_id! { DeviceId, "Device identifier presented during proof-of-possession authentication.", "Device", validate_uuid }

impl DeviceId {
	/// Generates a random version 4 device identifier.
	pub fn generate() -> Self {
		let mut bytes: [u8; 16] = rand::random();

		bytes[6] = (bytes[6] & 0x0f) | 0x40;
		bytes[8] = (bytes[8] & 0x3f) | 0x80;

		let hex = bytes.iter().map(|b| format!("{b:02x}")).collect::<String>();

		Self(format!("{}-{}-{}-{}-{}", &hex[..8], &hex[8..12], &hex[12..16], &hex[16..20], &hex[20..]))
	}

	/// Formats the identifier the way the device endpoint expects for `device_type`.
	///
	/// Android clients wrap the UUID in braces, iOS clients send it upper-cased, everything
	/// else uses the plain lower-case form.
	pub fn format_for(&self, device_type: &str) -> String {
		if device_type.eq_ignore_ascii_case("android") {
			format!("{{{}}}", self.0)
		} else if device_type.eq_ignore_ascii_case("ios") {
			self.0.to_ascii_uppercase()
		} else {
			self.0.clone()
		}
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<String, IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(view.to_owned())
}

fn validate_uuid(kind: &'static str, view: &str) -> Result<String, IdentifierError> {
	let view = validate_view(kind, view)?;
	let trimmed = view.trim_start_matches('{').trim_end_matches('}');
	let groups = trimmed.split('-').map(str::len).collect::<Vec<_>>();

	if groups != [8, 4, 4, 4, 12] || !trimmed.chars().all(|c| c == '-' || c.is_ascii_hexdigit()) {
		return Err(IdentifierError::NotUuid { kind });
	}

	Ok(trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn client_ids_validate() {
		assert!(ClientId::new(" client").is_err(), "Leading whitespace must be rejected.");
		assert!(ClientId::new("").is_err());
		assert!(ClientId::new("a".repeat(IDENTIFIER_MAX_LEN + 1)).is_err());

		let client = ClientId::new("0000000048093EE3").expect("Client fixture should be valid.");

		assert_eq!(client.as_ref(), "0000000048093EE3");
	}

	#[test]
	fn device_ids_normalize_and_format_per_platform() {
		let device = DeviceId::new("{4D2E1A9C-7F41-4C1B-9E0A-4B0C2A7F1D55}")
			.expect("Braced upper-case UUID should be accepted.");

		assert_eq!(&*device, "4d2e1a9c-7f41-4c1b-9e0a-4b0c2a7f1d55");
		assert_eq!(device.format_for("Android"), "{4d2e1a9c-7f41-4c1b-9e0a-4b0c2a7f1d55}");
		assert_eq!(device.format_for("iOS"), "4D2E1A9C-7F41-4C1B-9E0A-4B0C2A7F1D55");
		assert_eq!(device.format_for("Win32"), "4d2e1a9c-7f41-4c1b-9e0a-4b0c2a7f1d55");
		assert!(DeviceId::new("not-a-uuid").is_err());
	}

	#[test]
	fn generated_device_ids_are_v4_uuids() {
		let device = DeviceId::generate();

		assert_eq!(device.len(), 36);
		assert_eq!(device.as_bytes()[14], b'4');
		assert!(DeviceId::new(device.as_ref()).is_ok());
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let device: DeviceId = serde_json::from_str("\"4d2e1a9c-7f41-4c1b-9e0a-4b0c2a7f1d55\"")
			.expect("Device identifier should deserialize successfully.");

		assert_eq!(device.to_string(), "4d2e1a9c-7f41-4c1b-9e0a-4b0c2a7f1d55");
		assert!(serde_json::from_str::<DeviceId>("\"with space\"").is_err());
	}
}
