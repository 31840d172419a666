//! Xbox Live identity in one crate: OAuth2 to XAU to XSTS token chains, two-factor login,
//! proof-of-possession request signing, and burst/sustain rate limiting.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod ratelimit;
pub mod session;
pub mod signing;
pub mod store;
pub mod two_factor;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use p256;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
