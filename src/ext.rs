//! Extension contracts that plug the signer and rate limits into caller-owned HTTP stacks.

pub mod rate_limit;
pub mod request_signer;

pub use rate_limit::*;
pub use request_signer::*;
