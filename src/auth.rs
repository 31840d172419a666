//! Auth-domain identifiers, scope sets, display claims, and the token models of the chain.

pub mod claims;
pub mod id;
pub mod scope;
pub mod token;

pub use claims::*;
pub use id::*;
pub use scope::*;
pub use token::{Token, TokenKind, oauth::*, secret::*, xbox::*};
