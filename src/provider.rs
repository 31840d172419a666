//! Service-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes the Xbox Live endpoint set, relying parties, sandbox, and device profile.
//! `strategy` defines [`ProviderStrategy`], an HTTP-client-agnostic hook used by flows to map
//! failed responses into the crate error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
