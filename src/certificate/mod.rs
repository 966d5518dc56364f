//! Certificate lifecycle tracking
//!
//! Records the lifecycle of an off-system mint action per token, as
//! reported by a trusted external caller. The tracker never performs or
//! verifies the external action itself.

pub mod status;
pub mod tracker;

pub use status::CertStatus;
pub use tracker::{CertStats, CertTracker, CertUpdate, MintData, PendingCert, TokenWithCert};
