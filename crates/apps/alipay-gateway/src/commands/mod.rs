//! CLI command implementations.

pub mod cert_sn;
pub mod serve;
pub mod sign;

// Re-export command handlers
pub use cert_sn::cert_sn;
pub use serve::{build_client, serve};
pub use sign::sign;
