//! KKM Server add-in transport.
//!
//! Some deployments reach the device server through a host-provided add-in
//! instead of HTTP. The host exposes a callback-style API ([`AddInHost`]);
//! [`AddInExecutor`] wraps it in the same async
//! [`protocol::CommandExecutor`] contract the HTTP transport offers.
//!
//! ## Failure Mapping
//!
//! | Situation | Error |
//! |-----------|-------|
//! | No host installed | [`protocol::KkmError::TransportUnavailable`] |
//! | Host invokes the error callback | [`protocol::KkmError::Transport`] (no status) |
//! | Host drops both callbacks | [`protocol::KkmError::Transport`] |
//! | No reply within the call deadline | [`protocol::KkmError::Timeout`] |
//! | Reply is not a valid response | [`protocol::KkmError::Protocol`] |
//!
//! The pending call resolves exactly once; later callback invocations are
//! ignored.

mod executor;
mod host;

pub use executor::AddInExecutor;
pub use host::{AddInHost, ErrorCallback, SuccessCallback};
