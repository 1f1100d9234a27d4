//! KKM Server HTTP transport adapter.
//!
//! Implements [`protocol::CommandExecutor`] over the device server's HTTP API:
//! every command is a `POST` of its JSON encoding to `<endpoint>/Execute`,
//! answered by a JSON [`protocol::Response`].
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL construction, headers, Basic authentication,
//! request deadlines and the mapping of HTTP and network failures onto
//! [`protocol::KkmError`] live here. The `client` crate sees only
//! [`protocol::CommandExecutor`].
//!
//! ## Failure Mapping
//!
//! | Condition | Error |
//! |-----------|-------|
//! | Non-2xx status | [`protocol::KkmError::Transport`] with the status code |
//! | Deadline exceeded | [`protocol::KkmError::Timeout`] with the deadline |
//! | Connection refused, DNS, reset | [`protocol::KkmError::Network`] |
//! | Body is not a response | [`protocol::KkmError::Protocol`] |
//! | No endpoint configured | [`protocol::KkmError::Configuration`] |

mod client;
mod error;

pub use client::HttpExecutor;
