//! KKM Server client orchestration.
//!
//! This crate sequences calls between the protocol rules in the [`protocol`]
//! crate and the transport adapters (`http-transport`, `addin`, `emulator`).
//! It contains no wire details of its own.
//!
//! ## Control Flow
//!
//! 1. The caller builds a [`protocol::Command`] (or uses a typed operation
//!    such as [`KkmClient::open_shift`]).
//! 2. [`KkmClient::execute`] assigns a [`protocol::CommandId`] if missing,
//!    reads the current [`protocol::ConnectionConfig`], selects the executor
//!    for its transport mode, and computes the call deadline.
//! 3. [`KkmClient::execute_with_polling`] inspects the first response and,
//!    for `Run`/`NotRun`, polls `GetRezult` until a final status
//!    (see [`polling`]).
//!
//! ## Architectural Layer
//!
//! **Orchestration.** Transport implementations are injected through
//! [`Transports`]; persistence through [`protocol::SettingsStore`].

pub mod client;
pub mod dispatch;
pub mod operations;
pub mod polling;
pub mod settings;

pub use client::KkmClient;
pub use dispatch::{FallbackPolicy, Transports};
pub use operations::CardPaymentRequest;
pub use polling::PollingSession;
pub use settings::{ConnectionSettings, FileSettingsStore, MemorySettingsStore};
