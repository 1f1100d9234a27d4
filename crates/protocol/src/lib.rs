//! Protocol domain for the KKM Server client.
//!
//! This crate contains every protocol concept, newtype identifier, value type,
//! and error type used throughout the workspace, plus the pure rules the
//! client applies: status classification, command correlation, deadline
//! computation and polling decisions. Infrastructure crates implement the
//! traits defined here; they never add protocol rules.
//!
//! ## Architectural Layer
//!
//! **Protocol rules + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is exchanged with the device server; infrastructure
//! crates define *how* it travels.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`CommandId`, `UniversalId`, `DeviceNumber`) |
//! | [`status`] | Status Classifier (`KkmStatus`, `classify`, `status_text`) |
//! | [`command`] | Typed commands and their wire encoding |
//! | [`response`] | Typed responses and their wire decoding |
//! | [`config`] | Connection configuration and persisted settings |
//! | [`correlator`] | Command identifier assignment |
//! | [`timeout`] | Per-call deadline computation |
//! | [`polling`] | Polling policy and per-response decisions |
//! | [`ports`] | `CommandExecutor` and `SettingsStore` traits |
//! | [`errors`] | `KkmError` taxonomy |

pub mod command;
pub mod config;
pub mod correlator;
pub mod errors;
pub mod identifiers;
pub mod polling;
pub mod ports;
pub mod response;
pub mod status;
pub mod timeout;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use command::{
    BarCode, BarcodeType, CardPayment, CardReversal, CheckString, Command, CommandKind,
    GoodCodeData, ListDevices, PrintImage, PrintText, RegisterCheck, RegisterItem, ShiftParams,
    DEFAULT_CASHIER_NAME, DEFAULT_CASHIER_VATIN,
};
pub use config::{ConnectionConfig, Credentials, StoredSettings, TransportMode, DEFAULT_ENDPOINT};
pub use correlator::ensure_id;
pub use errors::KkmError;
pub use identifiers::{CommandId, DeviceNumber, EmptyIdentifier, UniversalId};
pub use polling::{initial_disposition, poll_step, InitialDisposition, PollStep, PollingPolicy};
pub use ports::{CommandExecutor, SettingsStore};
pub use response::{DeviceInfo, Response};
pub use status::{classify, status_text, KkmStatus, StatusOutcome, UnknownStatus};
pub use timeout::{effective_timeout, DEFAULT_CALL_TIMEOUT};
