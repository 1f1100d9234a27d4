//! Offline stand-in for the KKM Server.
//!
//! [`Emulator`] implements [`protocol::CommandExecutor`] so it can replace
//! the HTTP transport in tests, demos, or as an explicit offline fallback.
//! It models no fiscal logic: it returns plausible payloads and the full
//! range of status codes the client has to handle.
//!
//! Randomness comes from a seedable [`rand::rngs::StdRng`]; fix
//! [`EmulatorConfig::seed`] for reproducible runs.

mod config;
mod emulator;
mod fixtures;

pub use config::{EmulatorConfig, ErrorRates, DEFAULT_MAX_PENDING};
pub use emulator::Emulator;
