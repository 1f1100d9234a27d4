//! Transport Selector.
//!
//! Picks the executor for a call from the transport mode in effect at call
//! time. Selection is a pure function of [`TransportMode`]; nothing is cached
//! between calls.

use std::sync::Arc;

use protocol::{CommandExecutor, TransportMode};

/// The executors available to the client, one per transport mode.
#[derive(Clone)]
pub struct Transports {
    http: Arc<dyn CommandExecutor>,
    addin: Arc<dyn CommandExecutor>,
}

impl Transports {
    pub fn new(http: Arc<dyn CommandExecutor>, addin: Arc<dyn CommandExecutor>) -> Self {
        Self { http, addin }
    }

    /// Returns the executor serving `mode`.
    pub fn select(&self, mode: TransportMode) -> &Arc<dyn CommandExecutor> {
        match mode {
            TransportMode::AddIn => &self.addin,
            TransportMode::Http => &self.http,
        }
    }
}

impl std::fmt::Debug for Transports {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transports")
            .field("http", &self.http.name())
            .field("addin", &self.addin.name())
            .finish()
    }
}

/// What to do when the HTTP transport cannot reach the server.
///
/// Substitution is an explicit deployment decision: it is off unless the
/// composition root opts in, and it only ever applies to
/// [`protocol::KkmError::Network`] failures in HTTP mode.
#[derive(Clone, Default)]
pub enum FallbackPolicy {
    /// Surface the network error.
    #[default]
    Disabled,
    /// Hand the same command to this executor (normally the emulator).
    Substitute(Arc<dyn CommandExecutor>),
}

impl FallbackPolicy {
    pub(crate) fn substitute(&self) -> Option<&Arc<dyn CommandExecutor>> {
        match self {
            Self::Disabled => None,
            Self::Substitute(executor) => Some(executor),
        }
    }
}

impl std::fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Substitute(executor) => write!(f, "Substitute({})", executor.name()),
        }
    }
}
