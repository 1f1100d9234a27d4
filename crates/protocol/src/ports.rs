//! Port traits implemented by infrastructure crates.
//!
//! The `client` crate drives these; `http-transport`, `addin` and `emulator`
//! supply [`CommandExecutor`]s, and settings stores supply persistence.

use std::time::Duration;

use async_trait::async_trait;

use crate::{Command, ConnectionConfig, KkmError, Response, StoredSettings};

/// One transport strategy: sends a command and returns the server's response.
///
/// Implementations receive a command that already carries its identifier and
/// the deadline computed by [`crate::timeout::effective_timeout`]. They must
/// not retry, and must give up once `timeout` has elapsed.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Short transport name for logs and errors (`"http"`, `"addin"`, …).
    fn name(&self) -> &'static str;

    /// Executes `command` against the server described by `connection`.
    ///
    /// # Errors
    ///
    /// [`KkmError::Transport`], [`KkmError::Network`], [`KkmError::Timeout`],
    /// [`KkmError::TransportUnavailable`], [`KkmError::Protocol`] for an
    /// undecodable body, or [`KkmError::Configuration`].
    async fn execute(
        &self,
        connection: &ConnectionConfig,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, KkmError>;
}

/// Persistence for the connection mode and endpoint.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the saved settings, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<StoredSettings>, KkmError>;

    /// Replaces the saved settings.
    async fn save(&self, settings: &StoredSettings) -> Result<(), KkmError>;
}
