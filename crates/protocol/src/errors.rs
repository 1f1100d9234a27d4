//! Error taxonomy for command execution against the KKM Server.
//!
//! Every failure surfaces to the immediate caller. Nothing in this layer
//! retries the original command: re-sending a payment or shift command can
//! duplicate a physical effect. Only the status query is repeated, and only
//! by the polling engine.

use std::time::Duration;

use thiserror::Error;

use crate::CommandId;

/// Errors produced while executing or tracking a command.
#[derive(Debug, Error)]
pub enum KkmError {
    /// The selected transport cannot be reached at all (e.g. the add-in host
    /// capability is absent).
    #[error("transport unavailable: {transport}")]
    TransportUnavailable {
        /// Name of the transport that was selected.
        transport: &'static str,
    },

    /// The transport answered but reported failure: a non-2xx HTTP status or
    /// an add-in error string.
    #[error("transport error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport {
        /// HTTP status code, when the failure came from HTTP.
        status: Option<u16>,
        /// Status reason or host-reported error text.
        message: String,
    },

    /// Connection-level failure: refused connection, DNS, reset.
    #[error("network error: {source}")]
    Network {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A single call exceeded its deadline.
    #[error("command timed out after {}ms", .budget.as_millis())]
    Timeout {
        /// The deadline that was exceeded.
        budget: Duration,
    },

    /// The server violated the status/identifier contract or returned a body
    /// that is not a valid response.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The server no longer knows the tracked command.
    #[error("command {command_id} not found on the server")]
    CommandNotFound { command_id: CommandId },

    /// The command stayed pending for every allowed status query.
    #[error(
        "command {command_id} still pending after {attempts} status queries ({}ms)",
        .elapsed.as_millis()
    )]
    PollingTimeout {
        command_id: CommandId,
        /// Number of status queries issued.
        attempts: u32,
        /// Wall-clock time spent polling.
        elapsed: Duration,
    },

    /// The connection configuration cannot be used (e.g. HTTP mode without
    /// an endpoint).
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Persisted settings could not be read or written.
    #[error("settings error: {message}")]
    Settings { message: String },
}

impl KkmError {
    /// Wraps a connection-level error.
    pub fn network(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network {
            source: Box::new(source),
        }
    }

    /// Builds a [`KkmError::Protocol`] from any message.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Always `false`: this layer never re-issues a command after a failure.
    ///
    /// Kept as an explicit query so wrappers that do retry can see the
    /// decision instead of guessing from the variant.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// `true` for connection-level failures, the only kind an opt-in offline
    /// fallback may substitute another transport for.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Stable snake_case label for structured logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransportUnavailable { .. } => "transport_unavailable",
            Self::Transport { .. } => "transport",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Protocol { .. } => "protocol",
            Self::CommandNotFound { .. } => "command_not_found",
            Self::PollingTimeout { .. } => "polling_timeout",
            Self::Configuration { .. } => "configuration",
            Self::Settings { .. } => "settings",
        }
    }
}
