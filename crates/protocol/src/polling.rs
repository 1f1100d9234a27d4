//! Polling rules for commands the device completes asynchronously.
//!
//! The loop itself lives in the `client` crate; this module holds the pure
//! parts: how often and how long to poll, and what each query status means.

use std::time::Duration;

use crate::{Command, CommandId, KkmStatus, Response};

/// How many status queries to issue and how long to wait before each one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollingPolicy {
    /// Shift, refund, cancel and receipt commands: 30 queries, 2 s apart.
    pub const DEFAULT: Self = Self {
        max_attempts: 30,
        interval: Duration::from_millis(2_000),
    };

    /// Card payments wait on the cardholder: 60 queries, 3 s apart.
    pub const PAYMENT: Self = Self {
        max_attempts: 60,
        interval: Duration::from_millis(3_000),
    };

    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Picks the policy for a command kind.
    pub fn for_command(command: &Command) -> Self {
        if command.kind.is_payment() {
            Self::PAYMENT
        } else {
            Self::DEFAULT
        }
    }
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What the engine does with the command's first response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialDisposition {
    /// Return the response as is: `Ok`, `Error`, or a status outside the
    /// protocol.
    Done,
    /// Track the command by this identifier.
    Track(CommandId),
    /// `Run`/`NotRun` without an identifier to track.
    MissingId,
}

/// Classifies the first response of a command.
///
/// A `NotFound` first response is returned as is: only a status *query* can
/// lose track of a command.
pub fn initial_disposition(response: &Response) -> InitialDisposition {
    match response.status() {
        Some(status) if status.is_pending() => match &response.command_id {
            Some(id) => InitialDisposition::Track(id.clone()),
            None => InitialDisposition::MissingId,
        },
        _ => InitialDisposition::Done,
    }
}

/// What the engine does with one status query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// `Ok` or `Error`: return this response.
    Complete,
    /// `NotFound`: stop, the server lost the command.
    Lost,
    /// Anything else: query again.
    Continue,
}

/// Classifies one status query response.
pub fn poll_step(response: &Response) -> PollStep {
    match response.status() {
        Some(status) if status.is_complete() => PollStep::Complete,
        Some(KkmStatus::NotFound) => PollStep::Lost,
        _ => PollStep::Continue,
    }
}
