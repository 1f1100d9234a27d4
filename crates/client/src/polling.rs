//! Polling Engine.
//!
//! Drives a command the device completes asynchronously:
//!
//! ```text
//! execute ──► Ok / Error / unknown ─────────────────────────► return response
//!    │
//!    └──► Run / NotRun ──► no IdCommand ────────────────────► Protocol error
//!                 │
//!                 └──► loop max_attempts times:
//!                        sleep(interval)
//!                        GetRezult(id) ──► Ok / Error ──────► return response
//!                                     ├──► NotFound ────────► CommandNotFound
//!                                     ├──► transport error ─► propagate
//!                                     └──► other ───────────► next attempt
//!                      exhausted ───────────────────────────► PollingTimeout
//! ```
//!
//! Only the `GetRezult` query is ever repeated; the original command is sent
//! exactly once. Each query is a full [`KkmClient::execute`] call with its own
//! deadline, so abandoning the returned future also drops the in-flight
//! request.

use std::time::Duration;

use protocol::{
    initial_disposition, poll_step, Command, CommandId, InitialDisposition, KkmError, PollStep,
    PollingPolicy, Response,
};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::KkmClient;

/// State of one asynchronous command while it is being tracked.
///
/// Lives only for the duration of [`KkmClient::track`].
#[derive(Debug)]
pub struct PollingSession {
    command_id: CommandId,
    attempts: u32,
    policy: PollingPolicy,
    started: Instant,
}

impl PollingSession {
    pub fn start(command_id: CommandId, policy: PollingPolicy) -> Self {
        Self {
            command_id,
            attempts: 0,
            policy,
            started: Instant::now(),
        }
    }

    pub fn command_id(&self) -> &CommandId {
        &self.command_id
    }

    /// Number of status queries started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Starts the next attempt, or returns `false` once the policy's attempt
    /// budget is spent.
    pub fn next_attempt(&mut self) -> bool {
        if self.attempts >= self.policy.max_attempts {
            return false;
        }
        self.attempts += 1;
        true
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn not_found(self) -> KkmError {
        KkmError::CommandNotFound {
            command_id: self.command_id,
        }
    }

    fn timed_out(self) -> KkmError {
        let elapsed = self.elapsed();
        KkmError::PollingTimeout {
            command_id: self.command_id,
            attempts: self.attempts,
            elapsed,
        }
    }
}

impl KkmClient {
    /// Executes `command` and, if the device completes it asynchronously,
    /// polls `GetRezult` under `policy` until it reaches a final status.
    ///
    /// # Errors
    ///
    /// Any error from the initial call or from a status query;
    /// [`KkmError::Protocol`] for a pending response without `IdCommand`;
    /// [`KkmError::CommandNotFound`]; [`KkmError::PollingTimeout`].
    pub async fn execute_with_polling(
        &self,
        command: Command,
        policy: PollingPolicy,
    ) -> Result<Response, KkmError> {
        let initial = self.execute(command).await?;
        self.track(initial, policy).await
    }

    /// Applies the polling state machine to a response already received.
    ///
    /// # Errors
    ///
    /// See [`KkmClient::execute_with_polling`].
    pub async fn track(
        &self,
        initial: Response,
        policy: PollingPolicy,
    ) -> Result<Response, KkmError> {
        match initial_disposition(&initial) {
            InitialDisposition::Done => Ok(initial),
            InitialDisposition::MissingId => Err(KkmError::protocol(format!(
                "missing identifier for asynchronous command (status {})",
                initial.status_code
            ))),
            InitialDisposition::Track(id) => self.poll(PollingSession::start(id, policy)).await,
        }
    }

    #[instrument(
        name = "kkm.poll",
        skip_all,
        fields(
            command_id = %session.command_id(),
            max_attempts = session.policy.max_attempts,
            interval_ms = session.policy.interval.as_millis() as u64,
        )
    )]
    async fn poll(&self, mut session: PollingSession) -> Result<Response, KkmError> {
        info!("command running asynchronously, polling for result");

        while session.next_attempt() {
            tokio::time::sleep(session.policy.interval).await;
            debug!(attempt = session.attempts(), "querying command status");

            let response = self.get_result(session.command_id().clone()).await?;
            match poll_step(&response) {
                PollStep::Complete => {
                    info!(
                        attempt = session.attempts(),
                        status = %response.status_text(),
                        "asynchronous command finished"
                    );
                    return Ok(response);
                }
                PollStep::Lost => {
                    warn!(attempt = session.attempts(), "server lost track of command");
                    return Err(session.not_found());
                }
                PollStep::Continue => {}
            }
        }

        warn!(attempts = session.attempts(), "command still pending, giving up");
        Err(session.timed_out())
    }
}
