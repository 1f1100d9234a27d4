//! [`KkmClient`]: correlate, select a transport, execute.

use std::sync::Arc;
use std::time::Duration;

use protocol::{
    effective_timeout, ensure_id, Command, CommandId, KkmError, Response, TransportMode,
    DEFAULT_CALL_TIMEOUT,
};
use tracing::{debug, field, instrument, warn, Span};

use crate::dispatch::{FallbackPolicy, Transports};
use crate::settings::ConnectionSettings;

/// Client for one KKM Server connection.
///
/// Cheap to share behind an `Arc`; independent commands may run concurrently
/// from several tasks. The only shared state is the connection settings,
/// which are read once per call.
#[derive(Debug)]
pub struct KkmClient {
    pub(crate) settings: Arc<ConnectionSettings>,
    transports: Transports,
    fallback: FallbackPolicy,
    call_timeout: Duration,
}

impl KkmClient {
    /// Creates a client with the default 60 s call deadline and no fallback.
    pub fn new(settings: Arc<ConnectionSettings>, transports: Transports) -> Self {
        Self {
            settings,
            transports,
            fallback: FallbackPolicy::Disabled,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Opts in to substituting another transport on HTTP network failures.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Overrides the caller deadline used by [`KkmClient::execute`].
    #[must_use]
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// The connection settings this client reads on every call.
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// Executes `command` once with the client's default deadline.
    ///
    /// # Errors
    ///
    /// Whatever the selected executor reports; see [`KkmError`].
    pub async fn execute(&self, command: Command) -> Result<Response, KkmError> {
        self.execute_with_timeout(command, self.call_timeout).await
    }

    /// Executes `command` once.
    ///
    /// Assigns a [`CommandId`] if the command has none, picks the executor for
    /// the current transport mode, and applies [`effective_timeout`] to
    /// `timeout`. The command is never re-sent on failure.
    ///
    /// # Errors
    ///
    /// Whatever the selected executor reports; see [`KkmError`].
    #[instrument(
        name = "kkm.execute",
        skip_all,
        fields(command = command.name(), command_id = field::Empty, transport = field::Empty)
    )]
    pub async fn execute_with_timeout(
        &self,
        mut command: Command,
        timeout: Duration,
    ) -> Result<Response, KkmError> {
        let id = ensure_id(&mut command).clone();
        let connection = self.settings.get();
        let executor = self.transports.select(connection.mode);
        let deadline = effective_timeout(&command, timeout);

        let span = Span::current();
        span.record("command_id", field::display(&id));
        span.record("transport", executor.name());
        debug!(timeout_ms = deadline.as_millis() as u64, "sending command");

        let result = executor.execute(&connection, &command, deadline).await;
        let result = match (result, self.fallback.substitute()) {
            (Err(err), Some(substitute))
                if err.is_network() && connection.mode == TransportMode::Http =>
            {
                warn!(
                    error = %err,
                    fallback = substitute.name(),
                    "device server unreachable, substituting fallback transport"
                );
                substitute.execute(&connection, &command, deadline).await
            }
            (result, _) => result,
        };

        match &result {
            Ok(response) => debug!(
                status = response.status_code,
                status_text = %response.status_text(),
                "received response"
            ),
            Err(err) => warn!(error = %err, kind = err.kind(), "command failed"),
        }
        result
    }

    /// Queries the status of a previously issued command (`GetRezult`).
    ///
    /// # Errors
    ///
    /// Whatever the selected executor reports; see [`KkmError`].
    pub async fn get_result(&self, id: CommandId) -> Result<Response, KkmError> {
        self.execute(Command::get_result(id)).await
    }
}
