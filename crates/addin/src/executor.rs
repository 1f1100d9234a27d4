//! Async [`CommandExecutor`] over an [`AddInHost`].

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use protocol::{Command, CommandExecutor, ConnectionConfig, KkmError, Response};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::host::AddInHost;

const TRANSPORT: &str = "addin";

enum Reply {
    Success(Value),
    Failure(String),
}

/// Sender shared by both callbacks. Whichever fires first takes it.
type ReplySlot = Arc<Mutex<Option<oneshot::Sender<Reply>>>>;

fn settle(slot: &ReplySlot, reply: Reply) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    match sender {
        // The receiver is gone once the call timed out; the late reply is dropped.
        Some(tx) => {
            if tx.send(reply).is_err() {
                debug!("add-in reply arrived after the caller gave up");
            }
        }
        None => warn!("add-in host replied more than once; ignoring the extra reply"),
    }
}

/// Executes commands through a host-injected add-in.
///
/// The host is optional: when the add-in is not installed every call fails
/// with [`KkmError::TransportUnavailable`] instead of waiting.
#[derive(Clone, Default)]
pub struct AddInExecutor {
    host: Option<Arc<dyn AddInHost>>,
}

impl AddInExecutor {
    pub fn new(host: Option<Arc<dyn AddInHost>>) -> Self {
        Self { host }
    }

    /// An executor for an environment without the add-in.
    pub fn unavailable() -> Self {
        Self { host: None }
    }

    pub fn is_available(&self) -> bool {
        self.host.is_some()
    }
}

impl std::fmt::Debug for AddInExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddInExecutor")
            .field("available", &self.is_available())
            .finish()
    }
}

#[async_trait]
impl CommandExecutor for AddInExecutor {
    fn name(&self) -> &'static str {
        TRANSPORT
    }

    /// The connection's endpoint and credentials are not used: the host owns
    /// its own link to the server.
    async fn execute(
        &self,
        _connection: &ConnectionConfig,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, KkmError> {
        let host = self.host.as_ref().ok_or(KkmError::TransportUnavailable {
            transport: TRANSPORT,
        })?;
        let payload = serde_json::to_value(command)
            .map_err(|e| KkmError::protocol(format!("failed to encode {}: {e}", command.name())))?;

        let (tx, rx) = oneshot::channel();
        let on_success_slot: ReplySlot = Arc::new(Mutex::new(Some(tx)));
        let on_error_slot = Arc::clone(&on_success_slot);

        debug!(
            command = command.name(),
            timeout_ms = timeout.as_millis() as u64,
            "handing command to add-in host"
        );
        host.execute(
            payload,
            Box::new(move |body| settle(&on_success_slot, Reply::Success(body))),
            Box::new(move |message| settle(&on_error_slot, Reply::Failure(message))),
        );

        let reply = match tokio::time::timeout(timeout, rx).await {
            Err(_) => return Err(KkmError::Timeout { budget: timeout }),
            Ok(Err(_)) => {
                return Err(KkmError::Transport {
                    status: None,
                    message: "add-in host released the command without replying".into(),
                })
            }
            Ok(Ok(reply)) => reply,
        };

        match reply {
            Reply::Success(body) => serde_json::from_value(body)
                .map_err(|e| KkmError::protocol(format!("invalid response body: {e}"))),
            Reply::Failure(message) => Err(KkmError::Transport {
                status: None,
                message,
            }),
        }
    }
}
