//! The emulated device server.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use protocol::{
    Command, CommandExecutor, CommandId, CommandKind, ConnectionConfig, KkmError, Response,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, warn};

use crate::config::EmulatorConfig;
use crate::fixtures;

/// Final answer held back until enough `GetRezult` queries arrived.
struct Deferred {
    command: &'static str,
    remaining: u32,
    response: Response,
    /// Insertion order, used to pick the eviction victim.
    seq: u64,
}

/// Bounded set of deferred results keyed by command id.
#[derive(Default)]
struct DeferredTable {
    entries: HashMap<CommandId, Deferred>,
    next_seq: u64,
}

impl DeferredTable {
    /// Stores `deferred` under `id`, evicting the oldest entries while the
    /// table holds `capacity` or more other commands.
    fn insert(&mut self, id: CommandId, mut deferred: Deferred, capacity: usize) {
        self.entries.remove(&id);
        while self.entries.len() >= capacity.max(1) {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            warn!(command_id = %oldest, capacity, "dropped oldest deferred result");
        }
        deferred.seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(id, deferred);
    }
}

/// An in-process stand-in for the KKM Server.
///
/// Answers every command the client can send with plausible payloads and
/// status codes. With [`EmulatorConfig::async_steps`] set, mutating commands
/// are answered `Run` first and complete only through `GetRezult`, which
/// exercises the same polling path a slow device does.
///
/// # Example
///
/// ```no_run
/// use emulator::{Emulator, EmulatorConfig};
///
/// let emulator = Emulator::new(EmulatorConfig::deterministic(7).with_async_steps(2));
/// ```
pub struct Emulator {
    config: EmulatorConfig,
    rng: Mutex<StdRng>,
    deferred: Mutex<DeferredTable>,
}

impl Emulator {
    pub fn new(config: EmulatorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng: Mutex::new(rng),
            deferred: Mutex::new(DeferredTable::default()),
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Commands answered `Run` whose final result has not been collected yet.
    pub fn pending_commands(&self) -> usize {
        self.deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    fn sample_latency(&self) -> Duration {
        let (min, max) = self.config.latency;
        if max <= min {
            return min;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let millis = rng.gen_range(min.as_millis() as u64..=max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    fn respond(&self, command: &Command) -> Response {
        let id = command.id();
        if command.kind.is_status_query() {
            return self.collect(id);
        }

        let response = self.complete(&command.kind, id);
        let deferrable = !matches!(command.kind, CommandKind::List(_));
        match id {
            Some(id) if deferrable && self.config.async_steps > 0 => {
                self.deferred
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(
                        id.clone(),
                        Deferred {
                            command: command.name(),
                            remaining: self.config.async_steps,
                            response,
                            seq: 0,
                        },
                        self.config.max_pending,
                    );
                fixtures::running(command.name(), id)
            }
            _ => response,
        }
    }

    /// Final response for a command, as if the device finished it now.
    fn complete(&self, kind: &CommandKind, id: Option<&CommandId>) -> Response {
        let rates = self.config.error_rates;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let rng = &mut *rng;
        match kind {
            CommandKind::List(filter) => fixtures::list(filter),
            CommandKind::OpenShift(params) => fixtures::shift(rng, rates.shift, true, params, id),
            CommandKind::CloseShift(params) => fixtures::shift(rng, rates.shift, false, params, id),
            CommandKind::PayByPaymentCard(payment) => {
                fixtures::payment(rng, rates.payment, payment, id)
            }
            CommandKind::ReturnPaymentByPaymentCard(reversal) => {
                fixtures::reversal(true, reversal, id)
            }
            CommandKind::CancelPaymentByPaymentCard(reversal) => {
                fixtures::reversal(false, reversal, id)
            }
            CommandKind::RegisterCheck(check) => {
                fixtures::register_check(rng, rates.check, check, id)
            }
            CommandKind::GetResult => fixtures::not_found(id),
        }
    }

    /// Answers a `GetRezult` query.
    fn collect(&self, id: Option<&CommandId>) -> Response {
        let Some(id) = id else {
            return fixtures::not_found(None);
        };
        let mut deferred = self.deferred.lock().unwrap_or_else(PoisonError::into_inner);
        match deferred.entries.entry(id.clone()) {
            Entry::Vacant(_) => fixtures::not_found(Some(id)),
            Entry::Occupied(mut slot) => {
                let (done, command) = {
                    let entry = slot.get_mut();
                    entry.remaining = entry.remaining.saturating_sub(1);
                    (entry.remaining == 0, entry.command)
                };
                if done {
                    slot.remove().response
                } else {
                    fixtures::running(command, id)
                }
            }
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(EmulatorConfig::default())
    }
}

impl std::fmt::Debug for Emulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("config", &self.config)
            .field("pending_commands", &self.pending_commands())
            .finish()
    }
}

#[async_trait]
impl CommandExecutor for Emulator {
    fn name(&self) -> &'static str {
        "emulator"
    }

    #[instrument(name = "kkm.emulate", skip_all, fields(command = command.name()))]
    async fn execute(
        &self,
        _connection: &ConnectionConfig,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, KkmError> {
        let latency = self.sample_latency();
        if latency > timeout {
            tokio::time::sleep(timeout).await;
            return Err(KkmError::Timeout { budget: timeout });
        }
        tokio::time::sleep(latency).await;

        let response = self.respond(command);
        debug!(
            status = response.status_code,
            latency_ms = latency.as_millis() as u64,
            "emulated response"
        );
        Ok(response)
    }
}
