//! Scripted executor shared by the client integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use client::{ConnectionSettings, KkmClient, Transports};
use protocol::{
    Command, CommandExecutor, CommandId, ConnectionConfig, KkmError, KkmStatus, Response,
};

/// Replays a fixed sequence of results and records every command it is given.
pub struct ScriptedExecutor {
    name: &'static str,
    script: Mutex<VecDeque<Result<Response, KkmError>>>,
    calls: Mutex<Vec<(Command, Duration)>>,
}

impl ScriptedExecutor {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn push(&self, result: Result<Response, KkmError>) -> &Self {
        self.script.lock().expect("script lock").push_back(result);
        self
    }

    pub fn push_status(&self, status: KkmStatus, id: Option<&str>) -> &Self {
        self.push(Ok(response(status, id)))
    }

    pub fn calls(&self) -> Vec<(Command, Duration)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn commands(&self) -> Vec<Command> {
        self.calls().into_iter().map(|(c, _)| c).collect()
    }

    /// Number of `GetRezult` queries received.
    pub fn query_count(&self) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.kind.is_status_query())
            .count()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(
        &self,
        _connection: &ConnectionConfig,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, KkmError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((command.clone(), timeout));
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(KkmError::protocol("script exhausted")))
    }
}

pub fn response(status: KkmStatus, id: Option<&str>) -> Response {
    Response {
        command_id: id.and_then(CommandId::new),
        ..Response::with_status(status)
    }
}

/// A client in HTTP mode whose HTTP transport is `http` and AddIn transport is `addin`.
pub fn client_with(http: Arc<ScriptedExecutor>, addin: Arc<ScriptedExecutor>) -> KkmClient {
    let settings = Arc::new(ConnectionSettings::in_memory(ConnectionConfig::default()));
    KkmClient::new(settings, Transports::new(http, addin))
}

pub fn kkm_client(http: Arc<ScriptedExecutor>) -> KkmClient {
    client_with(http, ScriptedExecutor::new("addin"))
}
