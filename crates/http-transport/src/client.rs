//! HTTP executor: `POST <endpoint>/Execute`.

use std::time::Duration;

use async_trait::async_trait;
use protocol::{Command, CommandExecutor, ConnectionConfig, KkmError, Response};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

use crate::error::{map_http_status, map_reqwest_error};

/// Content type the device server expects on `/Execute`.
const JSON_UTF8: &str = "application/json; charset=UTF-8";

/// Sends commands to the KKM Server's HTTP API.
///
/// Endpoint and credentials come from the [`ConnectionConfig`] passed to each
/// call, so one executor serves every configuration change.
///
/// # Example
///
/// ```no_run
/// use http_transport::HttpExecutor;
///
/// let executor = HttpExecutor::new();
/// ```
#[derive(Debug, Clone, Default)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a preconfigured client (proxy, TLS roots, …). Per-call deadlines
    /// still override any client-wide timeout.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandExecutor for HttpExecutor {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn execute(
        &self,
        connection: &ConnectionConfig,
        command: &Command,
        timeout: Duration,
    ) -> Result<Response, KkmError> {
        let url = connection.execute_url()?;
        let body = serde_json::to_vec(command)
            .map_err(|e| KkmError::protocol(format!("failed to encode {}: {e}", command.name())))?;

        debug!(
            url = %url,
            command = command.name(),
            timeout_ms = timeout.as_millis() as u64,
            "posting command to device server"
        );

        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, JSON_UTF8)
            .timeout(timeout)
            .body(body);
        if let Some(credentials) = connection.active_credentials() {
            request = request.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        if !status.is_success() {
            return Err(map_http_status(status, &text));
        }
        trace!(body = %text, "device server response");

        serde_json::from_str(&text)
            .map_err(|e| KkmError::protocol(format!("invalid response body: {e}")))
    }
}
