//! `kkm`: command-line client for the KKM Server.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Wire observability**: `tracing-subscriber` with a text or JSON layer
//!    and an optional OpenTelemetry OTLP exporter (see [`observability`]).
//! 2. **Load connection settings** from a JSON file and apply per-run
//!    overrides (`--mode`, `--endpoint`, credentials).
//! 3. **Construct transports**: the HTTP executor (or the emulator with
//!    `--emulator`), the add-in executor, and the optional offline fallback.
//! 4. **Run one operation** and print the final response as pretty JSON,
//!    followed by its status text.
//!
//! Exit codes: `0` when the device reported success, `2` when it reported
//! any other status, `1` when the command could not be completed at all.

mod observability;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use addin::AddInExecutor;
use client::{
    CardPaymentRequest, ConnectionSettings, FallbackPolicy, FileSettingsStore, KkmClient,
    Transports,
};
use emulator::{Emulator, EmulatorConfig};
use http_transport::HttpExecutor;
use protocol::{
    status_text, CardReversal, CommandExecutor, CommandId, ConnectionConfig, DeviceNumber,
    ListDevices, Response, ShiftParams, TransportMode, UniversalId, DEFAULT_ENDPOINT,
};

use crate::observability::LogFormat;

/// `GetRezult` queries the emulator wants before a mutating command completes.
const EMULATOR_ASYNC_STEPS: u32 = 2;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "kkm", version)]
#[command(about = "Drive a fiscal cash register through the KKM Server")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Operation,
}

#[derive(Args)]
struct ConnectionArgs {
    /// Path to the saved connection settings
    #[arg(long, env = "KKM_SETTINGS", default_value = "kkm-settings.json")]
    settings: PathBuf,

    /// Transport for this run only (AddIn or HTTP)
    #[arg(long)]
    mode: Option<TransportMode>,

    /// Device server URL for this run only (HTTP mode)
    #[arg(long)]
    endpoint: Option<String>,

    /// HTTP Basic user
    #[arg(long, env = "KKM_USER")]
    user: Option<String>,

    /// HTTP Basic password
    #[arg(long, env = "KKM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Talk to the built-in emulator instead of a device server
    #[arg(long)]
    emulator: bool,

    /// Seed for the emulator's random responses
    #[arg(long)]
    emulator_seed: Option<u64>,

    /// Answer from the emulator when the device server is unreachable
    #[arg(long, conflicts_with = "emulator")]
    offline_fallback: bool,
}

#[derive(Subcommand)]
enum Operation {
    #[command(flatten)]
    Device(DeviceOperation),
    /// Describe a status code
    StatusText {
        #[arg(allow_negative_numbers = true)]
        code: i64,
    },
    /// Show or change the saved connection settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Operations that talk to the device server.
#[derive(Subcommand)]
enum DeviceOperation {
    /// List devices registered in the server
    Devices {
        /// Only this device (0 lists all)
        #[arg(long, default_value_t = 0)]
        device: u32,
        /// List devices disabled in the server configuration instead
        #[arg(long)]
        inactive: bool,
    },
    /// Open a cashier shift
    OpenShift(ShiftArgs),
    /// Close the current shift and print the Z-report
    CloseShift(ShiftArgs),
    /// Charge a payment card
    Pay {
        #[arg(long)]
        amount: f64,
        /// Receipt number shown on the terminal (default TEST-<millis>)
        #[arg(long)]
        receipt: Option<String>,
        #[arg(long, default_value_t = 0)]
        device: u32,
    },
    /// Refund an earlier card payment
    Refund(ReversalArgs),
    /// Cancel an earlier card payment
    Cancel(ReversalArgs),
    /// Query the result of a previously issued command
    Result {
        /// The command's IdCommand
        id: String,
    },
}

#[derive(Args)]
struct ShiftArgs {
    #[arg(long, default_value_t = 0)]
    device: u32,
    #[arg(long, default_value = protocol::DEFAULT_CASHIER_NAME)]
    cashier: String,
    #[arg(long, default_value = protocol::DEFAULT_CASHIER_VATIN)]
    cashier_vatin: String,
}

impl ShiftArgs {
    fn into_params(self) -> ShiftParams {
        ShiftParams {
            device: DeviceNumber::new(self.device),
            cashier_name: self.cashier,
            cashier_vatin: self.cashier_vatin,
            ..ShiftParams::default()
        }
    }
}

#[derive(Args)]
struct ReversalArgs {
    #[arg(long)]
    amount: f64,
    /// UniversalID returned by the original payment
    #[arg(long)]
    universal_id: String,
    #[arg(long, default_value_t = 0)]
    device: u32,
}

impl ReversalArgs {
    fn into_reversal(self) -> Result<CardReversal> {
        let universal_id =
            UniversalId::new(self.universal_id).context("--universal-id must not be empty")?;
        Ok(CardReversal {
            device: DeviceNumber::new(self.device),
            inn: String::new(),
            amount: self.amount,
            universal_id,
        })
    }
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the settings in effect
    Show,
    /// Save a transport mode (and, for HTTP, an endpoint)
    Set {
        #[arg(long)]
        mode: TransportMode,
        #[arg(long)]
        endpoint: Option<String>,
    },
}

/// What `config show` prints. Never includes the password.
#[derive(Serialize)]
struct ConfigView<'a> {
    mode: TransportMode,
    endpoint: Option<&'a str>,
    credentials: bool,
    settings_file: &'a std::path::Path,
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Applies `--mode`/`--endpoint` without persisting them.
///
/// An explicit endpoint is rejected when the effective mode is AddIn, since
/// that transport has no URL to override.
fn with_overrides(
    mut config: ConnectionConfig,
    args: &ConnectionArgs,
) -> Result<ConnectionConfig> {
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    let endpoint = args.endpoint.clone().filter(|e| !e.is_empty());
    match config.mode {
        TransportMode::AddIn => {
            if let Some(endpoint) = endpoint {
                bail!(
                    "--endpoint {endpoint} has no effect in AddIn mode; pass --mode http to use it"
                );
            }
            config.endpoint = None;
        }
        TransportMode::Http => {
            if let Some(endpoint) = endpoint {
                config.endpoint = Some(endpoint);
            } else if config.endpoint.is_none() {
                config.endpoint = Some(DEFAULT_ENDPOINT.to_string());
            }
        }
    }
    Ok(config)
}

fn emulator(args: &ConnectionArgs) -> Arc<Emulator> {
    let config = EmulatorConfig {
        seed: args.emulator_seed,
        async_steps: EMULATOR_ASYNC_STEPS,
        ..EmulatorConfig::default()
    };
    Arc::new(Emulator::new(config))
}

fn build_client(args: &ConnectionArgs, saved: &ConnectionSettings) -> Result<KkmClient> {
    let settings = ConnectionSettings::in_memory(with_overrides(saved.get(), args)?);
    if args.user.is_some() || args.password.is_some() {
        settings.set_credentials(
            args.user.clone().unwrap_or_default(),
            args.password.clone().unwrap_or_default(),
        );
    }

    let http: Arc<dyn CommandExecutor> = if args.emulator {
        info!("using the built-in emulator instead of the device server");
        emulator(args)
    } else {
        Arc::new(HttpExecutor::new())
    };
    // No add-in host exists outside an embedding application.
    let addin = Arc::new(AddInExecutor::unavailable());

    let client = KkmClient::new(Arc::new(settings), Transports::new(http, addin));
    Ok(if args.offline_fallback {
        client.with_fallback(FallbackPolicy::Substitute(emulator(args)))
    } else {
        client
    })
}

fn print_response(response: &Response) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(response).context("failed to render response")?;
    println!("{json}");
    println!("status: {} ({})", response.status_code, response.status_text());
    if !response.error.is_empty() {
        println!("error: {}", response.error);
    }
    Ok(if response.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

async fn load_settings(path: &std::path::Path) -> Result<ConnectionSettings> {
    let store = Arc::new(FileSettingsStore::new(path));
    let saved = ConnectionSettings::load(store)
        .await
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    debug!(settings = ?saved, "settings loaded");
    Ok(saved)
}

async fn run(command: Operation, args: ConnectionArgs) -> Result<ExitCode> {
    match command {
        Operation::StatusText { code } => {
            println!("{}", status_text(code));
            Ok(ExitCode::SUCCESS)
        }
        Operation::Config { action } => {
            let saved = load_settings(&args.settings).await?;
            configure(action, &saved, &args.settings).await
        }
        Operation::Device(operation) => {
            let saved = load_settings(&args.settings).await?;
            let kkm = build_client(&args, &saved)?;
            let response = send(&kkm, operation).await?;
            print_response(&response)
        }
    }
}

async fn send(kkm: &KkmClient, operation: DeviceOperation) -> Result<Response> {
    let response = match operation {
        DeviceOperation::Devices { device, inactive } => {
            let filter = ListDevices {
                device: DeviceNumber::new(device),
                active: !inactive,
                ..ListDevices::default()
            };
            kkm.list_devices(filter).await?
        }
        DeviceOperation::OpenShift(args) => kkm.open_shift(args.into_params()).await?,
        DeviceOperation::CloseShift(args) => kkm.close_shift(args.into_params()).await?,
        DeviceOperation::Pay {
            amount,
            receipt,
            device,
        } => {
            let request = CardPaymentRequest {
                device: DeviceNumber::new(device),
                receipt_number: receipt,
                ..CardPaymentRequest::new(amount)
            };
            kkm.pay_by_card(request).await?
        }
        DeviceOperation::Refund(args) => kkm.return_card_payment(args.into_reversal()?).await?,
        DeviceOperation::Cancel(args) => kkm.cancel_card_payment(args.into_reversal()?).await?,
        DeviceOperation::Result { id } => {
            let id = CommandId::new(id).context("command id must not be empty")?;
            kkm.get_result(id).await?
        }
    };
    Ok(response)
}

async fn configure(
    action: ConfigAction,
    saved: &ConnectionSettings,
    path: &std::path::Path,
) -> Result<ExitCode> {
    if let ConfigAction::Set { mode, endpoint } = action {
        saved
            .set_connection(mode, endpoint)
            .await
            .context("failed to save connection settings")?;
    }
    let config = saved.get();
    let view = ConfigView {
        mode: config.mode,
        endpoint: config.endpoint.as_deref(),
        credentials: config.active_credentials().is_some(),
        settings_file: path,
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let telemetry = observability::init(cli.log_format)?;

    let outcome = run(cli.command, cli.connection).await;

    telemetry.shutdown();
    outcome
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kkm").chain(args.iter().copied())).expect("valid")
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mode_override_to_addin_drops_endpoint() {
        let cli = parse(&["--mode", "addin", "devices"]);
        let config = with_overrides(ConnectionConfig::default(), &cli.connection).expect("valid");
        assert_eq!(config.mode, TransportMode::AddIn);
        assert_eq!(config.endpoint, None);
    }

    #[test]
    fn endpoint_override_applies_in_http_mode() {
        let cli = parse(&["--endpoint", "http://10.0.0.5:5893/", "devices"]);
        let config = with_overrides(ConnectionConfig::default(), &cli.connection).expect("valid");
        assert_eq!(config.endpoint.as_deref(), Some("http://10.0.0.5:5893/"));
    }

    #[test]
    fn endpoint_with_addin_mode_is_rejected() {
        let cli = parse(&["--mode", "addin", "--endpoint", "http://10.0.0.5:5893/", "devices"]);
        let err = with_overrides(ConnectionConfig::default(), &cli.connection)
            .expect_err("endpoint cannot apply to AddIn");
        assert!(err.to_string().contains("AddIn"), "{err}");
    }

    #[test]
    fn endpoint_with_saved_addin_mode_is_rejected() {
        let cli = parse(&["--endpoint", "http://10.0.0.5:5893/", "devices"]);
        let saved = ConnectionConfig {
            mode: TransportMode::AddIn,
            endpoint: None,
            credentials: None,
        };
        assert!(with_overrides(saved, &cli.connection).is_err());
    }

    #[tokio::test]
    async fn status_text_runs_without_reading_settings() {
        let dir = tempfile::tempdir().expect("temp dir");
        let settings = dir.path().join("kkm-settings.json");
        std::fs::write(&settings, "not json").expect("write settings");
        let path = settings.to_str().expect("utf-8 path");

        let status = parse(&["--settings", path, "status-text", "3"]);
        run(status.command, status.connection)
            .await
            .expect("status text ignores settings");

        let devices = parse(&["--settings", path, "devices"]);
        assert!(run(devices.command, devices.connection).await.is_err());
    }

    #[test]
    fn http_without_saved_endpoint_uses_default() {
        let cli = parse(&["--mode", "http", "devices"]);
        let saved = ConnectionConfig {
            mode: TransportMode::AddIn,
            endpoint: None,
            credentials: None,
        };
        let config = with_overrides(saved, &cli.connection).expect("valid");
        assert_eq!(config.endpoint.as_deref(), Some(DEFAULT_ENDPOINT));
    }

    #[test]
    fn emulator_and_offline_fallback_conflict() {
        let result =
            Cli::try_parse_from(["kkm", "--emulator", "--offline-fallback", "devices"]);
        assert!(result.is_err());
    }

    #[test]
    fn negative_status_code_parses() {
        let cli = parse(&["status-text", "-1"]);
        assert!(matches!(cli.command, Operation::StatusText { code: -1 }));
    }

    #[test]
    fn empty_universal_id_is_rejected() {
        let args = ReversalArgs {
            amount: 1.0,
            universal_id: String::new(),
            device: 0,
        };
        assert!(args.into_reversal().is_err());
    }
}
