use alert_relay::{ApiRequest, Config, DrainReport, Method, OfflineClient, Outcome};
use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "alert-relay")]
#[command(about = "Offline-first delivery of emergency alert requests")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/alert-relay/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Treat the network as unavailable instead of probing it
  #[arg(long, global = true)]
  offline: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Read an endpoint, falling back to the cache when offline
  Get { endpoint: String },
  /// Write to an endpoint, queueing emergency writes when offline
  Send {
    endpoint: String,
    /// Request method
    #[arg(short, long, default_value = "POST")]
    method: Method,
    /// JSON body
    #[arg(short, long)]
    body: Option<String>,
  },
  /// Deliver queued requests now
  Sync,
  /// Show connectivity and queued requests
  Status,
  /// Probe connectivity and drain the queue on every reconnect until Ctrl-C
  Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _guard = init_tracing(&config)?;

  let mut client = if args.offline {
    OfflineClient::new(config, false)?
  } else {
    OfflineClient::connect(config).await?
  };

  match args.command {
    Command::Get { endpoint } => {
      let outcome = client.gateway().get(&endpoint).await?;
      print_outcome(outcome)?;
    }
    Command::Send {
      endpoint,
      method,
      body,
    } => {
      let body = body
        .map(|b| serde_json::from_str::<Value>(&b))
        .transpose()
        .map_err(|e| eyre!("Invalid JSON body: {}", e))?;
      let outcome = client
        .gateway()
        .request(ApiRequest::new(endpoint, method, body))
        .await?;
      print_outcome(outcome)?;
    }
    Command::Sync => {
      if !client.monitor().is_connected() {
        return Err(eyre!("Offline: queued requests will be sent once connected"));
      }
      let report = client.coordinator().drain().await?;
      print_json(&report_json(&report))?;
    }
    Command::Status => {
      let queued = client.gateway().queue().drain_snapshot()?;
      print_json(&json!({
        "connected": client.monitor().is_connected(),
        "server": client.config().server.url,
        "queued": queued.len(),
        "requests": queued
          .iter()
          .map(|r| json!({
            "id": r.id,
            "endpoint": r.endpoint,
            "method": r.method,
            "enqueued_at": r.enqueued_at,
            "priority": r.priority,
          }))
          .collect::<Vec<_>>(),
      }))?;
    }
    Command::Watch => {
      let sync = client.spawn_sync();
      let probe = client.spawn_probe();
      tracing::info!(
        connected = client.monitor().is_connected(),
        "watching connectivity"
      );

      tokio::signal::ctrl_c().await?;

      sync.abort();
      if let Some(probe) = probe {
        probe.abort();
      }
    }
  }

  Ok(())
}

fn init_tracing(config: &Config) -> Result<Option<WorkerGuard>> {
  let filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("alert_relay=info"));

  let (file_layer, guard) = match &config.logging.file {
    Some(path) => {
      let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
      let file_name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;

      let appender = tracing_appender::rolling::never(dir, file_name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      (
        Some(fmt::layer().with_writer(writer).with_ansi(false)),
        Some(guard),
      )
    }
    None => (None, None),
  };

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .with(file_layer)
    .init();

  Ok(guard)
}

fn report_json(report: &DrainReport) -> Value {
  json!({
    "attempted": report.attempted.len(),
    "delivered": report.delivered.len(),
    "failed": report
      .failed
      .iter()
      .map(|f| json!({ "id": f.request.id, "endpoint": f.request.endpoint, "reason": f.reason }))
      .collect::<Vec<_>>(),
    "retained": report.retained,
  })
}

/// Print the result; a non-2xx network response still prints but fails the command.
fn print_outcome(outcome: Outcome) -> Result<()> {
  let failed = outcome.failed_status();
  print_json(&outcome.into_json())?;
  match failed {
    Some(status) => Err(eyre!("Server responded with status {}", status)),
    None => Ok(()),
  }
}

fn print_json(value: &Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
