//! Mirador Connector CLI
//!
//! Command-line interface for inspecting a Mirador Core instance with the same
//! client and frame projection the connector backend uses.
//!
//! # Usage
//!
//! ```bash
//! mirador --help
//! mirador --url http://mirador.local health
//! mirador schema metrics http_requests_total
//! mirador logs 'level:ERROR' --limit 50
//! mirador metrics 'rate(http_requests_total[5m])' --step 30s
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as TimeDelta, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shared::client::{ClientConfig, MiradorClient};
use shared::frame::{logs_to_frames, metrics_to_frames, traces_to_frames};
use shared::models::{
    format_rfc3339_nano, parse_rfc3339, LogsQuery, MetricsQuery, SchemaKind, TimeSpan,
    TracesQuery,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Mirador CLI - query and inspect a Mirador Core instance
#[derive(Parser)]
#[command(name = "mirador")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mirador Core API URL
    #[arg(short, long, env = "MIRADOR_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Tenant forwarded in X-Mirador-Tenant
    #[arg(long, env = "MIRADOR_TENANT", default_value = "")]
    tenant: String,

    /// Bearer token
    #[arg(long, env = "MIRADOR_TOKEN", default_value = "", hide_env_values = true)]
    token: String,

    /// Request timeout in milliseconds (0 = 30s)
    #[arg(long, env = "MIRADOR_TIMEOUT_MS", default_value_t = 0)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API answers its health endpoint
    Health,

    /// Print a schema document, or one entry of it
    Schema {
        /// Signal kind
        #[arg(value_enum)]
        kind: KindArg,

        /// Entry name
        name: Option<String>,
    },

    /// Run a logs query and print the resulting frames
    Logs {
        /// Query string
        query: String,

        /// Maximum number of rows
        #[arg(short, long, default_value_t = 0)]
        limit: u64,

        /// Fields to return
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        #[command(flatten)]
        window: Window,
    },

    /// Run a metrics range query and print the resulting frames
    Metrics {
        /// Query expression
        query: String,

        /// Resolution step
        #[arg(short, long, default_value = "1m")]
        step: String,

        #[command(flatten)]
        window: Window,
    },

    /// Search traces and print the resulting frame
    Traces {
        /// Query string
        query: String,

        /// Maximum number of traces
        #[arg(short, long, default_value_t = 0)]
        limit: u64,

        #[command(flatten)]
        window: Window,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Logs,
    Metrics,
    Traces,
}

impl From<KindArg> for SchemaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Logs => Self::Logs,
            KindArg::Metrics => Self::Metrics,
            KindArg::Traces => Self::Traces,
        }
    }
}

/// Query time window. Defaults to the last hour.
#[derive(Debug, Clone, clap::Args)]
struct Window {
    /// Start of the window (RFC 3339)
    #[arg(long, value_parser = parse_time)]
    from: Option<DateTime<Utc>>,

    /// End of the window (RFC 3339)
    #[arg(long, value_parser = parse_time)]
    to: Option<DateTime<Utc>>,
}

impl Window {
    fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let to = self.to.unwrap_or(now);
        let from = self.from.unwrap_or(to - TimeDelta::hours(1));
        (from, to)
    }
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_rfc3339(raw).ok_or_else(|| format!("invalid RFC 3339 timestamp: {raw}"))
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.url)
            .with_tenant_id(&self.tenant)
            .with_bearer_token(&self.token)
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, command: Commands, token: &CancellationToken) -> Result<()> {
    let client = MiradorClient::new(&cli.client_config())
        .with_context(|| format!("Invalid Mirador URL {}", cli.url))?;
    let now = Utc::now();

    match command {
        Commands::Health => {
            client.health(token).await?;
            println!("Mirador Core at {} is healthy", client.base_url());
        }
        Commands::Schema { kind, name } => {
            tracing::debug!(kind = %SchemaKind::from(kind), ?name, "Fetching schema");
            match (SchemaKind::from(kind), name.as_deref()) {
                (SchemaKind::Logs, None) => print_json(&client.logs_schema(token).await?)?,
                (SchemaKind::Logs, Some(name)) => {
                    print_json(&client.log_field_schema(token, name).await?)?;
                }
                (SchemaKind::Metrics, None) => print_json(&client.metrics_schema(token).await?)?,
                (SchemaKind::Metrics, Some(name)) => {
                    print_json(&client.metric_schema(token, name).await?)?;
                }
                (SchemaKind::Traces, None) => print_json(&client.traces_schema(token).await?)?,
                (SchemaKind::Traces, Some(name)) => {
                    print_json(&client.trace_service_schema(token, name).await?)?;
                }
            }
        }
        Commands::Logs {
            query,
            limit,
            fields,
            window,
        } => {
            let (from, to) = window.resolve(now);
            let payload = LogsQuery {
                query,
                limit,
                fields,
                time_range: Some(TimeSpan::new(&from, &to)),
            };
            let response = client.query_logs(token, &payload).await?;
            tracing::debug!(rows = response.results.len(), took = response.took, "Logs query done");
            print_json(&logs_to_frames(&response))?;
        }
        Commands::Metrics {
            query,
            step,
            window,
        } => {
            let (from, to) = window.resolve(now);
            let payload = MetricsQuery {
                query,
                step,
                start: format_rfc3339_nano(&from),
                end: format_rfc3339_nano(&to),
            };
            let response = client.query_metrics(token, &payload).await?;
            print_json(&metrics_to_frames(&response))?;
        }
        Commands::Traces {
            query,
            limit,
            window,
        } => {
            let (from, to) = window.resolve(now);
            let payload = TracesQuery {
                query,
                limit,
                start: format_rfc3339_nano(&from),
                end: format_rfc3339_nano(&to),
            };
            let response = client.query_traces(token, &payload).await?;
            print_json(&traces_to_frames(&response))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let mut cli = Cli::parse();
    let Some(command) = cli.command.take() else {
        println!("Mirador CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for usage information");
        return Ok(());
    };

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    run(cli, command, &token).await
}
