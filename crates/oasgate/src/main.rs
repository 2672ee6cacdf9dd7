//! oasgate: OpenAPI validation and publish gate.
//!
//! Serves the validation and publish endpoints, and runs the same pipeline
//! offline against files on disk.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use oasgate_core::{CatalogPublisher, PublishGate, Validator};
use oasgate_telemetry::{log_startup, LogFormat, Telemetry, TelemetryConfig};

mod api;
mod error;
mod report;
mod server;

use api::{AppState, UploadLimits};
use report::OutputFormat;

const DEFAULT_RULESET: &str = "rulesets/custom-ruleset.yaml";

#[derive(Parser, Debug)]
#[command(name = "oasgate", about = "OpenAPI validation and publish gate", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server.
    Serve(ServeArgs),

    /// Validate OpenAPI document(s) against the ruleset without a server.
    Validate {
        /// Document file(s) to validate.
        #[arg(short, long, required = true, num_args = 1..)]
        spec: Vec<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Ruleset file.
        #[arg(long, env = "OASGATE_RULESET", default_value = DEFAULT_RULESET)]
        ruleset: PathBuf,
    },

    /// Load a ruleset and list its rules.
    CheckRuleset {
        /// Ruleset file.
        #[arg(long, env = "OASGATE_RULESET", default_value = DEFAULT_RULESET)]
        ruleset: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "OASGATE_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// Ruleset file, loaded once at startup.
    #[arg(long, env = "OASGATE_RULESET", default_value = DEFAULT_RULESET)]
    ruleset: PathBuf,

    /// Log level (overridden by RUST_LOG).
    #[arg(long, env = "OASGATE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, env = "OASGATE_LOG_FORMAT", default_value = "json", value_parser = parse_log_format)]
    log_format: LogFormat,

    /// Maximum uploaded document size in bytes.
    #[arg(long, env = "OASGATE_MAX_UPLOAD_BYTES", default_value_t = api::upload::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "OASGATE_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{}' (expected json or pretty)", s))
}

async fn run_serve(args: ServeArgs) -> ExitCode {
    let config = TelemetryConfig::new()
        .with_log_level(args.log_level)
        .with_log_format(args.log_format);
    let telemetry = match Telemetry::init(config) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    log_startup!(
        service = %telemetry.config().service_name,
        version = env!("CARGO_PKG_VERSION"),
        ruleset = %args.ruleset.display()
    );

    // The engine is built before binding; a bad ruleset never serves.
    let engine = match report::load_engine(&args.ruleset) {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "rule engine initialization failed");
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    let state = AppState {
        gate: PublishGate::new(Validator::new(Arc::new(engine)), Arc::new(CatalogPublisher)),
        metrics: telemetry.metrics_clone(),
        limits: UploadLimits {
            max_upload_bytes: args.max_upload_bytes,
        },
    };

    let config = server::ServerConfig {
        listen_addr: args.listen,
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        state,
    };
    match server::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "server stopped");
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Validate {
            spec,
            format,
            ruleset,
        } => report::run_validate(&spec, &ruleset, format),
        Command::CheckRuleset { ruleset } => report::run_check_ruleset(&ruleset),
    }
}
