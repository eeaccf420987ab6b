use crate::config::AppConfig;
use crate::error::AppError;
use crate::infra::build_processor;
use crate::server;
use crate::telemetry;
use crate::workflows::certificates::QueueBatch;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "cert-gen",
    about = "Generate vehicle test certificates from test-result change events",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Process one queue batch read from a JSON file and print the failed message ids
    Process(ProcessArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ProcessArgs {
    /// Path to a JSON queue batch (`{"Records": [...]}`)
    #[arg(long)]
    pub(crate) event: PathBuf,
    /// Pretty-print the batch response
    #[arg(long, default_value_t = false)]
    pub(crate) pretty: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Process(args) => run_process(args).await,
    }
}

async fn run_process(args: ProcessArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let raw = tokio::fs::read_to_string(&args.event).await?;
    let batch: QueueBatch = serde_json::from_str(&raw)?;
    let processor = build_processor(&config.processing).await?;

    let response = processor.process_batch(&batch).await?;
    info!(
        event = %args.event.display(),
        failures = response.batch_item_failures.len(),
        "batch file processed"
    );

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{rendered}");
    Ok(())
}
