use clap::Parser;
use modrebase_server::LogStore;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "modrebase-server",
    about = "Serve a go.sum file through the checksum database lookup protocol"
)]
struct Cli {
    /// Checksum file whose lines become the log records.
    #[arg(long, default_value = "go.sum")]
    sum_file: PathBuf,

    /// Port to listen on.
    #[arg(long, default_value_t = 8322)]
    port: u16,

    /// Database name announced in tree notes.
    #[arg(long, default_value = "sum.localhost")]
    name: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let store = match LogStore::from_sum_file(&cli.name, &cli.sum_file) {
        Ok(store) => store,
        Err(e) => {
            error!("failed to load {}: {e}", cli.sum_file.display());
            return ExitCode::FAILURE;
        }
    };

    let addr = format!("0.0.0.0:{}", cli.port);
    info!("starting modrebase-server on {addr}");
    info!(
        "serving {} record(s) from {}",
        store.len(),
        cli.sum_file.display()
    );
    info!("trust anchor: {}", store.key());

    if let Err(e) = modrebase_server::run_server(&Arc::new(store), &addr) {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
