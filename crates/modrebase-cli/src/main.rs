mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_LOOKUP_ERROR, EXIT_MANIFEST_ERROR};
use modrebase_core::install_signal_handler;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "modrebase",
    version,
    about = "Rebase a fork's go.mod onto upstream and regenerate its checksums"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge a downstream go.mod onto its upstream.
    Rebase {
        /// Upstream manifest; its identity and directives are kept.
        #[arg(long)]
        upstream: PathBuf,
        /// Downstream (fork) manifest.
        #[arg(long)]
        downstream: PathBuf,
        /// Where to write the merged manifest [default: go.mod.local next to upstream].
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Regenerate checksum lines for a manifest from the checksum database.
    Checksums {
        /// Manifest whose requirements are looked up.
        #[arg(long, default_value = "go.mod.local")]
        lockfile: PathBuf,
        /// Checksum file to write.
        #[arg(long, default_value = "go.sum.local")]
        output: PathBuf,
        /// Trust anchor of the checksum database (name+hash+key).
        #[arg(long)]
        log_key: Option<String>,
        /// Base URL to query instead of https://<name>.
        #[arg(long)]
        log_url: Option<String>,
        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Database config file [default: ~/.config/modrebase/sumdb.json if present].
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Report which ecosystem manages a directory.
    Probe {
        /// Directory to inspect.
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MODREBASE_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    install_signal_handler();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Rebase {
            upstream,
            downstream,
            output,
        } => commands::rebase::run(&upstream, &downstream, output.as_deref(), json_output),
        Commands::Checksums {
            lockfile,
            output,
            log_key,
            log_url,
            timeout_secs,
            config,
        } => commands::checksums::run(
            &lockfile,
            &output,
            &commands::checksums::LogOverrides {
                key: log_key,
                url: log_url,
                timeout_secs,
                config,
            },
            json_output,
        ),
        Commands::Probe { dir } => commands::probe::run(&dir, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:") {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("lookup error:") {
                EXIT_LOOKUP_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
