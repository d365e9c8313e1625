//! dirmirror - keep a destination folder identical to a source folder
//!
//! Runs a reconciliation pass, waits for the interval, and repeats until
//! Enter is pressed or the process is interrupted.

mod display;
mod json_output;

use anyhow::Result;
use clap::Parser;
use dirmirror_config::{ConfigBuilder, SyncConfig};
use dirmirror_sync::{AuditLog, CancellationToken, SyncDriver};
use dirmirror_types::HashAlgorithm;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// dirmirror - periodic one-way directory mirror
#[derive(Parser, Debug)]
#[command(
    name = "dirmirror",
    version = env!("CARGO_PKG_VERSION"),
    about = "Periodically mirror a source folder into a destination folder",
    long_about = "dirmirror keeps DESTINATION identical to SOURCE.\n\
                  Every INTERVAL seconds it copies new files, overwrites files whose\n\
                  content changed, and deletes anything SOURCE no longer has.\n\
                  Every change is appended to LOG_FILE. Press Enter to stop."
)]
struct Cli {
    /// Folder to mirror from
    source: PathBuf,

    /// Folder to mirror into
    destination: PathBuf,

    /// Seconds to wait between passes
    interval: u64,

    /// Append-only audit log
    log_file: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Show what would change without touching the destination
    #[arg(long)]
    dry_run: bool,

    /// Run a single pass and exit
    #[arg(long)]
    once: bool,

    /// Digest algorithm used to detect changed files
    #[arg(long, value_enum, default_value = "blake3")]
    hash: HashArg,

    /// Read chunk size in bytes while hashing
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,

    /// Follow symbolic links in the source folder
    #[arg(long)]
    follow_symlinks: bool,

    /// Leave destination folders that no longer exist in the source
    #[arg(long)]
    keep_orphan_dirs: bool,

    /// Do not copy modification times
    #[arg(long)]
    no_preserve_times: bool,

    /// Skip re-hashing files whose size and modification time are unchanged
    #[arg(long)]
    digest_cache: bool,

    /// Print one JSON summary per pass instead of change lines
    #[arg(long)]
    json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum HashArg {
    Blake3,
    Xxh3,
    Md5,
}

impl From<HashArg> for HashAlgorithm {
    fn from(arg: HashArg) -> Self {
        match arg {
            HashArg::Blake3 => HashAlgorithm::Blake3,
            HashArg::Xxh3 => HashAlgorithm::Xxh3,
            HashArg::Md5 => HashAlgorithm::Md5,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug, cli.quiet, cli.verbose)?;

    info!("dirmirror v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            display::print_startup_error(&e);
            std::process::exit(1);
        }
    };

    let quiet = cli.quiet || cli.json;
    if !quiet {
        display::print_banner(&config);
    }

    let token = CancellationToken::new();
    spawn_stop_listeners(token.clone(), quiet);

    let audit = AuditLog::new(&config.log_file).with_echo(!quiet);
    let driver = SyncDriver::new(config).with_audit_log(audit);
    let json = cli.json;

    let outcome = driver
        .run_with(token, |pass, outcome| {
            if json {
                json_output::print_pass(pass, outcome);
            } else if !quiet {
                display::print_pass(pass, outcome);
            }
        })
        .await;

    match outcome {
        Ok(summary) => {
            if !quiet {
                display::print_terminated(&summary);
            }
            info!("dirmirror stopped after {} passes", summary.passes);
            Ok(())
        }
        Err(e) => {
            display::print_startup_error(&e);
            std::process::exit(1);
        }
    }
}

fn build_config(cli: &Cli) -> dirmirror_config::ConfigResult<SyncConfig> {
    ConfigBuilder::new()
        .source(&cli.source)
        .destination(&cli.destination)
        .log_file(&cli.log_file)
        .interval_secs(cli.interval)
        .hash_algorithm(cli.hash.into())
        .chunk_size(cli.chunk_size)
        .dry_run(cli.dry_run)
        .follow_symlinks(cli.follow_symlinks)
        .prune_orphan_dirs(!cli.keep_orphan_dirs)
        .preserve_timestamps(!cli.no_preserve_times)
        .digest_cache(cli.digest_cache)
        .max_passes(cli.once.then_some(1))
        .build()
}

fn init_logging(debug: bool, quiet: bool, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

/// Cancel `token` when Enter is pressed or the process is interrupted
fn spawn_stop_listeners(token: CancellationToken, quiet: bool) {
    let stdin_token = token.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) => debug!("stdin closed; use Ctrl-C to stop"),
            Ok(_) => {
                if !quiet {
                    display::print_stop_requested();
                }
                stdin_token.cancel();
            }
            Err(e) => warn!("Cannot read stdin: {}", e),
        }
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                token.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });
}
