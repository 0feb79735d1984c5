//! CLI entry point. All logic lives here and in the library; `main.rs`
//! only maps the result to a process exit code.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use asap_config::ConfigStore;
use asap_scheduler::CancellationToken;

use crate::Pipeline;

#[derive(Parser)]
#[command(name = "asap")]
#[command(about = "Per-carrier document transmission pipeline for released insurance-application cases")]
#[command(version)]
pub struct Cli {
    /// Path to the pipeline's TOML configuration. Defaults to
    /// `$ASAP_HOME/config.toml`.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Raise the log verbosity one level past `ASAP_LOG` (equivalent to `ASAP_LOG=debug`).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest a carrier reconciliation feed and record it against document history.
    Recon {
        /// Restrict reconciliation to cases released on this date (`YYYY-MM-DD`).
        date: Option<String>,
    },
    /// Run one full pass: export, index, stage, and transmit.
    Transmit {
        /// Restrict the pass to cases released on this date (`YYYY-MM-DD`).
        date: Option<String>,
    },
}

fn asap_home() -> Utf8PathBuf {
    std::env::var("ASAP_HOME")
        .ok()
        .map(Utf8PathBuf::from)
        .or_else(|| dirs::home_dir().and_then(|d| Utf8PathBuf::from_path_buf(d).ok()).map(|d| d.join(".asap")))
        .unwrap_or_else(|| Utf8PathBuf::from("./.asap"))
}

fn config_path(cli: &Cli, home: &camino::Utf8Path) -> Utf8PathBuf {
    cli.config.clone().unwrap_or_else(|| home.join("config.toml"))
}

/// Returns `Err(1)` on any run-level error, matching the scheduler's
/// `RunReport::has_errors` so the process exit code tells the caller
/// whether any contact failed.
pub async fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();
    asap_utils::logging::init_logging(cli.verbose);

    let home = asap_home();
    let path = config_path(&cli, &home);

    let config = ConfigStore::load(&path).map_err(|e| {
        error!(error = %e, path = %path, "failed to load configuration");
        ExitCode::from(2)
    })?;

    let pipeline = Pipeline::bootstrap(config, &home);

    match cli.command {
        Command::Recon { date } => {
            if let Some(date) = &date {
                info!(date, "reconciliation restricted to date not yet supported; ingesting the full feed");
            }
            for contact in pipeline.config().get_contacts() {
                let feed_path = home.join("recon").join(format!("{}.feed", contact.contact_id));
                let Ok(text) = std::fs::read_to_string(&feed_path) else { continue };
                let report = pipeline.ingest_recon_feed(&text, &contact.contact_id).await;
                info!(
                    contact = %contact.contact_id,
                    reconciled = report.reconciled.len(),
                    malformed = report.malformed_lines.len(),
                    "reconciliation feed ingested"
                );
            }
        }
        Command::Transmit { date } => {
            if let Some(date) = &date {
                info!(date, "transmit pass restricted to date (date filtering not yet wired into the released-case query)");
            }
            let report = pipeline.run(CancellationToken::new()).await;
            if report.has_errors() {
                error!("transmit pass completed with errors in at least one contact");
                return Err(ExitCode::from(1));
            }
            info!(transmitted = report.total_transmitted(), "transmit pass complete");
        }
    }

    Ok(())
}
