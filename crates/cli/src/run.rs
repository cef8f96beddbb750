//! Wires configuration, input and reporting around one batch run.

use std::io::Write;

use anyhow::Context;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use zvm::{BatchOrchestrator, BatchReport, FailoverType, HttpTransport, RunError};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::error::Result;
use crate::input;
use crate::output::{Banner, LogFile, Reporter};

/// The batch ran to the end; individual rows may still have failed.
pub const EXIT_OK: i32 = 0;
/// Configuration, input or authentication stopped the run.
pub const EXIT_FATAL: i32 = 1;
/// Interrupted before every row was processed.
pub const EXIT_CANCELLED: i32 = 130;

/// Runs the batch described by `cli`, reporting to `console`, and returns the exit code.
pub async fn execute<W: Write + Send>(cli: &Cli, cancel: &CancellationToken, console: W, color: bool) -> i32 {
	let started = Instant::now();

	let log = if cli.no_log_file {
		None
	} else {
		match LogFile::create(&cli.log_dir).with_context(|| format!("cannot create log file in {}", cli.log_dir.display())) {
			Ok(log) => Some(log),
			Err(err) => {
				error!(target = "zvm.cli", error = %format!("{err:#}"), "run failed");
				eprintln!("Error: {err:#}");
				return EXIT_FATAL;
			}
		}
	};

	let mut reporter = Reporter::new(console, log, cli.format).with_color(color);
	if let Some(path) = reporter.log_path() {
		info!(target = "zvm.cli", log = %path.display(), "writing run log");
	}

	match drive(cli, cancel, &mut reporter).await {
		Ok(report) => {
			reporter.finish(Some(&report), started.elapsed());
			if report.cancelled {
				warn!(target = "zvm.cli", processed = report.outcomes.len(), "run cancelled");
				EXIT_CANCELLED
			} else {
				EXIT_OK
			}
		}
		Err(err) => {
			error!(target = "zvm.cli", error = %err, "run failed");
			reporter.fatal(&err.to_string());
			reporter.finish(None, started.elapsed());
			EXIT_FATAL
		}
	}
}

async fn drive<W: Write + Send>(cli: &Cli, cancel: &CancellationToken, reporter: &mut Reporter<W>) -> Result<BatchReport> {
	let app = AppConfig::load(&cli.config)?;
	let config = cli.run_config();

	reporter.banner(&Banner {
		version: zvm::VERSION,
		endpoint: &app.zvm.uri,
		config: &config,
		csv: &cli.csv,
	});
	if config.failover_type == FailoverType::Live && !cli.commit_policy_recognized() {
		warn!(
			target = "zvm.cli",
			commit_policy = %cli.commit_policy,
			"unrecognised commit policy; using NONE"
		);
	}

	let rows = input::load_rows(&cli.csv)?;
	let transport = HttpTransport::new(&app.client_config()).map_err(RunError::from)?;
	let orchestrator = BatchOrchestrator::new(transport, app.credentials(), config).with_poll_settings(app.poll_settings());

	Ok(orchestrator.run(&rows, cancel, reporter).await?)
}
