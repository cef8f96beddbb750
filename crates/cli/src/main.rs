use std::io::IsTerminal;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use zvm_failover_cli::cli::Cli;
use zvm_failover_cli::{logging, run};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let cancel = CancellationToken::new();
	let interrupt = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!(target = "zvm.cli", "interrupt received; stopping at the next wait");
			interrupt.cancel();
		}
	});

	let stdout = std::io::stdout();
	let color = stdout.is_terminal();
	let code = run::execute(&cli, &cancel, stdout, color).await;
	std::process::exit(code);
}
