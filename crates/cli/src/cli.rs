use std::path::PathBuf;

use clap::Parser;
use zvm::{FailoverType, RunConfig, RunMode};
use zvm_protocol::CommitPolicy;

use crate::output::OutputFormat;

/// Default configuration file, resolved against the working directory.
pub const DEFAULT_CONFIG: &str = "zvm-failover.toml";

#[derive(Parser, Debug)]
#[command(name = "zvm-failover")]
#[command(about = "Fail over replication manager protection groups in build-group order")]
#[command(version)]
pub struct Cli {
	/// CSV plan with BuildGroup, VpgName and Delay columns
	#[arg(short, long, value_name = "FILE")]
	pub csv: PathBuf,

	/// START or STOP (anything else runs as START)
	#[arg(short, long)]
	pub mode: String,

	// Omitting -f runs a test failover, so a live recovery is only ever
	// requested explicitly. A value that is given but unrecognised still runs as LIVE.
	/// TEST or LIVE (anything else runs as LIVE)
	#[arg(short = 'f', long, default_value = "test")]
	pub failover_type: String,

	/// Commit policy for live failovers: rollback, commit or none
	#[arg(short = 'p', long, default_value = "rollback")]
	pub commit_policy: String,

	/// Seconds a live failover waits before its commit policy applies
	#[arg(short = 't', long = "wait-time", default_value_t = 3600)]
	pub wait_time: u64,

	/// Configuration file holding the replication manager endpoint and credentials
	#[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
	pub config: PathBuf,

	/// Directory receiving the per-run log file
	#[arg(long, value_name = "DIR", default_value = "logs")]
	pub log_dir: PathBuf,

	/// Do not write a log file
	#[arg(long)]
	pub no_log_file: bool,

	/// Summary format printed when the run ends
	#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,
}

impl Cli {
	/// Run settings with the lenient fallbacks applied.
	pub fn run_config(&self) -> RunConfig {
		RunConfig {
			mode: RunMode::parse_or_default(&self.mode),
			failover_type: FailoverType::parse_or_default(&self.failover_type),
			commit_policy: CommitPolicy::from_name(&self.commit_policy),
			wait_before_commit_secs: self.wait_time,
		}
	}

	/// Whether the commit policy argument names a known policy.
	pub fn commit_policy_recognized(&self) -> bool {
		CommitPolicy::is_known_name(&self.commit_policy)
	}
}
