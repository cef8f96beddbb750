//! Sequential batch orchestration over build-group rows.
//!
//! Rows are processed one at a time in input order: submit the row's action,
//! wait on its task, report, then optionally pause before the next row. A
//! failure on one row becomes that row's outcome and the batch carries on.
//! Only authentication failure stops the run before any row is touched.
//!
//! | mode  | type | action |
//! |-------|------|--------|
//! | Start | Test | start test failover, poll, optional post-delay |
//! | Start | Live | start live failover, poll, optional post-delay |
//! | Stop  | Test | stop test failover, poll |
//! | Stop  | Live | rejected, no API call |

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zvm_protocol::{CommitPolicy, TaskState};

use crate::client::ApiClient;
use crate::error::{OperationError, RunError};
use crate::operations::FailoverOps;
use crate::poll::{PollOutcome, PollSettings, TaskHandle, TaskPoller};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::session::{Credentials, SessionManager};
use crate::transport::Transport;
use crate::wait::{WaitOutcome, tick_wait};

/// Whether the run starts or stops failovers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
	#[default]
	Start,
	Stop,
}

impl RunMode {
	/// Case-insensitive parse; anything unrecognised runs as `Start`.
	pub fn parse_or_default(value: &str) -> Self {
		match value.trim().to_ascii_uppercase().as_str() {
			"STOP" => RunMode::Stop,
			_ => RunMode::Start,
		}
	}
}

impl std::fmt::Display for RunMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RunMode::Start => write!(f, "START"),
			RunMode::Stop => write!(f, "STOP"),
		}
	}
}

/// Whether failovers are trial runs or real recoveries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailoverType {
	Test,
	#[default]
	Live,
}

impl FailoverType {
	/// Case-insensitive parse; anything unrecognised runs as `Live`.
	pub fn parse_or_default(value: &str) -> Self {
		match value.trim().to_ascii_uppercase().as_str() {
			"TEST" => FailoverType::Test,
			_ => FailoverType::Live,
		}
	}
}

impl std::fmt::Display for FailoverType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			FailoverType::Test => write!(f, "TEST"),
			FailoverType::Live => write!(f, "LIVE"),
		}
	}
}

/// Settings applied uniformly to every row of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
	pub mode: RunMode,
	pub failover_type: FailoverType,
	pub commit_policy: CommitPolicy,
	pub wait_before_commit_secs: u64,
}

impl Default for RunConfig {
	fn default() -> Self {
		Self {
			mode: RunMode::Start,
			failover_type: FailoverType::Live,
			commit_policy: CommitPolicy::Rollback,
			wait_before_commit_secs: 3600,
		}
	}
}

impl RunConfig {
	/// Action every row of this run performs.
	pub fn action(&self) -> RowAction {
		match (self.mode, self.failover_type) {
			(RunMode::Start, FailoverType::Test) => RowAction::StartTest,
			(RunMode::Start, FailoverType::Live) => RowAction::StartLive,
			(RunMode::Stop, FailoverType::Test) => RowAction::StopTest,
			(RunMode::Stop, FailoverType::Live) => RowAction::Unsupported,
		}
	}
}

/// One input row. `build_group` is informational; rows never get reordered by it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildGroupRow {
	#[serde(rename = "BuildGroup", default)]
	pub build_group: i64,
	#[serde(rename = "VpgName")]
	pub vpg_name: String,
	#[serde(rename = "Delay", default)]
	pub delay_secs: u64,
}

impl BuildGroupRow {
	pub fn new(build_group: i64, vpg_name: impl Into<String>, delay_secs: u64) -> Self {
		Self {
			build_group,
			vpg_name: vpg_name.into(),
			delay_secs,
		}
	}
}

/// What a row does, resolved from the run's mode and failover type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowAction {
	StartTest,
	StartLive,
	StopTest,
	Unsupported,
}

impl RowAction {
	/// Start actions may be followed by the row's delay.
	pub fn is_start(self) -> bool {
		matches!(self, RowAction::StartTest | RowAction::StartLive)
	}

	fn subject(self) -> &'static str {
		match self {
			RowAction::StartTest | RowAction::StopTest => "Failover Test",
			RowAction::StartLive => "Failover",
			RowAction::Unsupported => "LIVE failover",
		}
	}

	/// Line announcing that the row's action is starting.
	pub fn start_marker(self, vpg_name: &str) -> String {
		let verb = if self.is_start() { "Starting" } else { "Stopping" };
		format!("{verb} {} for {vpg_name}", self.subject())
	}
}

/// Final state of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
	/// The task reached a terminal state. `state` is `None` when the status
	/// query failed and the poller assumed completion.
	Completed { state: Option<TaskState> },
	/// The action was submitted but did not complete.
	NotCompleted { reason: String },
	/// The action could not be submitted.
	Errored { message: String },
	/// The mode/type combination is not a valid option.
	Rejected,
	Cancelled,
}

impl RowStatus {
	/// Only a task observed in a terminal state counts. A completion assumed
	/// after a failed status query stays unconfirmed.
	pub fn is_success(&self) -> bool {
		matches!(self, RowStatus::Completed { state: Some(_) })
	}

	pub fn is_unconfirmed(&self) -> bool {
		matches!(self, RowStatus::Completed { state: None })
	}
}

/// Per-row record of what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
	/// Zero-based position in the input.
	pub index: usize,
	pub build_group: i64,
	pub vpg_name: String,
	pub action: RowAction,
	#[serde(flatten)]
	pub status: RowStatus,
}

impl std::fmt::Display for RowOutcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = &self.vpg_name;
		let subject = self.action.subject();
		match (&self.status, self.action) {
			(RowStatus::Rejected, _) | (_, RowAction::Unsupported) => write!(f, "Stopping a LIVE failover process is not a valid option..."),
			(RowStatus::Completed { .. }, RowAction::StopTest) => write!(f, "Destroyed {subject} for {name}"),
			(RowStatus::Completed { .. }, _) => write!(f, "Built {subject} for {name}"),
			(RowStatus::NotCompleted { .. }, RowAction::StopTest) => write!(f, "Unable to Destroy {subject} for {name}"),
			(RowStatus::NotCompleted { .. }, _) => write!(f, "Unable to Build {subject} for {name}"),
			(RowStatus::Errored { message }, _) => write!(f, "EXCEPTION {subject} for {name}: {message}"),
			(RowStatus::Cancelled, _) => write!(f, "Cancelled {subject} for {name}"),
		}
	}
}

/// Everything a run produced, in row order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
	pub outcomes: Vec<RowOutcome>,
	#[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
	pub elapsed: Duration,
	/// Set when the run stopped early on cancellation.
	pub cancelled: bool,
}

impl BatchReport {
	pub fn failures(&self) -> impl Iterator<Item = &RowOutcome> {
		self.outcomes.iter().filter(|outcome| !outcome.status.is_success())
	}

	pub fn is_clean(&self) -> bool {
		!self.cancelled && self.failures().next().is_none()
	}
}

fn serialize_secs<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_u64(elapsed.as_secs())
}

/// Drives a batch of rows through one authenticated session.
pub struct BatchOrchestrator<T> {
	transport: T,
	credentials: Credentials,
	config: RunConfig,
	poll: PollSettings,
}

impl<T: Transport> BatchOrchestrator<T> {
	pub fn new(transport: T, credentials: Credentials, config: RunConfig) -> Self {
		Self {
			transport,
			credentials,
			config,
			poll: PollSettings::default(),
		}
	}

	pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
		self.poll = poll;
		self
	}

	/// Processes `rows` in order and returns one outcome per processed row.
	///
	/// Authentication failure is the only error; it happens before any row.
	/// The (Stop, Live) combination never authenticates and rejects every row.
	pub async fn run(&self, rows: &[BuildGroupRow], cancel: &CancellationToken, progress: &mut dyn ProgressSink) -> Result<BatchReport, RunError> {
		let started = Instant::now();
		let action = self.config.action();
		info!(
			target = "zvm.batch",
			mode = %self.config.mode,
			failover_type = %self.config.failover_type,
			rows = rows.len(),
			"batch starting"
		);

		if action == RowAction::Unsupported {
			let outcomes = rows
				.iter()
				.enumerate()
				.map(|(index, row)| {
					let outcome = outcome_for(index, row, action, RowStatus::Rejected);
					progress.emit(ProgressEvent::RowFinished(outcome.clone()));
					outcome
				})
				.collect();
			warn!(target = "zvm.batch", "stopping a live failover is not supported; no rows processed");
			return Ok(BatchReport {
				outcomes,
				elapsed: started.elapsed(),
				cancelled: false,
			});
		}

		let session = SessionManager::authenticate(&self.transport, &self.credentials).await?;
		let client = ApiClient::new(&self.transport, &session);
		let ops = FailoverOps::new(client);
		let poller = TaskPoller::new(client, self.poll.clone());

		let mut outcomes = Vec::with_capacity(rows.len());
		let mut cancelled = false;

		for (index, row) in rows.iter().enumerate() {
			if cancel.is_cancelled() {
				cancelled = true;
				break;
			}

			progress.emit(ProgressEvent::RowStarted {
				index,
				vpg_name: row.vpg_name.clone(),
				action,
			});

			let status = self.process_row(&ops, &poller, action, row, cancel, progress).await;
			let outcome = outcome_for(index, row, action, status);
			info!(
				target = "zvm.batch",
				index,
				vpg = %row.vpg_name,
				build_group = row.build_group,
				outcome = %outcome,
				"row finished"
			);
			progress.emit(ProgressEvent::RowFinished(outcome.clone()));

			let row_cancelled = outcome.status == RowStatus::Cancelled;
			let pause = action.is_start() && row.delay_secs > 0 && !matches!(outcome.status, RowStatus::Errored { .. });
			outcomes.push(outcome);

			if row_cancelled {
				cancelled = true;
				break;
			}

			if pause {
				progress.emit(ProgressEvent::Pausing { secs: row.delay_secs });
				if tick_wait(row.delay_secs, cancel, progress).await == WaitOutcome::Cancelled {
					cancelled = true;
					break;
				}
			}
		}

		let report = BatchReport {
			outcomes,
			elapsed: started.elapsed(),
			cancelled,
		};
		info!(
			target = "zvm.batch",
			processed = report.outcomes.len(),
			failures = report.failures().count(),
			cancelled,
			elapsed_secs = report.elapsed.as_secs(),
			"batch finished"
		);
		Ok(report)
	}

	async fn process_row(
		&self,
		ops: &FailoverOps<'_>,
		poller: &TaskPoller<'_>,
		action: RowAction,
		row: &BuildGroupRow,
		cancel: &CancellationToken,
		progress: &mut dyn ProgressSink,
	) -> RowStatus {
		let submitted: Result<TaskHandle, OperationError> = match action {
			RowAction::StartTest => ops.start_test_failover(&row.vpg_name).await,
			RowAction::StartLive => {
				ops.start_live_failover(&row.vpg_name, self.config.commit_policy, self.config.wait_before_commit_secs)
					.await
			}
			RowAction::StopTest => ops.stop_test_failover(&row.vpg_name).await,
			RowAction::Unsupported => return RowStatus::Rejected,
		};

		let handle = match submitted {
			Ok(handle) => handle,
			Err(err) => {
				warn!(target = "zvm.batch", vpg = %row.vpg_name, error = %err, "action failed");
				return RowStatus::Errored { message: err.to_string() };
			}
		};

		match poller.await_completion(&handle, cancel, progress).await {
			PollOutcome::Cancelled => RowStatus::Cancelled,
			outcome if outcome.is_complete() => RowStatus::Completed { state: outcome.state() },
			outcome => RowStatus::NotCompleted { reason: outcome.to_string() },
		}
	}
}

fn outcome_for(index: usize, row: &BuildGroupRow, action: RowAction, status: RowStatus) -> RowOutcome {
	RowOutcome {
		index,
		build_group: row.build_group,
		vpg_name: row.vpg_name.clone(),
		action,
		status,
	}
}
