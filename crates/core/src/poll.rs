//! Task handles and cooperative polling until a task reaches a terminal state.
//!
//! Every mutating call answers with either a task identifier or an error
//! document. [`TaskHandle`] keeps the two apart so a rejection is never polled.
//! [`TaskPoller`] then queries `GET /v1/tasks/{id}` at a fixed interval until
//! the state code is terminal. Terminal does not mean successful.
//!
//! When a status query itself fails, [`PollErrorPolicy`] decides what happens.
//! The default, `FailOpen`, reports the task as complete so that the batch
//! always moves on. This can hide a real failure.

use std::time::Duration;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use zvm_protocol::{ApiErrorBody, ERROR_MARKER, TaskInfo, TaskState};

use crate::client::ApiClient;
use crate::error::{ApiError, Result};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::transport::QueryParams;
use crate::wait::{WaitOutcome, sleep_or_cancel};

/// Identifier of an asynchronous task on the replication manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for TaskId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Result of submitting a mutating action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskHandle {
	/// The action was accepted and runs as this task.
	Task(TaskId),
	/// The replication manager answered with an error document instead.
	Rejected { reason: String },
}

impl TaskHandle {
	/// Classifies a bare handle string: anything carrying the error marker is a rejection.
	pub fn parse(handle: &str) -> Self {
		let handle = handle.trim();
		if handle.is_empty() || handle.contains(ERROR_MARKER) {
			TaskHandle::Rejected { reason: handle.to_string() }
		} else {
			TaskHandle::Task(TaskId(handle.to_string()))
		}
	}

	/// Classifies the raw body of a mutating POST.
	pub fn from_body(path: &str, body: &str) -> Result<Self> {
		let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Malformed {
			path: path.to_string(),
			reason: e.to_string(),
		})?;

		Ok(match value {
			Value::String(handle) => TaskHandle::parse(&handle),
			Value::Object(_) => TaskHandle::Rejected {
				reason: serde_json::from_str::<ApiErrorBody>(body)
					.map(|error| error.message)
					.unwrap_or_else(|_| value.to_string()),
			},
			other => TaskHandle::Rejected { reason: other.to_string() },
		})
	}

	pub fn task_id(&self) -> Option<&TaskId> {
		match self {
			TaskHandle::Task(id) => Some(id),
			TaskHandle::Rejected { .. } => None,
		}
	}
}

/// What to do when a status query fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PollErrorPolicy {
	/// Treat the task as complete and move on.
	#[default]
	FailOpen,
	/// Treat the task as not complete.
	FailClosed,
	/// Keep polling through up to `attempts` consecutive errors, then fail closed.
	Retry { attempts: u32 },
}

/// Polling cadence and bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
	pub interval: Duration,
	/// `None` polls until a terminal state, however long that takes.
	pub max_polls: Option<u32>,
	pub on_error: PollErrorPolicy,
}

impl Default for PollSettings {
	fn default() -> Self {
		Self {
			interval: Duration::from_secs(5),
			max_polls: None,
			on_error: PollErrorPolicy::FailOpen,
		}
	}
}

/// How waiting on a task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
	Finished { state: TaskState, polls: u32 },
	FailedOpen { error: String },
	Failed { error: String },
	Rejected { reason: String },
	Exhausted { polls: u32 },
	Cancelled,
}

impl PollOutcome {
	/// `true` when the task is considered done; says nothing about success.
	pub fn is_complete(&self) -> bool {
		matches!(self, PollOutcome::Finished { .. } | PollOutcome::FailedOpen { .. })
	}

	pub fn state(&self) -> Option<TaskState> {
		match self {
			PollOutcome::Finished { state, .. } => Some(*state),
			_ => None,
		}
	}
}

impl std::fmt::Display for PollOutcome {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			PollOutcome::Finished { state, polls } => write!(f, "task reached state {state} after {polls} polls"),
			PollOutcome::FailedOpen { error } => write!(f, "task status unavailable, assumed complete: {error}"),
			PollOutcome::Failed { error } => write!(f, "task status unavailable: {error}"),
			PollOutcome::Rejected { reason } => write!(f, "action rejected: {reason}"),
			PollOutcome::Exhausted { polls } => write!(f, "task still running after {polls} polls"),
			PollOutcome::Cancelled => write!(f, "cancelled while waiting for task"),
		}
	}
}

/// Waits on tasks through the run's API client.
pub struct TaskPoller<'a> {
	client: ApiClient<'a>,
	settings: PollSettings,
}

impl<'a> TaskPoller<'a> {
	pub fn new(client: ApiClient<'a>, settings: PollSettings) -> Self {
		Self { client, settings }
	}

	/// Queries the current state of `id` once.
	pub async fn task_state(&self, id: &TaskId) -> Result<TaskState> {
		let info: TaskInfo = self.client.get_as(&format!("/v1/tasks/{id}"), QueryParams::new()).await?;
		Ok(info.status.state)
	}

	/// Polls `handle` until it reaches a terminal state.
	///
	/// A rejected handle returns immediately without any network call. One
	/// tick is emitted per non-terminal poll.
	pub async fn await_completion(&self, handle: &TaskHandle, cancel: &CancellationToken, progress: &mut dyn ProgressSink) -> PollOutcome {
		let id = match handle {
			TaskHandle::Task(id) => id,
			TaskHandle::Rejected { reason } => {
				debug!(target = "zvm.poll", %reason, "handle is an error payload; not polling");
				return PollOutcome::Rejected { reason: reason.clone() };
			}
		};

		let mut polls = 0u32;
		let mut consecutive_errors = 0u32;
		loop {
			if cancel.is_cancelled() {
				return PollOutcome::Cancelled;
			}
			if self.settings.max_polls.is_some_and(|max| polls >= max) {
				warn!(target = "zvm.poll", task = %id, polls, "poll limit reached");
				return PollOutcome::Exhausted { polls };
			}

			polls += 1;
			match self.task_state(id).await {
				Ok(state) if state.is_terminal() => {
					info!(target = "zvm.poll", task = %id, %state, polls, "task finished");
					return PollOutcome::Finished { state, polls };
				}
				Ok(state) => {
					consecutive_errors = 0;
					trace!(target = "zvm.poll", task = %id, %state, polls, "task running");
				}
				Err(err) => match self.settings.on_error {
					PollErrorPolicy::FailOpen => {
						warn!(target = "zvm.poll", task = %id, error = %err, "status query failed; assuming complete");
						return PollOutcome::FailedOpen { error: err.to_string() };
					}
					PollErrorPolicy::FailClosed => {
						warn!(target = "zvm.poll", task = %id, error = %err, "status query failed");
						return PollOutcome::Failed { error: err.to_string() };
					}
					PollErrorPolicy::Retry { attempts } => {
						consecutive_errors += 1;
						if consecutive_errors > attempts {
							warn!(target = "zvm.poll", task = %id, error = %err, attempts, "status query retries exhausted");
							return PollOutcome::Failed { error: err.to_string() };
						}
						debug!(target = "zvm.poll", task = %id, error = %err, consecutive_errors, "status query failed; retrying");
					}
				},
			}

			progress.emit(ProgressEvent::Tick);
			if sleep_or_cancel(self.settings.interval, cancel).await == WaitOutcome::Cancelled {
				return PollOutcome::Cancelled;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use serde_json::json;
	use tokio::time::Instant;

	use super::*;
	use crate::error::TransportError;
	use crate::session::Session;
	use crate::transport::{ApiResponse, FakeTransport};

	fn session() -> Session {
		Session::new("https://zvm.test", "tok")
	}

	fn task_body(state: i64) -> ApiResponse {
		ApiResponse::json(json!({ "TaskIdentifier": "t-1", "Status": { "State": state, "Progress": 10 } }))
	}

	/// Transport answering successive task polls with `states`, repeating the last one.
	fn scripted(states: Vec<i64>) -> (FakeTransport, crate::transport::FakeTransportController) {
		let calls = Arc::new(AtomicUsize::new(0));
		FakeTransport::new("https://zvm.test", move |_| {
			let n = calls.fetch_add(1, Ordering::SeqCst);
			Ok(task_body(states[n.min(states.len() - 1)]))
		})
	}

	#[test]
	fn handle_classification() {
		assert_eq!(TaskHandle::parse("t-42"), TaskHandle::Task(TaskId("t-42".to_string())));
		assert!(matches!(TaskHandle::parse("{\"Message\":\"nope\"}"), TaskHandle::Rejected { .. }));
		assert!(matches!(TaskHandle::parse(""), TaskHandle::Rejected { .. }));

		assert_eq!(
			TaskHandle::from_body("/p", "\"t-7\"").unwrap(),
			TaskHandle::Task(TaskId("t-7".to_string()))
		);
		assert_eq!(
			TaskHandle::from_body("/p", r#"{"Message":"VPG is not in a valid state"}"#).unwrap(),
			TaskHandle::Rejected {
				reason: "VPG is not in a valid state".to_string()
			}
		);
		assert_eq!(
			TaskHandle::from_body("/p", r#"{"Message":"Checkpoint not found","MessageDetail":"cp-9"}"#).unwrap(),
			TaskHandle::Rejected {
				reason: "Checkpoint not found".to_string()
			}
		);
		assert_eq!(
			TaskHandle::from_body("/p", r#"{"Code":17}"#).unwrap(),
			TaskHandle::Rejected {
				reason: r#"{"Code":17}"#.to_string()
			}
		);
		assert!(matches!(TaskHandle::from_body("/p", "42").unwrap(), TaskHandle::Rejected { .. }));
		assert!(matches!(TaskHandle::from_body("/p", "not json"), Err(ApiError::Malformed { .. })));
	}

	#[tokio::test(start_paused = true)]
	async fn rejected_handle_is_never_polled() {
		let (transport, controller) = scripted(vec![5]);
		let session = session();
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), PollSettings::default());

		let handle = TaskHandle::parse("{\"Message\":\"error\"}");
		let outcome = poller.await_completion(&handle, &CancellationToken::new(), &mut Vec::new()).await;

		assert!(!outcome.is_complete());
		assert!(matches!(outcome, PollOutcome::Rejected { .. }));
		assert!(controller.is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn polls_until_terminal_state() {
		let (transport, controller) = scripted(vec![0, 1, 3, 5]);
		let session = session();
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), PollSettings::default());
		let mut events = Vec::new();
		let start = Instant::now();

		let outcome = poller
			.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut events)
			.await;

		assert_eq!(outcome, PollOutcome::Finished { state: TaskState(5), polls: 4 });
		assert!(outcome.is_complete());
		assert_eq!(controller.count_prefix("/v1/tasks/t-1"), 4);
		assert_eq!(events.len(), 3);
		assert!(start.elapsed() >= Duration::from_secs(15));
	}

	#[tokio::test(start_paused = true)]
	async fn every_terminal_code_ends_polling() {
		for code in [4, 5, 6] {
			let (transport, controller) = scripted(vec![code]);
			let session = session();
			let poller = TaskPoller::new(ApiClient::new(&transport, &session), PollSettings::default());
			let outcome = poller
				.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut Vec::new())
				.await;
			assert!(outcome.is_complete(), "state {code} should complete");
			assert_eq!(controller.requests().len(), 1);
		}
	}

	#[tokio::test(start_paused = true)]
	async fn task_without_state_keeps_polling() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (transport, controller) = FakeTransport::new("https://zvm.test", move |_| match calls.fetch_add(1, Ordering::SeqCst) {
			0 => Ok(ApiResponse::json(json!({ "Status": { "Progress": 10 } }))),
			_ => Ok(task_body(5)),
		});
		let session = session();
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), PollSettings::default());
		let mut events = Vec::new();

		let outcome = poller
			.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut events)
			.await;
		assert_eq!(outcome, PollOutcome::Finished { state: TaskState(5), polls: 2 });
		assert_eq!(controller.requests().len(), 2);
		assert_eq!(events, vec![ProgressEvent::Tick]);
	}

	#[tokio::test(start_paused = true)]
	async fn transport_error_fails_open_by_default() {
		let (transport, _) = FakeTransport::new("https://zvm.test", |request| {
			Err(TransportError::Request {
				path: request.path.clone(),
				reason: "reset".to_string(),
			})
		});
		let session = session();
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), PollSettings::default());

		let outcome = poller
			.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut Vec::new())
			.await;
		assert!(matches!(outcome, PollOutcome::FailedOpen { .. }));
		assert!(outcome.is_complete());
		assert_eq!(outcome.state(), None);
	}

	#[tokio::test(start_paused = true)]
	async fn malformed_status_fails_closed_when_configured() {
		let (transport, _) = FakeTransport::new("https://zvm.test", |_| Ok(ApiResponse::new(200, "garbage")));
		let session = session();
		let settings = PollSettings {
			on_error: PollErrorPolicy::FailClosed,
			..PollSettings::default()
		};
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), settings);

		let outcome = poller
			.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut Vec::new())
			.await;
		assert!(matches!(outcome, PollOutcome::Failed { .. }));
		assert!(!outcome.is_complete());
	}

	#[tokio::test(start_paused = true)]
	async fn retry_policy_recovers_from_transient_errors() {
		let calls = Arc::new(AtomicUsize::new(0));
		let (transport, controller) = FakeTransport::new("https://zvm.test", move |_| match calls.fetch_add(1, Ordering::SeqCst) {
			0 | 1 => Ok(ApiResponse::new(503, "busy")),
			_ => Ok(task_body(5)),
		});
		let session = session();
		let settings = PollSettings {
			on_error: PollErrorPolicy::Retry { attempts: 2 },
			..PollSettings::default()
		};
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), settings);

		let outcome = poller
			.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut Vec::new())
			.await;
		assert_eq!(outcome, PollOutcome::Finished { state: TaskState(5), polls: 3 });
		assert_eq!(controller.requests().len(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn max_polls_bounds_a_stuck_task() {
		let (transport, controller) = scripted(vec![0]);
		let session = session();
		let settings = PollSettings {
			max_polls: Some(3),
			..PollSettings::default()
		};
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), settings);

		let outcome = poller
			.await_completion(&TaskHandle::parse("t-1"), &CancellationToken::new(), &mut Vec::new())
			.await;
		assert_eq!(outcome, PollOutcome::Exhausted { polls: 3 });
		assert_eq!(controller.requests().len(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn cancellation_interrupts_polling() {
		let (transport, _) = scripted(vec![0]);
		let session = session();
		let poller = TaskPoller::new(ApiClient::new(&transport, &session), PollSettings::default());
		let cancel = CancellationToken::new();

		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_secs(12)).await;
			trigger.cancel();
		});

		let outcome = poller.await_completion(&TaskHandle::parse("t-1"), &cancel, &mut Vec::new()).await;
		assert_eq!(outcome, PollOutcome::Cancelled);
	}
}
