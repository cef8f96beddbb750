use serde::{Deserialize, Serialize};

/// Numeric task state reported under `Status.State`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskState(pub i64);

impl TaskState {
	/// State codes after which the task no longer changes.
	pub const TERMINAL: [i64; 3] = [4, 5, 6];

	pub fn code(self) -> i64 {
		self.0
	}

	/// Terminal codes end polling whether they denote success or failure.
	pub fn is_terminal(self) -> bool {
		Self::TERMINAL.contains(&self.0)
	}
}

impl std::fmt::Display for TaskState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Body of `GET /v1/tasks/{taskId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskInfo {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub task_identifier: Option<String>,
	pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskStatus {
	/// Absent reads as 0, which is not terminal.
	#[serde(default)]
	pub state: TaskState,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub progress: Option<i64>,
}
