use serde::{Deserialize, Serialize};

use crate::policy::{CommitPolicy, ShutdownPolicy};

/// Body of `POST /v1/vpgs/{vpgId}/FailoverTest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailoverTestRequest {
	pub checkpoint_identifier: String,
	pub vm_identifiers: Vec<String>,
}

/// Body of `POST /v1/vpgs/{vpgId}/Failover`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FailoverRequest {
	pub checkpoint_identifier: String,
	pub commit_policy: CommitPolicy,
	pub shutdown_policy: ShutdownPolicy,
	pub time_to_wait_before_shutdown_in_sec: u64,
	pub is_reverse_protection: bool,
	pub vm_identifiers: Vec<String>,
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn failover_request_serializes_numeric_policies() {
		let request = FailoverRequest {
			checkpoint_identifier: "cp-1".to_string(),
			commit_policy: CommitPolicy::Commit,
			shutdown_policy: ShutdownPolicy::ForceShutdown,
			time_to_wait_before_shutdown_in_sec: 3600,
			is_reverse_protection: false,
			vm_identifiers: vec!["vm-1".to_string(), "vm-2".to_string()],
		};
		assert_eq!(
			serde_json::to_value(&request).unwrap(),
			json!({
				"CheckpointIdentifier": "cp-1",
				"CommitPolicy": 1,
				"ShutdownPolicy": 2,
				"TimeToWaitBeforeShutdownInSec": 3600,
				"IsReverseProtection": false,
				"VmIdentifiers": ["vm-1", "vm-2"]
			})
		);
	}
}
