use serde::{Deserialize, Serialize};

/// Entry of `GET /v1/vms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VmSummary {
	pub vm_identifier: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vm_name: Option<String>,
	pub vpg_identifier: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vpg_name: Option<String>,
}

/// Entry of `GET /v1/vpgs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpgSummary {
	pub vpg_identifier: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vpg_name: Option<String>,
}

/// Body of `GET /v1/vpgs/{vpgId}/checkpoints/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckpointStats {
	#[serde(default)]
	pub latest: Option<CheckpointSummary>,
	#[serde(default)]
	pub earliest: Option<CheckpointSummary>,
}

/// A single point-in-time recovery marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CheckpointSummary {
	pub checkpoint_identifier: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub time_stamp: Option<String>,
}

/// Error document the replication manager returns for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorBody {
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message_detail: Option<String>,
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn vm_summary_reads_pascal_case_fields() {
		let vm: VmSummary = serde_json::from_value(json!({
			"VmIdentifier": "vm-1",
			"VmName": "app-01",
			"VpgIdentifier": "vpg-9",
			"VpgName": "AppA",
			"UsedStorageInMB": 1024
		}))
		.unwrap();
		assert_eq!(vm.vm_identifier, "vm-1");
		assert_eq!(vm.vpg_identifier, "vpg-9");
		assert_eq!(vm.vpg_name.as_deref(), Some("AppA"));
	}

	#[test]
	fn checkpoint_stats_tolerates_missing_latest() {
		let stats: CheckpointStats = serde_json::from_value(json!({})).unwrap();
		assert!(stats.latest.is_none());

		let stats: CheckpointStats = serde_json::from_value(json!({
			"Latest": { "CheckpointIdentifier": "cp-7", "TimeStamp": "2024-01-01T00:00:00Z" }
		}))
		.unwrap();
		assert_eq!(stats.latest.unwrap().checkpoint_identifier, "cp-7");
	}
}
