//! Failover actions against a protection group, addressed by name.
//!
//! Each action resolves the group's identifiers fresh from the replication
//! manager (no caching), builds the request body and submits it, returning the
//! resulting [`TaskHandle`].

use serde_json::Value;
use tracing::{debug, info};
use zvm_protocol::{CheckpointStats, CommitPolicy, FailoverRequest, FailoverTestRequest, ShutdownPolicy, VmSummary, VpgSummary};

use crate::client::ApiClient;
use crate::error::{ApiError, OperationError};
use crate::poll::TaskHandle;
use crate::transport::QueryParams;

/// Identifiers needed to start a failover for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTarget {
	pub vpg_id: String,
	pub checkpoint_id: String,
	pub vm_ids: Vec<String>,
}

/// Failover actions bound to the run's API client.
#[derive(Clone, Copy)]
pub struct FailoverOps<'a> {
	client: ApiClient<'a>,
}

impl<'a> FailoverOps<'a> {
	pub fn new(client: ApiClient<'a>) -> Self {
		Self { client }
	}

	/// Lists the VMs protected by `vpg_name`.
	pub async fn vms_in_group(&self, vpg_name: &str) -> Result<Vec<VmSummary>, OperationError> {
		let query = QueryParams::new().with_non_empty("vpgName", vpg_name);
		Ok(self.client.get_as("/v1/vms", query).await?)
	}

	/// Resolves the identifier of the group named `vpg_name`; the first match wins.
	pub async fn vpg_id(&self, vpg_name: &str) -> Result<String, OperationError> {
		let query = QueryParams::new().with_non_empty("name", vpg_name);
		let vpgs: Vec<VpgSummary> = self.client.get_as("/v1/vpgs", query).await?;
		vpgs.into_iter()
			.next()
			.map(|vpg| vpg.vpg_identifier)
			.ok_or_else(|| OperationError::GroupNotFound { name: vpg_name.to_string() })
	}

	/// Returns the latest checkpoint identifier of `vpg_id`.
	pub async fn latest_checkpoint(&self, vpg_id: &str) -> Result<String, OperationError> {
		let stats: CheckpointStats = self
			.client
			.get_as(&format!("/v1/vpgs/{vpg_id}/checkpoints/stats"), QueryParams::new())
			.await?;
		stats
			.latest
			.map(|checkpoint| checkpoint.checkpoint_identifier)
			.ok_or_else(|| OperationError::NoCheckpoint { vpg_id: vpg_id.to_string() })
	}

	/// Resolves the group's VMs, identifier and latest checkpoint.
	pub async fn recovery_target(&self, vpg_name: &str) -> Result<RecoveryTarget, OperationError> {
		let vms = self.vms_in_group(vpg_name).await?;
		let Some(vpg_id) = vms.first().map(|vm| vm.vpg_identifier.clone()) else {
			return Err(OperationError::GroupNotFound { name: vpg_name.to_string() });
		};
		let checkpoint_id = self.latest_checkpoint(&vpg_id).await?;
		let vm_ids = vms.into_iter().map(|vm| vm.vm_identifier).collect();

		debug!(target = "zvm.ops", vpg = %vpg_name, %vpg_id, %checkpoint_id, "resolved recovery target");
		Ok(RecoveryTarget { vpg_id, checkpoint_id, vm_ids })
	}

	/// Starts a non-disruptive test failover of every VM in the group.
	pub async fn start_test_failover(&self, vpg_name: &str) -> Result<TaskHandle, OperationError> {
		let target = self.recovery_target(vpg_name).await?;
		let body = FailoverTestRequest {
			checkpoint_identifier: target.checkpoint_id,
			vm_identifiers: target.vm_ids,
		};
		self.submit(vpg_name, &format!("/v1/vpgs/{}/FailoverTest", target.vpg_id), Some(to_body(&body)?))
			.await
	}

	/// Stops a running test failover and tears down its test VMs.
	pub async fn stop_test_failover(&self, vpg_name: &str) -> Result<TaskHandle, OperationError> {
		let vpg_id = self.vpg_id(vpg_name).await?;
		self.submit(vpg_name, &format!("/v1/vpgs/{vpg_id}/FailoverTestStop"), None).await
	}

	/// Starts a live failover; `commit_policy` applies after `wait_before_commit_secs` in "Before Commit".
	pub async fn start_live_failover(&self, vpg_name: &str, commit_policy: CommitPolicy, wait_before_commit_secs: u64) -> Result<TaskHandle, OperationError> {
		let target = self.recovery_target(vpg_name).await?;
		let body = FailoverRequest {
			checkpoint_identifier: target.checkpoint_id,
			commit_policy,
			shutdown_policy: ShutdownPolicy::ForceShutdown,
			time_to_wait_before_shutdown_in_sec: wait_before_commit_secs,
			is_reverse_protection: false,
			vm_identifiers: target.vm_ids,
		};
		self.submit(vpg_name, &format!("/v1/vpgs/{}/Failover", target.vpg_id), Some(to_body(&body)?))
			.await
	}

	/// Finalizes a live failover waiting in "Before Commit".
	pub async fn commit_failover(&self, vpg_name: &str) -> Result<TaskHandle, OperationError> {
		let vpg_id = self.vpg_id(vpg_name).await?;
		self.submit(vpg_name, &format!("/v1/vpgs/{vpg_id}/FailoverCommit"), None).await
	}

	/// Reverts a live failover waiting in "Before Commit".
	pub async fn rollback_failover(&self, vpg_name: &str) -> Result<TaskHandle, OperationError> {
		let vpg_id = self.vpg_id(vpg_name).await?;
		self.submit(vpg_name, &format!("/v1/vpgs/{vpg_id}/FailoverRollback"), None).await
	}

	async fn submit(&self, vpg_name: &str, path: &str, body: Option<Value>) -> Result<TaskHandle, OperationError> {
		let raw = self.client.post(path, body).await?;
		let handle = TaskHandle::from_body(path, &raw)?;
		match &handle {
			TaskHandle::Task(task) => info!(target = "zvm.ops", vpg = %vpg_name, %path, %task, "action accepted"),
			TaskHandle::Rejected { reason } => info!(target = "zvm.ops", vpg = %vpg_name, %path, %reason, "action rejected"),
		}
		Ok(handle)
	}
}

fn to_body<T: serde::Serialize>(body: &T) -> Result<Value, ApiError> {
	serde_json::to_value(body).map_err(|e| ApiError::Malformed {
		path: "request body".to_string(),
		reason: e.to_string(),
	})
}
