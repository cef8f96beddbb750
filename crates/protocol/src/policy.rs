use serde::{Deserialize, Serialize};

/// Decision applied once a live failover has waited in "Before Commit".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CommitPolicy {
	#[default]
	Rollback,
	Commit,
	None,
}

impl CommitPolicy {
	/// Maps a policy name case-insensitively; anything unrecognised is `None`.
	pub fn from_name(name: &str) -> Self {
		match name.trim().to_ascii_uppercase().as_str() {
			"ROLLBACK" => CommitPolicy::Rollback,
			"COMMIT" => CommitPolicy::Commit,
			_ => CommitPolicy::None,
		}
	}

	/// Returns `true` when `name` maps to a policy without falling back.
	pub fn is_known_name(name: &str) -> bool {
		matches!(name.trim().to_ascii_uppercase().as_str(), "ROLLBACK" | "COMMIT" | "NONE")
	}

	pub fn code(self) -> u8 {
		match self {
			CommitPolicy::Rollback => 0,
			CommitPolicy::Commit => 1,
			CommitPolicy::None => 2,
		}
	}
}

impl From<CommitPolicy> for u8 {
	fn from(policy: CommitPolicy) -> Self {
		policy.code()
	}
}

impl TryFrom<u8> for CommitPolicy {
	type Error = String;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(CommitPolicy::Rollback),
			1 => Ok(CommitPolicy::Commit),
			2 => Ok(CommitPolicy::None),
			other => Err(format!("unknown commit policy code: {other}")),
		}
	}
}

impl std::fmt::Display for CommitPolicy {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CommitPolicy::Rollback => write!(f, "ROLLBACK"),
			CommitPolicy::Commit => write!(f, "COMMIT"),
			CommitPolicy::None => write!(f, "NONE"),
		}
	}
}

/// How protected VMs are shut down when a live failover starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ShutdownPolicy {
	#[default]
	None,
	Shutdown,
	ForceShutdown,
}

impl From<ShutdownPolicy> for u8 {
	fn from(policy: ShutdownPolicy) -> Self {
		match policy {
			ShutdownPolicy::None => 0,
			ShutdownPolicy::Shutdown => 1,
			ShutdownPolicy::ForceShutdown => 2,
		}
	}
}

impl TryFrom<u8> for ShutdownPolicy {
	type Error = String;

	fn try_from(code: u8) -> Result<Self, Self::Error> {
		match code {
			0 => Ok(ShutdownPolicy::None),
			1 => Ok(ShutdownPolicy::Shutdown),
			2 => Ok(ShutdownPolicy::ForceShutdown),
			other => Err(format!("unknown shutdown policy code: {other}")),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn commit_policy_names_map_case_insensitively() {
		assert_eq!(CommitPolicy::from_name("rollback"), CommitPolicy::Rollback);
		assert_eq!(CommitPolicy::from_name("ROLLBACK"), CommitPolicy::Rollback);
		assert_eq!(CommitPolicy::from_name("Commit"), CommitPolicy::Commit);
		assert_eq!(CommitPolicy::from_name("none"), CommitPolicy::None);
		assert_eq!(CommitPolicy::from_name("later"), CommitPolicy::None);
		assert_eq!(CommitPolicy::from_name(""), CommitPolicy::None);
	}

	#[test]
	fn commit_policy_codes() {
		assert_eq!(CommitPolicy::Rollback.code(), 0);
		assert_eq!(CommitPolicy::Commit.code(), 1);
		assert_eq!(CommitPolicy::None.code(), 2);
		assert_eq!(serde_json::to_value(CommitPolicy::Commit).unwrap(), serde_json::json!(1));
		assert!(CommitPolicy::try_from(3).is_err());
	}

	#[test]
	fn known_name_detection() {
		assert!(CommitPolicy::is_known_name("None"));
		assert!(!CommitPolicy::is_known_name("rolback"));
	}
}
