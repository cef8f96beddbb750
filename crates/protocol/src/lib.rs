//! Wire types for the replication manager REST API (v1).
//!
//! This crate contains the serde-serializable shapes exchanged with the
//! replication manager: inventory lookups, checkpoint statistics, failover
//! request bodies and task status documents. Field names follow the API's
//! PascalCase JSON exactly.
//!
//! Types in this crate are pure data. Request building, polling and batch
//! sequencing live in `zvm-failover`.

pub mod failover;
pub mod inventory;
pub mod policy;
pub mod task;

pub use failover::*;
pub use inventory::*;
pub use policy::*;
pub use task::*;

/// Response header carrying the session token issued by `POST /v1/session/add`.
pub const SESSION_HEADER: &str = "x-zerto-session";

/// Content type used for every request body.
pub const CONTENT_TYPE: &str = "application/json";

/// Marker present in error payloads returned in place of a task identifier.
pub const ERROR_MARKER: &str = "Message";
