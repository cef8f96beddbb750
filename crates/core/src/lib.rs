// zvm: Failover orchestration engine for replication manager protection groups.
//
// The CLI crate is a thin wrapper over `BatchOrchestrator`; everything that
// talks to the replication manager lives here.

pub mod batch;
pub mod client;
pub mod error;
pub mod operations;
pub mod poll;
pub mod progress;
pub mod session;
pub mod transport;
pub mod wait;

/// Tool version shown in the run banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use batch::{BatchOrchestrator, BatchReport, BuildGroupRow, FailoverType, RowAction, RowOutcome, RowStatus, RunConfig, RunMode};
pub use client::ApiClient;
pub use error::{ApiError, AuthError, OperationError, Result, RunError, TransportError};
pub use operations::{FailoverOps, RecoveryTarget};
pub use poll::{PollErrorPolicy, PollOutcome, PollSettings, TaskHandle, TaskId, TaskPoller};
pub use progress::{NullProgress, ProgressEvent, ProgressSink};
pub use session::{Credentials, Session, SessionManager};
pub use transport::fake::{FakeTransport, FakeTransportController};
pub use transport::http::{ClientConfig, HttpTransport};
pub use transport::{ApiRequest, ApiResponse, Method, QueryParams, RequestAuth, Transport};
pub use wait::{WaitOutcome, tick_wait};
