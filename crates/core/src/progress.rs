//! Progress events emitted while a batch runs.

use crate::batch::{RowAction, RowOutcome};

/// Observable steps of a batch run, in the order they occur for a row.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
	/// A row's action is about to be submitted.
	RowStarted { index: usize, vpg_name: String, action: RowAction },
	/// One poll of a running task, or one elapsed second of a delay.
	Tick,
	/// The orchestrator is about to wait before the next row.
	Pausing { secs: u64 },
	/// A row reached its final outcome.
	RowFinished(RowOutcome),
}

/// Receives progress events from the orchestrator.
pub trait ProgressSink: Send {
	fn emit(&mut self, event: ProgressEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
	fn emit(&mut self, _event: ProgressEvent) {}
}

/// Collects events in order; used to assert on run behavior.
impl ProgressSink for Vec<ProgressEvent> {
	fn emit(&mut self, event: ProgressEvent) {
		self.push(event);
	}
}
