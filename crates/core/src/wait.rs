//! Cancellable waits used between polls and between rows.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::progress::{ProgressEvent, ProgressSink};

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
	Elapsed,
	Cancelled,
}

/// Sleeps for `duration` unless `cancel` fires first.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> WaitOutcome {
	tokio::select! {
		_ = cancel.cancelled() => WaitOutcome::Cancelled,
		_ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
	}
}

/// Waits `secs` seconds, emitting one tick at the start of each second.
pub async fn tick_wait(secs: u64, cancel: &CancellationToken, progress: &mut dyn ProgressSink) -> WaitOutcome {
	for _ in 0..secs {
		progress.emit(ProgressEvent::Tick);
		if sleep_or_cancel(Duration::from_secs(1), cancel).await == WaitOutcome::Cancelled {
			return WaitOutcome::Cancelled;
		}
	}
	WaitOutcome::Elapsed
}
