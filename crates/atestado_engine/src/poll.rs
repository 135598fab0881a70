use std::time::Duration;

use atestado_logging::{atestado_debug, atestado_warn};
use tokio_util::sync::CancellationToken;

use crate::{Backend, EngineEvent, PollOutcome, TaskId, TaskStatus};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Polls `task_id` every `interval` until the backend reports a terminal status.
///
/// Queries are strictly sequential: the next wait starts only once the previous
/// query resolved. Non-terminal statuses are reported through `sink` as
/// [`EngineEvent::PollPending`]. Cancelling `cancel` ends the loop at the next
/// await point, including in the middle of a query.
pub async fn poll_until_terminal(
    backend: &dyn Backend,
    task_id: &TaskId,
    interval: Duration,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
) -> PollOutcome {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }

        let report = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            report = backend.check_task(task_id) => report,
        };

        let report = match report {
            Ok(report) => report,
            Err(err) => {
                atestado_warn!("Status query for task {} failed: {}", task_id, err);
                return PollOutcome::TransportFailed(err);
            }
        };

        match report.status {
            TaskStatus::Completed => {
                return match report.result {
                    Some(result) => PollOutcome::Completed(result),
                    None => PollOutcome::Failed {
                        message: "Task completed without a result".to_string(),
                    },
                };
            }
            TaskStatus::Error => {
                return PollOutcome::Failed {
                    message: "Backend reported a processing error".to_string(),
                };
            }
            status => {
                atestado_debug!("Task {} still running ({})", task_id, status);
                sink.emit(EngineEvent::PollPending {
                    task_id: task_id.clone(),
                    status,
                });
            }
        }
    }
}
