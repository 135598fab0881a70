use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use atestado_logging::{atestado_debug, atestado_error, atestado_info};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::poll::{poll_until_terminal, ChannelProgressSink};
use crate::{
    Backend, BackendError, BackendSettings, EngineEvent, ImportRequest, ReqwestBackend, RequestId,
    TaskId,
};

enum EngineCommand {
    Submit { request: RequestId, path: PathBuf },
    StartPolling { task_id: TaskId },
    CancelPolling { task_id: TaskId },
    GenerateRdf { request: RequestId, graph: Value },
    InferGraph { request: RequestId, graph: Value },
    Import { request: RequestId, body: ImportRequest },
}

/// Handle to the background runtime that talks to the backend.
///
/// Commands are executed asynchronously; their results arrive as
/// [`EngineEvent`]s tagged with the caller's [`RequestId`]. At most one task
/// is polled at a time. Dropping the handle cancels the outstanding poll.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let poll_interval = settings.poll_interval;
        let backend = ReqwestBackend::new(settings)?;
        Ok(Self::with_backend(Arc::new(backend), poll_interval))
    }

    pub fn with_backend(backend: Arc<dyn Backend>, poll_interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(err) => {
                    atestado_error!("Failed to start engine runtime: {}", err);
                    return;
                }
            };
            let mut active: Option<(TaskId, CancellationToken)> = None;

            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { task_id } => {
                        if let Some((previous, token)) = active.take() {
                            atestado_debug!("Superseding poll for task {}", previous);
                            token.cancel();
                        }
                        let token = CancellationToken::new();
                        active = Some((task_id.clone(), token.clone()));
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            run_poll(backend.as_ref(), task_id, poll_interval, token, event_tx)
                                .await;
                        });
                    }
                    EngineCommand::CancelPolling { task_id } => {
                        if active.as_ref().is_some_and(|(current, _)| *current == task_id) {
                            if let Some((_, token)) = active.take() {
                                atestado_info!("Cancelling poll for task {}", task_id);
                                token.cancel();
                            }
                        }
                    }
                    command => {
                        let backend = backend.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            handle_command(backend.as_ref(), command, event_tx).await;
                        });
                    }
                }
            }

            if let Some((_, token)) = active {
                token.cancel();
            }
        });

        Self { cmd_tx, event_rx }
    }

    pub fn submit(&self, request: RequestId, path: impl Into<PathBuf>) {
        self.send(EngineCommand::Submit {
            request,
            path: path.into(),
        });
    }

    pub fn start_polling(&self, task_id: TaskId) {
        self.send(EngineCommand::StartPolling { task_id });
    }

    pub fn cancel_polling(&self, task_id: TaskId) {
        self.send(EngineCommand::CancelPolling { task_id });
    }

    pub fn generate_rdf(&self, request: RequestId, graph: Value) {
        self.send(EngineCommand::GenerateRdf { request, graph });
    }

    pub fn infer_graph(&self, request: RequestId, graph: Value) {
        self.send(EngineCommand::InferGraph { request, graph });
    }

    pub fn import_ttl(&self, request: RequestId, body: ImportRequest) {
        self.send(EngineCommand::Import { request, body });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            atestado_error!("Engine thread is gone; command dropped");
        }
    }
}

async fn run_poll(
    backend: &dyn Backend,
    task_id: TaskId,
    interval: Duration,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let sink = ChannelProgressSink::new(event_tx.clone());
    let outcome = poll_until_terminal(backend, &task_id, interval, &cancel, &sink).await;
    atestado_debug!("Poll for task {} ended: {:?}", task_id, outcome);
    let _ = event_tx.send(EngineEvent::PollFinished { task_id, outcome });
}

async fn handle_command(
    backend: &dyn Backend,
    command: EngineCommand,
    event_tx: mpsc::Sender<EngineEvent>,
) {
    let event = match command {
        EngineCommand::Submit { request, path } => EngineEvent::Submitted {
            request,
            result: backend.submit_document(&path).await,
        },
        EngineCommand::GenerateRdf { request, graph } => EngineEvent::RdfGenerated {
            request,
            result: backend.generate_rdf(&graph).await,
        },
        EngineCommand::InferGraph { request, graph } => EngineEvent::InferenceFinished {
            request,
            result: backend.infer_graph(&graph).await,
        },
        EngineCommand::Import { request, body } => EngineEvent::ImportFinished {
            request,
            result: backend.import_ttl(body).await,
        },
        EngineCommand::StartPolling { .. } | EngineCommand::CancelPolling { .. } => return,
    };
    let _ = event_tx.send(event);
}
