//! Atestado engine: backend client, poll loop and effect execution.
mod client;
mod engine;
mod filename;
mod persist;
mod poll;
mod types;

pub use client::{Backend, BackendSettings, ReqwestBackend};
pub use engine::EngineHandle;
pub use filename::safe_download_name;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use poll::{poll_until_terminal, ChannelProgressSink, ProgressSink};
pub use types::{
    BackendError, EngineEvent, FailureKind, ImportReply, ImportRequest, PollOutcome, RequestId,
    TaskId, TaskReport, TaskResult, TaskStatus,
};
