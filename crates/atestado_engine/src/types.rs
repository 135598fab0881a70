use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-chosen id echoed back on the event that answers a command.
pub type RequestId = u64;

/// Opaque identifier of an asynchronous backend task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported by `/check_task/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TaskStatus {
    Processing,
    Completed,
    Error,
    /// Any status the client does not know; treated as still running.
    Other(String),
}

impl From<String> for TaskStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "procesando" => TaskStatus::Processing,
            "completado" => TaskStatus::Completed,
            "error" => TaskStatus::Error,
            _ => TaskStatus::Other(value),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Processing => write!(f, "procesando"),
            TaskStatus::Completed => write!(f, "completado"),
            TaskStatus::Error => write!(f, "error"),
            TaskStatus::Other(status) => write!(f, "{status}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskReport {
    pub status: TaskStatus,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskResult {
    pub grafo_json: Value,
    #[serde(default)]
    pub archivo_procesado: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub ttl: Bytes,
    pub root_name: String,
    pub articles: Vec<String>,
    pub llm_type: String,
}

/// Reply of the graph-store import, with the document kept as sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReply {
    pub status: String,
    pub mensaje: Option<String>,
    pub body: Value,
}

impl From<Value> for ImportReply {
    fn from(body: Value) -> Self {
        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        let status = text("status").unwrap_or_default();
        let mensaje = text("mensaje");
        Self {
            status,
            mensaje,
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(TaskResult),
    Failed { message: String },
    TransportFailed(BackendError),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Submitted {
        request: RequestId,
        result: Result<TaskId, BackendError>,
    },
    PollPending {
        task_id: TaskId,
        status: TaskStatus,
    },
    PollFinished {
        task_id: TaskId,
        outcome: PollOutcome,
    },
    RdfGenerated {
        request: RequestId,
        result: Result<Bytes, BackendError>,
    },
    InferenceFinished {
        request: RequestId,
        result: Result<Bytes, BackendError>,
    },
    ImportFinished {
        request: RequestId,
        result: Result<ImportReply, BackendError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: FailureKind,
    pub message: String,
}

impl BackendError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    MissingTaskId,
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::MissingTaskId => write!(f, "no task id received"),
            FailureKind::Decode => write!(f, "unexpected response body"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
