use std::path::PathBuf;

use bytes::Bytes;
use serde_json::Value;

use crate::{ActionKind, RequestId, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Upload the selected document and obtain a task id.
    SubmitDocument { request: RequestId, path: PathBuf },
    StartPolling { task_id: TaskId },
    /// Abandon the poll loop for a task that is no longer current.
    CancelPolling { task_id: TaskId },
    /// Save an artifact produced by `action` under `file_name`.
    SaveDownload {
        action: ActionKind,
        file_name: String,
        contents: Bytes,
    },
    /// No graph is held; ask the user for a previously saved graph JSON.
    RequestManualGraph { then: FollowUp },
    GenerateRdf { request: RequestId, graph: Value },
    InferGraph { request: RequestId, graph: Value },
    ImportTtl {
        request: RequestId,
        ttl: Bytes,
        root_name: String,
        articles: Vec<String>,
        llm_type: String,
    },
}

/// Action to resume once a manually supplied graph has been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    Export,
    Infer,
}

impl Effect {
    /// Id of the backend request this effect starts, if it starts one.
    pub fn request(&self) -> Option<RequestId> {
        match self {
            Effect::SubmitDocument { request, .. }
            | Effect::GenerateRdf { request, .. }
            | Effect::InferGraph { request, .. }
            | Effect::ImportTtl { request, .. } => Some(*request),
            _ => None,
        }
    }
}
