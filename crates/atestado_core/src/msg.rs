use bytes::Bytes;
use serde_json::Value;

use crate::{ActionKind, RequestId, SelectedFile, TaskId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked a new document.
    FileSelected(SelectedFile),
    /// User removed the selected document.
    FileCleared,
    ProcessClicked,
    /// Backend answered the document upload.
    SubmitFinished {
        request: RequestId,
        result: Result<TaskId, String>,
    },
    /// A status query returned a non-terminal status.
    PollPending { task_id: TaskId, status: String },
    TaskCompleted {
        task_id: TaskId,
        graph: Value,
        file_name: Option<String>,
    },
    TaskFailed { task_id: TaskId, message: String },
    /// The status query itself could not be completed.
    PollTransportFailed { task_id: TaskId, message: String },
    ExportClicked,
    InferClicked,
    ImportClicked,
    /// User supplied a previously saved graph JSON.
    ManualGraphLoaded { file: SelectedFile, graph: Value },
    ManualGraphRejected { message: String },
    RdfFinished {
        request: RequestId,
        result: Result<Bytes, String>,
    },
    InferenceFinished {
        request: RequestId,
        result: Result<Bytes, String>,
    },
    ImportFinished {
        request: RequestId,
        result: Result<ImportReply, String>,
    },
    /// Saving an artifact to disk failed after the action itself succeeded.
    DownloadFailed { action: ActionKind, message: String },
    /// User dismissed the loading overlay.
    OverlayDismissed,
    Tick,
}

/// Reply of the graph-store import endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReply {
    pub status: String,
    pub message: Option<String>,
    /// The reply document as the backend sent it.
    pub body: Value,
}

impl ImportReply {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}
