use bytes::Bytes;
use serde_json::Value;

use crate::{
    graph_artifact_name, graph_name, processed_download_name, ActionKind, ActionStatus, AppState,
    Effect, FollowUp, ImportReply, Msg, RequestId, TaskId, TaskPhase,
};

const MSG_PROCESSING: &str = "Processing document";
const MSG_PROCESSED: &str = "Document processed";
const MSG_TASK_FAILED: &str = "Backend reported a processing error";
const MSG_EXPORTING: &str = "Generating RDF";
const MSG_INFERRING: &str = "Running inference";
const MSG_IMPORTING: &str = "Importing into graph store";
const MSG_DONE: &str = "Completed";
const MSG_IMPORT_REJECTED: &str = "Import rejected";
const MSG_CONNECTION_ERROR: &str = "Connection error";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => cancel_effects(state.select_file(file)),
        Msg::FileCleared => cancel_effects(state.clear_file()),
        Msg::ProcessClicked => on_process_clicked(&mut state),
        Msg::SubmitFinished { request, result } => on_submit_finished(&mut state, request, result),
        Msg::PollPending { task_id, .. } => {
            if state.polling_task() == Some(task_id.as_str()) && state.show_overlay() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TaskCompleted {
            task_id,
            graph,
            file_name,
        } => on_task_completed(&mut state, &task_id, graph, file_name),
        Msg::TaskFailed { task_id, message } => {
            if state.polling_task() == Some(task_id.as_str()) {
                let message = if message.is_empty() {
                    MSG_TASK_FAILED.to_string()
                } else {
                    message
                };
                finish_task(&mut state, TaskPhase::Failed);
                state.set_action(ActionKind::Process, ActionStatus::error(message));
            }
            Vec::new()
        }
        Msg::PollTransportFailed { task_id, message } => {
            if state.polling_task() == Some(task_id.as_str()) {
                finish_task(&mut state, TaskPhase::Idle);
                state.set_action(
                    ActionKind::Process,
                    ActionStatus::error(format!("Lost contact with backend: {message}")),
                );
            }
            Vec::new()
        }
        Msg::ExportClicked => on_export_clicked(&mut state),
        Msg::InferClicked => on_infer_clicked(&mut state),
        Msg::ImportClicked => on_import_clicked(&mut state),
        Msg::ManualGraphLoaded { file, graph } => {
            state.set_manual_file(file);
            state.store_graph(graph);
            state.mark_dirty();
            match state.take_pending_follow_up() {
                Some(FollowUp::Export) => on_export_clicked(&mut state),
                Some(FollowUp::Infer) => on_infer_clicked(&mut state),
                None => Vec::new(),
            }
        }
        Msg::ManualGraphRejected { message } => {
            if let Some(follow_up) = state.take_pending_follow_up() {
                let action = match follow_up {
                    FollowUp::Export => ActionKind::Download,
                    FollowUp::Infer => ActionKind::Infer,
                };
                state.set_action(action, ActionStatus::error(message));
            }
            Vec::new()
        }
        Msg::RdfFinished { request, result } => on_rdf_finished(&mut state, request, result),
        Msg::InferenceFinished { request, result } => {
            on_inference_finished(&mut state, request, result)
        }
        Msg::ImportFinished { request, result } => {
            on_import_finished(&mut state, request, result);
            Vec::new()
        }
        Msg::DownloadFailed { action, message } => {
            state.set_action(
                action,
                ActionStatus::error(format!("Download not saved: {message}")),
            );
            Vec::new()
        }
        Msg::OverlayDismissed => {
            if state.is_overlay_visible() {
                state.hide_overlay();
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::Tick => Vec::new(),
    };

    (state, effects)
}

fn cancel_effects(abandoned: Option<TaskId>) -> Vec<Effect> {
    abandoned
        .map(|task_id| vec![Effect::CancelPolling { task_id }])
        .unwrap_or_default()
}

fn finish_task(state: &mut AppState, phase: TaskPhase) {
    state.set_task(phase);
    state.set_loading(false);
}

fn on_process_clicked(state: &mut AppState) -> Vec<Effect> {
    if state.is_loading() {
        return Vec::new();
    }
    let Some(path) = state.file().map(|file| file.path.clone()) else {
        return Vec::new();
    };

    let request = state.begin_request(ActionKind::Process);
    state.set_loading(true);
    state.set_action(ActionKind::Process, ActionStatus::processing(MSG_PROCESSING));
    vec![Effect::SubmitDocument { request, path }]
}

fn on_submit_finished(
    state: &mut AppState,
    request: RequestId,
    result: Result<TaskId, String>,
) -> Vec<Effect> {
    // A late answer for an upload the user already abandoned.
    if !state.settle_request(ActionKind::Process, request) {
        return Vec::new();
    }
    match result {
        Ok(task_id) if !task_id.is_empty() => {
            state.set_task(TaskPhase::Polling {
                task_id: task_id.clone(),
            });
            state.mark_dirty();
            vec![Effect::StartPolling { task_id }]
        }
        Ok(_) => {
            state.set_loading(false);
            state.set_action(ActionKind::Process, ActionStatus::error("No task id received"));
            Vec::new()
        }
        Err(message) => {
            state.set_loading(false);
            state.set_action(ActionKind::Process, ActionStatus::error(message));
            Vec::new()
        }
    }
}

fn on_task_completed(
    state: &mut AppState,
    task_id: &str,
    graph: Value,
    file_name: Option<String>,
) -> Vec<Effect> {
    if state.polling_task() != Some(task_id) {
        return Vec::new();
    }
    finish_task(state, TaskPhase::Completed);

    let contents = match serde_json::to_string_pretty(&graph) {
        Ok(text) => Bytes::from(text),
        Err(err) => {
            state.set_action(ActionKind::Process, ActionStatus::error(err.to_string()));
            return Vec::new();
        }
    };
    state.store_graph(graph);
    state.set_action(ActionKind::Process, ActionStatus::ok(MSG_PROCESSED));
    vec![Effect::SaveDownload {
        action: ActionKind::Process,
        file_name: processed_download_name(file_name.as_deref()),
        contents,
    }]
}

fn on_export_clicked(state: &mut AppState) -> Vec<Effect> {
    if state.is_loading() || state.actions().is_processing(ActionKind::Download) {
        return Vec::new();
    }
    match state.result().cloned() {
        Some(graph) => {
            let request = state.begin_request(ActionKind::Download);
            state.set_action(ActionKind::Download, ActionStatus::processing(MSG_EXPORTING));
            vec![Effect::GenerateRdf { request, graph }]
        }
        None => request_manual_graph(state, FollowUp::Export),
    }
}

fn on_infer_clicked(state: &mut AppState) -> Vec<Effect> {
    if state.is_loading() || state.is_inferring() {
        return Vec::new();
    }
    match state.result().cloned() {
        Some(graph) => {
            let request = state.begin_request(ActionKind::Infer);
            state.set_inferring(true);
            state.set_action(ActionKind::Infer, ActionStatus::processing(MSG_INFERRING));
            vec![Effect::InferGraph { request, graph }]
        }
        None => request_manual_graph(state, FollowUp::Infer),
    }
}

fn request_manual_graph(state: &mut AppState, then: FollowUp) -> Vec<Effect> {
    state.set_pending_follow_up(Some(then));
    state.mark_dirty();
    vec![Effect::RequestManualGraph { then }]
}

fn on_import_clicked(state: &mut AppState) -> Vec<Effect> {
    if state.is_loading() || state.is_importing() {
        return Vec::new();
    }
    let Some(ttl) = state.ttl().cloned() else {
        return Vec::new();
    };
    let root_name = state
        .file()
        .map(|file| file.root_name())
        .or_else(|| state.result().and_then(graph_name).map(str::to_string))
        .unwrap_or_else(|| "grafo".to_string());
    let settings = state.import_settings().clone();

    let request = state.begin_request(ActionKind::Import);
    state.set_importing(true);
    state.set_action(ActionKind::Import, ActionStatus::processing(MSG_IMPORTING));
    vec![Effect::ImportTtl {
        request,
        ttl,
        root_name,
        articles: settings.articles,
        llm_type: settings.llm_type,
    }]
}

fn on_rdf_finished(
    state: &mut AppState,
    request: RequestId,
    result: Result<Bytes, String>,
) -> Vec<Effect> {
    // Superseded by a reset or by a newer export.
    if !state.settle_request(ActionKind::Download, request) {
        return Vec::new();
    }
    match result {
        Ok(contents) => {
            let file_name = graph_artifact_name(state.result(), "rdf");
            state.set_debug(None);
            state.set_action(ActionKind::Download, ActionStatus::ok(MSG_DONE));
            vec![Effect::SaveDownload {
                action: ActionKind::Download,
                file_name,
                contents,
            }]
        }
        Err(message) => {
            state.set_action(ActionKind::Download, ActionStatus::error(message));
            Vec::new()
        }
    }
}

fn on_inference_finished(
    state: &mut AppState,
    request: RequestId,
    result: Result<Bytes, String>,
) -> Vec<Effect> {
    if !state.settle_request(ActionKind::Infer, request) {
        return Vec::new();
    }
    state.set_inferring(false);
    match result {
        Ok(ttl) => {
            let file_name = graph_artifact_name(state.result(), "ttls");
            state.set_ttl(ttl.clone());
            state.set_debug(None);
            state.set_action(ActionKind::Infer, ActionStatus::ok(MSG_DONE));
            vec![Effect::SaveDownload {
                action: ActionKind::Infer,
                file_name,
                contents: ttl,
            }]
        }
        Err(message) => {
            state.set_action(ActionKind::Infer, ActionStatus::error(message));
            Vec::new()
        }
    }
}

fn on_import_finished(
    state: &mut AppState,
    request: RequestId,
    result: Result<ImportReply, String>,
) {
    if !state.settle_request(ActionKind::Import, request) {
        return;
    }
    state.set_importing(false);
    match result {
        Ok(reply) if reply.is_success() => {
            let message = reply.message.unwrap_or_else(|| MSG_DONE.to_string());
            state.set_debug(Some(reply.body));
            state.set_action(ActionKind::Import, ActionStatus::ok(message));
        }
        Ok(reply) => {
            let message = reply
                .message
                .unwrap_or_else(|| MSG_IMPORT_REJECTED.to_string());
            state.set_action(ActionKind::Import, ActionStatus::error(message));
        }
        Err(_) => {
            state.set_action(ActionKind::Import, ActionStatus::error(MSG_CONNECTION_ERROR));
        }
    }
}
