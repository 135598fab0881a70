use crate::{ActionKind, AppState, StatusKind, TaskId};

const TRUNCATED_MARKER: &str = "\n... [truncated]";
pub const MAX_DEBUG_PREVIEW: usize = 8_192;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub file_name: Option<String>,
    /// Step indicator position, 1 through 6 (6 means everything is done).
    pub current_step: u8,
    pub actions: Vec<ActionRowView>,
    pub polling_task: Option<TaskId>,
    pub loading: bool,
    pub overlay: bool,
    pub inferring: bool,
    pub importing: bool,
    pub process_enabled: bool,
    pub export_enabled: bool,
    /// Export will first ask for a saved graph JSON.
    pub export_needs_graph: bool,
    pub infer_enabled: bool,
    pub import_enabled: bool,
    pub debug_json: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRowView {
    pub action: ActionKind,
    pub status: StatusKind,
    pub message: String,
}

/// Step indicator derived from what the user has produced so far.
pub fn current_step(has_file: bool, has_result: bool, has_ttl: bool, import_ok: bool) -> u8 {
    if import_ok {
        6
    } else if has_ttl {
        5
    } else if has_result {
        3
    } else if has_file {
        2
    } else {
        1
    }
}

pub(crate) fn build_view(state: &AppState) -> AppViewModel {
    let actions = state.actions();
    let has_file = state.file().is_some();
    let has_result = state.result().is_some();
    let has_ttl = state.ttl().is_some();
    let loading = state.is_loading();

    AppViewModel {
        file_name: state.file().map(|file| file.name.clone()),
        current_step: current_step(
            has_file,
            has_result,
            has_ttl,
            actions.status(ActionKind::Import) == StatusKind::Ok,
        ),
        actions: actions
            .iter()
            .map(|(action, status)| ActionRowView {
                action,
                status: status.kind,
                message: status.message.clone(),
            })
            .collect(),
        polling_task: state.polling_task().map(ToOwned::to_owned),
        loading,
        overlay: state.is_overlay_visible(),
        inferring: state.is_inferring(),
        importing: state.is_importing(),
        process_enabled: has_file && !loading,
        export_enabled: !loading,
        export_needs_graph: !has_result,
        infer_enabled: has_result && !loading && !state.is_inferring(),
        import_enabled: has_ttl && !loading && !state.is_importing(),
        debug_json: state
            .debug()
            .and_then(|value| serde_json::to_string_pretty(value).ok())
            .map(|text| truncate_preview(&text)),
    }
}

fn truncate_preview(text: &str) -> String {
    if text.len() <= MAX_DEBUG_PREVIEW {
        return text.to_string();
    }
    let mut end = MAX_DEBUG_PREVIEW;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATED_MARKER}", &text[..end])
}
