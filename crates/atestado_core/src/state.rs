use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde_json::Value;

use crate::view_model::{build_view, AppViewModel};
use crate::action::InFlight;
use crate::{root_name, ActionBoard, ActionKind, ActionStatus, FollowUp, RequestId};

/// Opaque task identifier issued by the backend.
pub type TaskId = String;

/// Article identifiers sent with every graph-store import unless configured otherwise.
pub const DEFAULT_ARTICLES: [&str; 15] = [
    "Article240_1",
    "Article242_1",
    "Article234_1",
    "Article234_2",
    "Article234_3",
    "Article235_1",
    "Article235_2",
    "Article236_1",
    "Article236_2",
    "Article240_2",
    "Article241_1",
    "Article241_4",
    "Article242_2",
    "Article242_3",
    "Article242_4",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }

    pub fn root_name(&self) -> String {
        root_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskPhase {
    #[default]
    Idle,
    Polling {
        task_id: TaskId,
    },
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSettings {
    pub articles: Vec<String>,
    pub llm_type: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            articles: DEFAULT_ARTICLES.iter().map(|a| a.to_string()).collect(),
            llm_type: "ttls".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    file: Option<SelectedFile>,
    result: Option<Value>,
    ttl: Option<Bytes>,
    debug: Option<Value>,
    actions: ActionBoard,
    in_flight: InFlight,
    task: TaskPhase,
    loading: bool,
    overlay: bool,
    inferring: bool,
    importing: bool,
    pending_follow_up: Option<FollowUp>,
    import_settings: ImportSettings,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_import_settings(settings: ImportSettings) -> Self {
        Self {
            import_settings: settings,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        build_view(self)
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    pub fn ttl(&self) -> Option<&Bytes> {
        self.ttl.as_ref()
    }

    pub fn debug(&self) -> Option<&Value> {
        self.debug.as_ref()
    }

    pub fn actions(&self) -> &ActionBoard {
        &self.actions
    }

    pub fn task(&self) -> &TaskPhase {
        &self.task
    }

    /// Id of the task currently being polled, if any.
    pub fn polling_task(&self) -> Option<&str> {
        match &self.task {
            TaskPhase::Polling { task_id } => Some(task_id),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay
    }

    pub fn is_inferring(&self) -> bool {
        self.inferring
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    pub fn pending_follow_up(&self) -> Option<FollowUp> {
        self.pending_follow_up
    }

    pub fn import_settings(&self) -> &ImportSettings {
        &self.import_settings
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Replaces the selected file and drops everything derived from the old one.
    ///
    /// Returns the task that was being polled, which the caller must cancel.
    pub(crate) fn select_file(&mut self, file: SelectedFile) -> Option<TaskId> {
        let abandoned = self.abandon_task();
        self.file = Some(file);
        self.result = None;
        self.ttl = None;
        self.debug = None;
        self.actions.reset();
        self.in_flight.forget_all();
        self.inferring = false;
        self.importing = false;
        self.pending_follow_up = None;
        self.mark_dirty();
        abandoned
    }

    pub(crate) fn clear_file(&mut self) -> Option<TaskId> {
        let abandoned = self.abandon_task();
        self.file = None;
        self.result = None;
        self.pending_follow_up = None;
        self.in_flight.forget_all();
        for kind in ActionKind::ALL {
            if self.actions.is_processing(kind) {
                self.actions.set(kind, ActionStatus::waiting());
            }
        }
        self.inferring = false;
        self.importing = false;
        self.mark_dirty();
        abandoned
    }

    /// Starts tracking a backend request for `kind`, superseding any earlier one.
    pub(crate) fn begin_request(&mut self, kind: ActionKind) -> RequestId {
        self.in_flight.begin(kind)
    }

    /// Returns whether `request` is the reply `kind` is still waiting for.
    pub(crate) fn settle_request(&mut self, kind: ActionKind, request: RequestId) -> bool {
        self.in_flight.settle(kind, request)
    }

    /// Drops any task in flight and the loading state tied to it.
    fn abandon_task(&mut self) -> Option<TaskId> {
        let abandoned = match std::mem::take(&mut self.task) {
            TaskPhase::Polling { task_id } => Some(task_id),
            _ => None,
        };
        self.set_loading(false);
        abandoned
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.overlay = loading;
    }

    pub(crate) fn show_overlay(&mut self) -> bool {
        let changed = !self.overlay;
        self.overlay = true;
        changed
    }

    pub(crate) fn hide_overlay(&mut self) {
        self.overlay = false;
    }

    pub(crate) fn set_task(&mut self, task: TaskPhase) {
        self.task = task;
    }

    pub(crate) fn set_action(&mut self, kind: ActionKind, status: ActionStatus) {
        self.actions.set(kind, status);
        self.mark_dirty();
    }

    pub(crate) fn store_graph(&mut self, graph: Value) {
        self.debug = Some(graph.clone());
        self.result = Some(graph);
    }

    pub(crate) fn set_manual_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
    }

    pub(crate) fn set_ttl(&mut self, ttl: Bytes) {
        self.ttl = Some(ttl);
    }

    pub(crate) fn set_debug(&mut self, debug: Option<Value>) {
        self.debug = debug;
    }

    pub(crate) fn set_inferring(&mut self, inferring: bool) {
        self.inferring = inferring;
    }

    pub(crate) fn set_importing(&mut self, importing: bool) {
        self.importing = importing;
    }

    pub(crate) fn set_pending_follow_up(&mut self, follow_up: Option<FollowUp>) {
        self.pending_follow_up = follow_up;
    }

    pub(crate) fn take_pending_follow_up(&mut self) -> Option<FollowUp> {
        self.pending_follow_up.take()
    }
}
