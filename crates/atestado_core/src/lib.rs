//! Atestado core: pure state machine for the upload, poll and follow-up actions.
mod action;
mod effect;
mod msg;
mod naming;
mod state;
mod update;
mod view_model;

pub use action::{ActionBoard, ActionKind, ActionStatus, RequestId, StatusKind};
pub use effect::{Effect, FollowUp};
pub use msg::{ImportReply, Msg};
pub use naming::{graph_artifact_name, graph_name, processed_download_name, root_name};
pub use state::{AppState, ImportSettings, SelectedFile, TaskId, TaskPhase, DEFAULT_ARTICLES};
pub use update::update;
pub use view_model::{current_step, ActionRowView, AppViewModel, MAX_DEBUG_PREVIEW};
