use atestado_core::{
    update, ActionKind, AppState, Effect, FollowUp, ImportReply, ImportSettings, Msg, RequestId,
    SelectedFile, StatusKind, DEFAULT_ARTICLES,
};
use bytes::Bytes;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn init_logging() {
    atestado_logging::initialize_for_tests();
}

fn graph() -> Value {
    json!({ "nombre_grafo": "grafo1", "entidades": [] })
}

fn request_of(effects: &[Effect]) -> RequestId {
    effects
        .iter()
        .find_map(Effect::request)
        .expect("no backend request started")
}

fn import_reply(status: &str, mensaje: &str) -> ImportReply {
    ImportReply {
        status: status.to_string(),
        message: Some(mensaje.to_string()),
        body: json!({ "status": status, "mensaje": mensaje }),
    }
}

/// State after a document has been processed into `graph()`.
fn processed(state: AppState) -> AppState {
    let (state, _) = update(state, Msg::FileSelected(SelectedFile::from_path("doc.pdf")));
    let (state, effects) = update(state, Msg::ProcessClicked);
    let (state, _) = update(
        state,
        Msg::SubmitFinished {
            request: request_of(&effects),
            result: Ok("t1".to_string()),
        },
    );
    let (state, _) = update(
        state,
        Msg::TaskCompleted {
            task_id: "t1".to_string(),
            graph: graph(),
            file_name: None,
        },
    );
    state
}

fn inferred(state: AppState) -> AppState {
    let (state, effects) = update(state, Msg::InferClicked);
    let (state, _) = update(
        state,
        Msg::InferenceFinished {
            request: request_of(&effects),
            result: Ok(Bytes::from_static(b"@prefix ex: <http://e/> .\n")),
        },
    );
    state
}

fn downloads(effects: &[Effect]) -> Vec<(ActionKind, String)> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::SaveDownload {
                action, file_name, ..
            } => Some((*action, file_name.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn export_downloads_rdf_named_after_graph() {
    init_logging();
    let state = processed(AppState::new());
    let (state, effects) = update(state, Msg::ExportClicked);
    let request = request_of(&effects);
    assert_eq!(
        effects,
        vec![Effect::GenerateRdf {
            request,
            graph: graph()
        }]
    );
    assert_eq!(state.actions().status(ActionKind::Download), StatusKind::Processing);

    // A second click while the request is in flight fires nothing.
    let (state, effects) = update(state, Msg::ExportClicked);
    assert!(effects.is_empty());

    let (state, effects) = update(
        state,
        Msg::RdfFinished {
            request,
            result: Ok(Bytes::from_static(b"<rdf/>")),
        },
    );
    assert_eq!(
        downloads(&effects),
        vec![(ActionKind::Download, "grafo1.rdf".to_string())]
    );
    assert_eq!(state.actions().status(ActionKind::Download), StatusKind::Ok);
    assert!(state.debug().is_none());
}

#[test]
fn export_failure_marks_download_error() {
    init_logging();
    let (state, effects) = update(processed(AppState::new()), Msg::ExportClicked);
    let (state, effects) = update(
        state,
        Msg::RdfFinished {
            request: request_of(&effects),
            result: Err("http status 500".to_string()),
        },
    );
    assert!(effects.is_empty());
    let status = state.actions().get(ActionKind::Download);
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.message, "http status 500");
}

#[test]
fn export_without_graph_asks_for_manual_json_then_resumes() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ExportClicked);
    assert_eq!(
        effects,
        vec![Effect::RequestManualGraph {
            then: FollowUp::Export
        }]
    );
    assert_eq!(state.pending_follow_up(), Some(FollowUp::Export));
    assert!(state.view().export_needs_graph);
    assert!(!state.view().infer_enabled);

    let (state, effects) = update(
        state,
        Msg::ManualGraphLoaded {
            file: SelectedFile::from_path("saved/grafo1.json"),
            graph: graph(),
        },
    );
    assert!(matches!(
        &effects[..],
        [Effect::GenerateRdf { graph: sent, .. }] if sent == &graph()
    ));
    assert_eq!(state.pending_follow_up(), None);
    assert_eq!(state.file().unwrap().name, "grafo1.json");
    let view = state.view();
    assert!(!view.export_needs_graph);
    assert!(view.infer_enabled);
}

#[test]
fn rejected_manual_json_marks_pending_action_error() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::InferClicked);
    assert_eq!(state.pending_follow_up(), Some(FollowUp::Infer));
    let (state, effects) = update(
        state,
        Msg::ManualGraphRejected {
            message: "invalid JSON".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.actions().status(ActionKind::Infer), StatusKind::Error);
    assert!(state.result().is_none());
}

#[test]
fn infer_retains_ttl_and_downloads_once() {
    init_logging();
    let state = processed(AppState::new());
    let (state, effects) = update(state, Msg::InferClicked);
    let request = request_of(&effects);
    assert_eq!(
        effects,
        vec![Effect::InferGraph {
            request,
            graph: graph()
        }]
    );
    assert!(state.is_inferring());
    assert!(!state.is_loading());
    assert!(!state.view().infer_enabled);

    let ttl = Bytes::from_static(b"@prefix ex: <http://e/> .\n");
    let (state, effects) = update(
        state,
        Msg::InferenceFinished {
            request,
            result: Ok(ttl.clone()),
        },
    );
    assert_eq!(
        downloads(&effects),
        vec![(ActionKind::Infer, "grafo1.ttls".to_string())]
    );
    assert_eq!(state.ttl(), Some(&ttl));
    assert!(!state.is_inferring());
    let view = state.view();
    assert_eq!(view.current_step, 5);
    assert!(view.import_enabled);
}

#[test]
fn infer_failure_clears_flag_and_keeps_import_disabled() {
    init_logging();
    let (state, effects) = update(processed(AppState::new()), Msg::InferClicked);
    let (state, _) = update(
        state,
        Msg::InferenceFinished {
            request: request_of(&effects),
            result: Err("timeout".to_string()),
        },
    );
    assert!(!state.is_inferring());
    assert_eq!(state.actions().status(ActionKind::Infer), StatusKind::Error);
    assert!(!state.view().import_enabled);
}

#[test]
fn import_is_inert_without_ttl() {
    init_logging();
    let state = processed(AppState::new());
    assert!(!state.view().import_enabled);
    let (state, effects) = update(state, Msg::ImportClicked);
    assert!(effects.is_empty());
    assert_eq!(state.actions().status(ActionKind::Import), StatusKind::Waiting);
}

#[test]
fn import_sends_ttl_with_root_name_and_articles() {
    init_logging();
    let state = inferred(processed(AppState::new()));
    let (state, effects) = update(state, Msg::ImportClicked);
    assert_eq!(effects.len(), 1);
    match &effects[0] {
        Effect::ImportTtl {
            ttl,
            root_name,
            articles,
            llm_type,
            ..
        } => {
            assert!(ttl.starts_with(b"@prefix"));
            assert_eq!(root_name, "doc");
            assert_eq!(articles.len(), DEFAULT_ARTICLES.len());
            assert_eq!(articles[0], "Article240_1");
            assert_eq!(llm_type, "ttls");
        }
        other => panic!("unexpected effect {other:?}"),
    }
    assert!(state.is_importing());
}

#[test]
fn import_uses_configured_settings() {
    init_logging();
    let settings = ImportSettings {
        articles: vec!["Article1_1".to_string()],
        llm_type: "custom".to_string(),
    };
    let state = inferred(processed(AppState::with_import_settings(settings)));
    let (_, effects) = update(state, Msg::ImportClicked);
    assert!(matches!(
        &effects[0],
        Effect::ImportTtl { articles, llm_type, .. }
            if articles == &vec!["Article1_1".to_string()] && llm_type == "custom"
    ));
}

#[test]
fn import_success_reports_backend_message() {
    init_logging();
    let (state, effects) = update(inferred(processed(AppState::new())), Msg::ImportClicked);
    let mut reply = import_reply("success", "loaded");
    reply.body["nodos_creados"] = json!(42);
    let (state, effects) = update(
        state,
        Msg::ImportFinished {
            request: request_of(&effects),
            result: Ok(reply.clone()),
        },
    );
    assert!(effects.is_empty());
    let status = state.actions().get(ActionKind::Import);
    assert_eq!(status.kind, StatusKind::Ok);
    assert_eq!(status.message, "loaded");
    assert!(!state.is_importing());
    assert_eq!(state.view().current_step, 6);
    assert_eq!(state.debug(), Some(&reply.body));
    assert!(state.view().debug_json.unwrap().contains("nodos_creados"));
}

#[test]
fn import_non_success_and_transport_failure_are_errors() {
    init_logging();
    let (state, effects) = update(inferred(processed(AppState::new())), Msg::ImportClicked);
    let (state, _) = update(
        state,
        Msg::ImportFinished {
            request: request_of(&effects),
            result: Ok(import_reply("error", "bad ttl")),
        },
    );
    let status = state.actions().get(ActionKind::Import);
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.message, "bad ttl");

    let (state, effects) = update(state, Msg::ImportClicked);
    let (state, _) = update(
        state,
        Msg::ImportFinished {
            request: request_of(&effects),
            result: Err("refused".to_string()),
        },
    );
    let status = state.actions().get(ActionKind::Import);
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.message, "Connection error");
}

#[test]
fn late_results_after_reselection_are_dropped() {
    init_logging();
    let (state, effects) = update(processed(AppState::new()), Msg::InferClicked);
    let (state, _) = update(state, Msg::FileSelected(SelectedFile::from_path("new.pdf")));
    let (state, effects) = update(
        state,
        Msg::InferenceFinished {
            request: request_of(&effects),
            result: Ok(Bytes::from_static(b"x")),
        },
    );
    assert!(effects.is_empty());
    assert!(state.ttl().is_none());
    assert_eq!(state.actions().status(ActionKind::Infer), StatusKind::Waiting);
}

#[test]
fn failed_download_save_marks_action_error() {
    init_logging();
    let (state, _) = update(
        processed(AppState::new()),
        Msg::DownloadFailed {
            action: ActionKind::Process,
            message: "disk full".to_string(),
        },
    );
    let status = state.actions().get(ActionKind::Process);
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.message.contains("disk full"));
}

#[test]
fn rdf_for_a_superseded_graph_is_not_saved_under_the_new_name() {
    init_logging();
    let (state, stale) = update(processed(AppState::new()), Msg::ExportClicked);
    let (state, _) = update(state, Msg::FileSelected(SelectedFile::from_path("other.pdf")));
    let (state, _) = update(state, Msg::ExportClicked);
    let (state, current) = update(
        state,
        Msg::ManualGraphLoaded {
            file: SelectedFile::from_path("C.json"),
            graph: json!({ "nombre_grafo": "C" }),
        },
    );
    assert_eq!(state.actions().status(ActionKind::Download), StatusKind::Processing);

    let (state, effects) = update(
        state,
        Msg::RdfFinished {
            request: request_of(&stale),
            result: Ok(Bytes::from_static(b"<rdf of A/>")),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.actions().status(ActionKind::Download), StatusKind::Processing);

    let (state, effects) = update(
        state,
        Msg::RdfFinished {
            request: request_of(&current),
            result: Ok(Bytes::from_static(b"<rdf of C/>")),
        },
    );
    assert_eq!(
        downloads(&effects),
        vec![(ActionKind::Download, "C.rdf".to_string())]
    );
    assert_eq!(state.actions().status(ActionKind::Download), StatusKind::Ok);
}

#[test]
fn late_inference_and_import_replies_do_not_settle_new_requests() {
    init_logging();
    let state = inferred(processed(AppState::new()));
    let (state, stale_import) = update(state, Msg::ImportClicked);
    let (state, infer) = update(processed(state), Msg::InferClicked);

    let (state, effects) = update(
        state,
        Msg::InferenceFinished {
            request: request_of(&infer),
            result: Ok(Bytes::from_static(b"@prefix new: <http://n/> .\n")),
        },
    );
    assert_eq!(downloads(&effects).len(), 1);
    let (state, current_import) = update(state, Msg::ImportClicked);

    let (state, _) = update(
        state,
        Msg::ImportFinished {
            request: request_of(&stale_import),
            result: Ok(import_reply("success", "old graph")),
        },
    );
    assert!(state.is_importing());
    assert_eq!(state.actions().status(ActionKind::Import), StatusKind::Processing);

    let (state, _) = update(
        state,
        Msg::ImportFinished {
            request: request_of(&current_import),
            result: Ok(import_reply("success", "new graph")),
        },
    );
    assert_eq!(state.actions().get(ActionKind::Import).message, "new graph");
}
