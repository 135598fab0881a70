use std::sync::Arc;
use std::time::{Duration, Instant};

use atestado_engine::{
    BackendSettings, EngineEvent, EngineHandle, ImportRequest, PollOutcome, ReqwestBackend, TaskId,
};
use bytes::Bytes;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer) -> EngineHandle {
    let backend = ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .unwrap();
    EngineHandle::with_backend(Arc::new(backend), Duration::from_millis(10))
}

/// Blocks until `accept` returns a value, skipping other events.
fn wait_for<T>(engine: &EngineHandle, mut accept: impl FnMut(EngineEvent) -> Option<T>) -> T {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Ok(event) = engine.recv_timeout(Duration::from_millis(100)) {
            if let Some(value) = accept(event) {
                return value;
            }
        }
    }
    panic!("timed out waiting for engine event");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_then_poll_to_completion() {
    atestado_logging::initialize_for_tests();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/procesarG/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "task_id": "t1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check_task/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "procesando" })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/check_task/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "completado",
            "result": { "grafo_json": { "nombre_grafo": "g" } }
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("doc.pdf");
    std::fs::write(&doc, b"%PDF").unwrap();

    let engine = engine_for(&server);
    engine.submit(7, &doc);
    let task_id = wait_for(&engine, |event| match event {
        EngineEvent::Submitted { request, result } => {
            assert_eq!(request, 7);
            Some(result.expect("submitted"))
        }
        _ => None,
    });
    assert_eq!(task_id, TaskId::new("t1"));

    engine.start_polling(task_id);
    let mut pending = 0;
    let outcome = wait_for(&engine, |event| match event {
        EngineEvent::PollPending { .. } => {
            pending += 1;
            None
        }
        EngineEvent::PollFinished { outcome, .. } => Some(outcome),
        _ => None,
    });
    assert_eq!(pending, 1);
    assert!(matches!(outcome, PollOutcome::Completed(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_polling_reports_cancelled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/check_task/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "procesando" })))
        .mount(&server)
        .await;

    let backend = ReqwestBackend::new(BackendSettings {
        base_url: server.uri(),
        ..BackendSettings::default()
    })
    .unwrap();
    let engine = EngineHandle::with_backend(Arc::new(backend), Duration::from_secs(30));
    engine.start_polling(TaskId::new("slow"));
    engine.cancel_polling(TaskId::new("slow"));

    let (task_id, outcome) = wait_for(&engine, |event| match event {
        EngineEvent::PollFinished { task_id, outcome } => Some((task_id, outcome)),
        _ => None,
    });
    assert_eq!(task_id, TaskId::new("slow"));
    assert_eq!(outcome, PollOutcome::Cancelled);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn follow_up_actions_report_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/inferir_grafo_ttls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("@prefix ex: <http://e/> ."))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cargaNeo4j/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "status": "success", "mensaje": "loaded" })),
        )
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.infer_graph(1, json!({ "nombre_grafo": "g" }));
    let ttl = wait_for(&engine, |event| match event {
        EngineEvent::InferenceFinished { request: 1, result } => Some(result.expect("inferred")),
        _ => None,
    });
    assert!(ttl.starts_with(b"@prefix"));

    engine.import_ttl(
        2,
        ImportRequest {
            ttl: Bytes::from(ttl),
            root_name: "doc".to_string(),
            articles: vec!["Article240_1".to_string()],
            llm_type: "ttls".to_string(),
        },
    );
    let reply = wait_for(&engine, |event| match event {
        EngineEvent::ImportFinished { request: 2, result } => Some(result.expect("imported")),
        _ => None,
    });
    assert_eq!(reply.mensaje.as_deref(), Some("loaded"));
    assert_eq!(reply.body["status"], "success");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_are_told_apart_by_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generar_rdfG/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rdf/>"))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.generate_rdf(10, json!({ "nombre_grafo": "a" }));
    engine.generate_rdf(11, json!({ "nombre_grafo": "b" }));

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let request = wait_for(&engine, |event| match event {
            EngineEvent::RdfGenerated { request, result } => {
                assert_eq!(&result.expect("rdf")[..], b"<rdf/>");
                Some(request)
            }
            _ => None,
        });
        seen.push(request);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![10, 11]);
}
