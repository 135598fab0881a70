use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use atestado_core::{Effect, FollowUp, ImportReply, Msg, SelectedFile};
use atestado_engine::{
    safe_download_name, AtomicFileWriter, EngineEvent, EngineHandle, ImportRequest, PollOutcome,
    TaskId,
};
use atestado_logging::{atestado_error, atestado_info, atestado_warn};

/// Where a manually supplied graph JSON comes from when none is held.
pub enum ManualGraphSource {
    /// A path given up front on the command line.
    File(PathBuf),
    /// Ask on the terminal.
    Prompt,
}

/// Executes core effects against the engine and the filesystem.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: AtomicFileWriter,
    manual_graph: ManualGraphSource,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output_dir: PathBuf, manual_graph: ManualGraphSource) -> Self {
        Self {
            engine,
            writer: AtomicFileWriter::new(output_dir),
            manual_graph,
        }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Runs `effects`, returning messages that resolve synchronously.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                Effect::SubmitDocument { request, path } => {
                    atestado_info!("Submitting {} (request {})", path.display(), request);
                    self.engine.submit(request, path);
                }
                Effect::StartPolling { task_id } => {
                    atestado_info!("Polling task {}", task_id);
                    self.engine.start_polling(TaskId::new(task_id));
                }
                Effect::CancelPolling { task_id } => {
                    self.engine.cancel_polling(TaskId::new(task_id));
                }
                Effect::SaveDownload {
                    action,
                    file_name,
                    contents,
                } => {
                    let file_name = safe_download_name(&file_name);
                    match self.writer.write(&file_name, &contents) {
                        Ok(path) => {
                            atestado_info!("Saved {} ({} bytes)", path.display(), contents.len())
                        }
                        Err(err) => {
                            atestado_error!("Failed to save {}: {}", file_name, err);
                            follow_ups.push(Msg::DownloadFailed {
                                action,
                                message: err.to_string(),
                            });
                        }
                    }
                }
                Effect::RequestManualGraph { then } => {
                    follow_ups.push(self.load_manual_graph(then));
                }
                Effect::GenerateRdf { request, graph } => self.engine.generate_rdf(request, graph),
                Effect::InferGraph { request, graph } => self.engine.infer_graph(request, graph),
                Effect::ImportTtl {
                    request,
                    ttl,
                    root_name,
                    articles,
                    llm_type,
                } => {
                    atestado_info!("Importing {} bytes of turtle as {}", ttl.len(), root_name);
                    self.engine.import_ttl(
                        request,
                        ImportRequest {
                            ttl,
                            root_name,
                            articles,
                            llm_type,
                        },
                    );
                }
            }
        }
        follow_ups
    }

    fn load_manual_graph(&self, then: FollowUp) -> Msg {
        let path = match &self.manual_graph {
            ManualGraphSource::File(path) => Some(path.clone()),
            ManualGraphSource::Prompt => prompt_for_path(then),
        };
        match path {
            Some(path) => read_graph_file(&path),
            None => Msg::ManualGraphRejected {
                message: "No graph JSON supplied".to_string(),
            },
        }
    }
}

fn prompt_for_path(then: FollowUp) -> Option<PathBuf> {
    let action = match then {
        FollowUp::Export => "RDF export",
        FollowUp::Infer => "inference",
    };
    print!("No graph held; path to a saved graph JSON for {action}: ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let trimmed = line.trim();
            (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
        }
        Err(err) => {
            atestado_warn!("Could not read from stdin: {}", err);
            None
        }
    }
}

/// Reads a previously saved graph JSON into a message for the core.
pub fn read_graph_file(path: &Path) -> Msg {
    let parsed = fs::read_to_string(path)
        .map_err(|err| format!("{}: {err}", path.display()))
        .and_then(|text| {
            serde_json::from_str::<serde_json::Value>(&text)
                .map_err(|err| format!("{} is not valid JSON: {err}", path.display()))
        });
    match parsed {
        Ok(graph) => Msg::ManualGraphLoaded {
            file: SelectedFile::from_path(path),
            graph,
        },
        Err(message) => {
            atestado_warn!("{}", message);
            Msg::ManualGraphRejected { message }
        }
    }
}

/// Translates an engine event into the message the core understands.
pub fn map_event(event: EngineEvent) -> Option<Msg> {
    let msg = match event {
        EngineEvent::Submitted { request, result } => Msg::SubmitFinished {
            request,
            result: result.map(TaskId::into_inner).map_err(|err| err.to_string()),
        },
        EngineEvent::PollPending { task_id, status } => Msg::PollPending {
            task_id: task_id.into_inner(),
            status: status.to_string(),
        },
        EngineEvent::PollFinished { task_id, outcome } => {
            let task_id = task_id.into_inner();
            match outcome {
                PollOutcome::Completed(result) => Msg::TaskCompleted {
                    task_id,
                    graph: result.grafo_json,
                    file_name: result.archivo_procesado,
                },
                PollOutcome::Failed { message } => Msg::TaskFailed { task_id, message },
                PollOutcome::TransportFailed(err) => Msg::PollTransportFailed {
                    task_id,
                    message: err.to_string(),
                },
                PollOutcome::Cancelled => return None,
            }
        }
        EngineEvent::RdfGenerated { request, result } => Msg::RdfFinished {
            request,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::InferenceFinished { request, result } => Msg::InferenceFinished {
            request,
            result: result.map_err(|e| e.to_string()),
        },
        EngineEvent::ImportFinished { request, result } => Msg::ImportFinished {
            request,
            result: result
                .map(|reply| ImportReply {
                    status: reply.status,
                    message: reply.mensaje,
                    body: reply.body,
                })
                .map_err(|e| e.to_string()),
        },
    };
    Some(msg)
}
