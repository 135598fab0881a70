use std::path::Path;
use std::time::Duration;

use atestado_logging::{atestado_debug, atestado_info};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::{BackendError, FailureKind, ImportReply, ImportRequest, TaskId, TaskReport};

const IMPORT_FILE_NAME: &str = "grafo_importar.ttl";

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub max_artifact_bytes: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(3),
            max_artifact_bytes: 256 * 1024 * 1024,
        }
    }
}

/// The backend endpoints the pipeline consumes.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Uploads a document to `/procesarG/` and returns the task id.
    async fn submit_document(&self, path: &Path) -> Result<TaskId, BackendError>;

    async fn check_task(&self, task_id: &TaskId) -> Result<TaskReport, BackendError>;

    async fn generate_rdf(&self, graph: &Value) -> Result<Bytes, BackendError>;

    async fn infer_graph(&self, graph: &Value) -> Result<Bytes, BackendError>;

    async fn import_ttl(&self, request: ImportRequest) -> Result<ImportReply, BackendError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    task_id: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    settings: BackendSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let mut base_url = settings.base_url.trim().to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base = Url::parse(&base_url)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| BackendError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        self.base
            .join(path)
            .map_err(|err| BackendError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn task_url(&self, task_id: &TaskId) -> Result<Url, BackendError> {
        let mut url = self.endpoint("check_task/")?;
        url.path_segments_mut()
            .map_err(|_| BackendError::new(FailureKind::InvalidUrl, "base url cannot hold a path"))?
            .pop_if_empty()
            .push(task_id.as_str());
        Ok(url)
    }

    async fn post_graph(&self, path: &str, graph: &Value) -> Result<Bytes, BackendError> {
        let url = self.endpoint(path)?;
        atestado_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .json(graph)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response)?;
        self.read_limited(response).await
    }

    async fn read_limited(&self, response: Response) -> Result<Bytes, BackendError> {
        let max_bytes = self.settings.max_artifact_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn submit_document(&self, path: &Path) -> Result<TaskId, BackendError> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|err| BackendError::new(FailureKind::Io, format!("{}: {err}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documento".to_string());
        let part = Part::bytes(contents)
            .file_name(file_name)
            .mime_str(document_mime(path))
            .map_err(map_reqwest_error)?;

        let url = self.endpoint("procesarG/")?;
        atestado_info!("Uploading {} to {}", path.display(), url);
        let response = self
            .client
            .post(url)
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: SubmitResponse = ensure_success(response)?
            .json()
            .await
            .map_err(map_reqwest_error)?;

        match body.task_id {
            Some(Value::String(id)) if !id.is_empty() => Ok(TaskId::new(id)),
            Some(Value::Number(id)) => Ok(TaskId::new(id.to_string())),
            _ => Err(BackendError::new(
                FailureKind::MissingTaskId,
                "response did not contain a task_id",
            )),
        }
    }

    async fn check_task(&self, task_id: &TaskId) -> Result<TaskReport, BackendError> {
        let url = self.task_url(task_id)?;
        atestado_debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(map_reqwest_error)?;
        ensure_success(response)?
            .json()
            .await
            .map_err(map_reqwest_error)
    }

    async fn generate_rdf(&self, graph: &Value) -> Result<Bytes, BackendError> {
        self.post_graph("generar_rdfG/", graph).await
    }

    async fn infer_graph(&self, graph: &Value) -> Result<Bytes, BackendError> {
        self.post_graph("inferir_grafo_ttls/", graph).await
    }

    async fn import_ttl(&self, request: ImportRequest) -> Result<ImportReply, BackendError> {
        let articles = serde_json::to_string(&request.articles)
            .map_err(|err| BackendError::new(FailureKind::Decode, err.to_string()))?;
        let ttl = Part::bytes(request.ttl.to_vec())
            .file_name(IMPORT_FILE_NAME)
            .mime_str("text/turtle")
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .part("file", ttl)
            .text("root_name", request.root_name)
            .text("articles", articles)
            .text("llm_type", request.llm_type);

        let url = self.endpoint("cargaNeo4j/")?;
        atestado_info!("Importing turtle into graph store via {}", url);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response)?
            .json::<Value>()
            .await
            .map(ImportReply::from)
            .map_err(map_reqwest_error)
    }
}

fn document_mime(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

fn ensure_success(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(BackendError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

fn too_large(max_bytes: u64, actual: u64) -> BackendError {
    BackendError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        return BackendError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return BackendError::new(FailureKind::Decode, err.to_string());
    }
    BackendError::new(FailureKind::Network, err.to_string())
}
