use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use atestado_core::ImportSettings;
use atestado_engine::BackendSettings;
use serde::{Deserialize, Serialize};

use super::cli::Cli;

const DEFAULT_CONFIG_FILENAME: &str = "atestado.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub output_dir: PathBuf,
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub max_artifact_bytes: u64,
    pub articles: Vec<String>,
    pub llm_type: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let backend = BackendSettings::default();
        let import = ImportSettings::default();
        Self {
            base_url: backend.base_url,
            output_dir: PathBuf::from("output"),
            poll_interval: backend.poll_interval,
            connect_timeout: backend.connect_timeout,
            request_timeout: backend.request_timeout,
            max_artifact_bytes: backend.max_artifact_bytes,
            articles: import.articles,
            llm_type: import.llm_type,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `./atestado.ron` when no path is given and it exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILENAME);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        ron::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(interval) = &cli.poll_interval {
            self.poll_interval = (*interval).into();
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.base_url.clone(),
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
            poll_interval: self.poll_interval,
            max_artifact_bytes: self.max_artifact_bytes,
        }
    }

    pub fn import_settings(&self) -> ImportSettings {
        ImportSettings {
            articles: self.articles.clone(),
            llm_type: self.llm_type.clone(),
        }
    }
}
