//! Optional RON configuration file, overridden by command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use fetchq_engine::{
    ChainSettings, HttpRenderBackend, ReaderSettings, ReqwestReader, RenderSettings,
    StrategyChain, MIN_RENDERED_CHARS,
};
use fetchq_logging::fetchq_info;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILENAME: &str = "fetchq.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub queue_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub reader: ReaderConfig,
    pub render: RenderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            queue_dir: PathBuf::from("fetch/queue"),
            output_dir: PathBuf::from("fetch/output"),
            log_file: None,
            reader: ReaderConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_bytes: u64,
    /// Name of the environment variable holding the API key.
    pub api_key_env: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        let defaults = ReaderSettings::default();
        Self {
            endpoint: defaults.endpoint,
            timeout_secs: 30,
            max_bytes: defaults.max_bytes,
            api_key_env: Some("JINA_API_KEY".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub min_content_chars: usize,
    pub api_key_env: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 60,
            min_content_chars: MIN_RENDERED_CHARS,
            api_key_env: None,
        }
    }
}

impl AppConfig {
    /// Read `path`, or `fetchq.ron` in the working directory when no path is given.
    /// Only an explicitly named file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILENAME), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_ron(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        fetchq_info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_ron(content: &str) -> Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn reader_settings(&self) -> ReaderSettings {
        ReaderSettings {
            endpoint: self.reader.endpoint.clone(),
            max_bytes: self.reader.max_bytes,
            api_key: env_secret(self.reader.api_key_env.as_deref()),
            ..ReaderSettings::default()
        }
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            endpoint: self.render.endpoint.clone(),
            api_key: env_secret(self.render.api_key_env.as_deref()),
            ..RenderSettings::default()
        }
    }

    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            primary_timeout: Duration::from_secs(self.reader.timeout_secs),
            fallback_timeout: Duration::from_secs(self.render.timeout_secs),
            min_rendered_chars: self.render.min_content_chars,
            ..ChainSettings::default()
        }
    }

    pub fn build_chain(&self) -> StrategyChain {
        StrategyChain::from_backends(
            Arc::new(ReqwestReader::new(self.reader_settings())),
            Arc::new(HttpRenderBackend::new(self.render_settings())),
            self.chain_settings(),
        )
    }
}

fn env_secret(var: Option<&str>) -> Option<String> {
    var.and_then(|name| std::env::var(name).ok())
        .filter(|value| !value.trim().is_empty())
}
