//! Application configuration: a TOML file loaded at startup, created with
//! defaults on first run. The config path comes from `STYLESEARCH_CONFIG` or
//! falls back to `stylesearch.toml` in the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub encoder: EncoderConfig,
    pub logging: LoggingConfig,
}

/// Filesystem locations for source images and the persisted store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub images_dir: String,
    pub store_path: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images_dir: "static/portfolio_pages".to_string(),
            store_path: "static/clip_embeddings.json".to_string(),
        }
    }
}

/// Which encoder implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// Deterministic model-free encoder; no external process required.
    Hash,
    /// Blocking HTTP client for an embedding model sidecar.
    Http,
}

/// Encoder selection and bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub kind: EncoderKind,
    /// Base URL of the sidecar; only read when `kind = "http"`.
    pub endpoint: String,
    /// Vector width; 512 matches the ViT-B/32 CLIP family.
    pub dimension: usize,
    /// Wall-clock bound applied to every encoder call.
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            kind: EncoderKind::Hash,
            endpoint: "http://127.0.0.1:8300".to_string(),
            dimension: 512,
            timeout_secs: 30,
        }
    }
}

/// Tracing filter applied when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Resolve the config path from the environment or the default location.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("STYLESEARCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("stylesearch.toml"))
}

/// Load the config file, writing a default one on first run.
pub fn load_or_create_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map_or_else(default_config_path, Path::to_path_buf);
    if path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        let cfg = toml::from_str(&raw)
            .with_context(|| format!("parsing config at {}", path.display()))?;
        return Ok(cfg);
    }

    let cfg = AppConfig::default();
    let rendered = toml::to_string_pretty(&cfg).context("rendering default config")?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }
    fs::write(&path, rendered).with_context(|| format!("writing config to {}", path.display()))?;
    Ok(cfg)
}
