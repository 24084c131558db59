use crate::error::{IndexError, Result};
use lsifkit_api::ToolInfo;
use lsifkit_ingest::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MONIKER_SCHEME: &str = "gomod";
pub const DEFAULT_LANGUAGE_ID: &str = "go";

/// Settings for one indexing run. Every field has a default, so a config file
/// only needs the keys it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexerConfig {
    /// Absolute project root; document URIs are built beneath it.
    pub project_root: PathBuf,
    /// Module path of the project itself, e.g. `example.com/app`.
    pub module_name: String,
    pub module_version: String,
    /// Moniker scheme and package manager name.
    pub moniker_scheme: String,
    pub language_id: String,
    /// Unit workers; 0 means one per available core.
    pub workers: usize,
    /// Units buffered between the feeder and the workers.
    pub channel_capacity: usize,
    /// Drop package data once no in-flight document holds it.
    pub evict_released: bool,
    pub tool_info: ToolInfo,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("/"),
            module_name: String::new(),
            module_version: String::new(),
            moniker_scheme: DEFAULT_MONIKER_SCHEME.to_string(),
            language_id: DEFAULT_LANGUAGE_ID.to_string(),
            workers: 0,
            channel_capacity: RuntimeConfig::default().kernel_channel_capacity,
            evict_released: true,
            tool_info: ToolInfo::default(),
        }
    }
}

impl IndexerConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    /// Reads a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.project_root.is_absolute() {
            return Err(IndexError::Config(format!(
                "project root must be absolute, got {}",
                self.project_root.display()
            )));
        }
        if self.moniker_scheme.trim().is_empty() {
            return Err(IndexError::Config("moniker scheme is empty".to_string()));
        }
        if self.language_id.trim().is_empty() {
            return Err(IndexError::Config("language id is empty".to_string()));
        }
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            kernel_channel_capacity: self.channel_capacity.max(1),
            workers: self.workers,
            execute_batch_size: 0,
        }
    }
}
