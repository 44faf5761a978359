//! Pipeline configuration, loaded from a YAML parameters file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::models::SourceDb;

#[derive(Debug, Clone, Deserialize)]
pub struct RawDataPaths {
    pub scopus: PathBuf,
    pub wos: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessedDataPaths {
    pub canonical: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputPaths {
    pub audits: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub raw_data: RawDataPaths,
    pub processed_data: ProcessedDataPaths,
    pub outputs: OutputPaths,

    #[serde(default)]
    pub topic_dictionary: Option<PathBuf>,
}

fn default_preferred_db() -> SourceDb {
    SourceDb::Scopus
}

#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_preferred_db")]
    pub preferred_db: SourceDb,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            preferred_db: default_preferred_db(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub paths: PathsConfig,

    #[serde(default)]
    pub deduplication: DedupConfig,

    #[serde(default)]
    pub tagging: TaggingConfig,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::Config(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        let config: PipelineConfig = serde_yaml::from_str(&fs::read_to_string(path)?)?;
        Ok(config)
    }
}
