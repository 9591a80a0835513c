use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::archive::DEFAULT_EXTENSION;

pub const ENV_DATABASE: &str = "CHRONICLE_DB";
pub const ENV_TEMPLATE: &str = "CHRONICLE_TEMPLATE";
pub const ENV_HTTP_ADDR: &str = "CHRONICLE_HTTP_ADDR";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub database_path: PathBuf,
    pub template_path: PathBuf,
    pub document_extension: String,
    pub http_addr: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("chronicle.db"),
            template_path: PathBuf::from("templates/obsidian_task.md.j2"),
            document_extension: DEFAULT_EXTENSION.to_string(),
            http_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ExportConfig {
    /// Reads a JSON config file. Keys missing from the file keep their defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(file)?)
    }

    /// Loads `path` when given, otherwise defaults, then applies environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        Ok(config.apply_env())
    }

    pub fn apply_env(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by the `CHRONICLE_*` variable names.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(db) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.database_path = PathBuf::from(db);
        }
        if let Some(template) = lookup(ENV_TEMPLATE).filter(|v| !v.is_empty()) {
            self.template_path = PathBuf::from(template);
        }
        if let Some(addr) = lookup(ENV_HTTP_ADDR).filter(|v| !v.is_empty()) {
            self.http_addr = addr;
        }
        self
    }
}
