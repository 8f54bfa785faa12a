use std::path::PathBuf;

use thiserror::Error;

use crate::area::Area;
use crate::reference::ReferenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionFileSummary {
    pub path: PathBuf,
    pub present: bool,
    pub definition_count: usize,
    pub input_hash_sha256_hex: Option<String>,
}

impl DefinitionFileSummary {
    pub(crate) fn absent(path: PathBuf) -> Self {
        Self {
            path,
            present: false,
            definition_count: 0,
            input_hash_sha256_hex: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AreaLoadSummary {
    pub area: Area,
    pub mobs: DefinitionFileSummary,
    pub items: DefinitionFileSummary,
    pub rooms: DefinitionFileSummary,
}

impl AreaLoadSummary {
    pub fn definition_count(&self) -> usize {
        self.mobs.definition_count + self.items.definition_count + self.rooms.definition_count
    }
}

#[derive(Debug, Error)]
pub enum AreaLoadError {
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory entry in {path}: {source}")]
    ReadDirEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} at {location}: {message}")]
    Parse {
        path: PathBuf,
        location: String,
        message: String,
    },
    #[error("duplicate definition id {id} in {path}")]
    DuplicateId { path: PathBuf, id: u32 },
    #[error("enabled area name cannot be empty")]
    EmptyEnabledArea,
    #[error("duplicate enabled area in request: {area}")]
    DuplicateEnabledArea { area: String },
    #[error("enabled area does not exist on disk: {area} at {expected_dir}")]
    EnabledAreaMissing { area: String, expected_dir: PathBuf },
    #[error("area directory {path} has an unusable name: {source}")]
    InvalidAreaName {
        path: PathBuf,
        #[source]
        source: ReferenceError,
    },
}
