use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::atomic::write_json;

/// What the importer remembers about each source file between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportState {
    pub files: BTreeMap<String, ImportFileState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFileState {
    pub input_hash: String,
    pub document_path: String,
}

impl ImportState {
    /// A missing file is an empty state.
    pub fn load(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(io::Error::other)
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        write_json(path, self)
    }

    pub fn is_unchanged(&self, source_key: &str, input_hash: &str) -> bool {
        self.files
            .get(source_key)
            .is_some_and(|prev| prev.input_hash == input_hash)
    }
}
