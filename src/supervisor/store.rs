//! Durable unit registry
//!
//! The registry file (`units.json`) is the source of truth for which units
//! exist and what their intended run state is. It is reloaded at boot and
//! rewritten in full, atomically, after every mutation. The supervisor is the
//! single writer.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::UnitRecord;
use crate::utils::atomic_write;

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    units: Vec<UnitRecord>,
}

/// Full-file load/store for the durable unit registry
pub struct RegistryStore {
    path: PathBuf,
}

impl RegistryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load every persisted unit record (empty when no file exists yet)
    pub fn load(&self) -> Result<Vec<UnitRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        let file: RegistryFile = serde_json::from_str(&raw)?;
        Ok(file.units)
    }

    /// Rewrite the registry in full
    pub fn save(&self, units: Vec<UnitRecord>) -> Result<()> {
        let json = serde_json::to_string_pretty(&RegistryFile { units })?;
        atomic_write(&self.path, &json)
    }
}
