//! Per-unit content versioning
//!
//! Layout on disk, co-located under the unit's directory:
//!
//! ```text
//! current            live script content
//! versions/v<N>      numbered snapshot artifacts
//! versions/index.json  { versions: [{version, timestamp, size}],
//!                        nextVersionNumber, currentVersion }
//! ```
//!
//! A snapshot is created only when committed content differs from the most
//! recent stored snapshot. Version numbers are strictly increasing and never
//! reused. Rollback snapshots the live content first (when it is not already
//! captured), so rollback is itself reversible.

use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::{PageMeta, VersionIndex, VersionMeta};
use crate::utils::{atomic_write, current_timestamp};

/// Outcome of a rollback
#[derive(Debug, Clone, serde::Serialize)]
pub struct RollbackOutcome {
    /// Version whose content now lives in the current artifact
    #[serde(rename = "restoredVersion")]
    pub restored_version: u64,
    /// Version created to preserve the pre-rollback live content, if any
    #[serde(rename = "savedCurrentAs", skip_serializing_if = "Option::is_none")]
    pub saved_current_as: Option<u64>,
}

/// Content snapshot store for one unit
pub struct VersionStore {
    dir: PathBuf,
    current_path: PathBuf,
    index: VersionIndex,
}

impl VersionStore {
    /// Open a store, loading the index if one exists
    pub fn open(dir: PathBuf, current_path: PathBuf) -> Result<Self> {
        let index_path = dir.join("index.json");
        let index = if index_path.exists() {
            let raw = fs::read_to_string(&index_path)?;
            serde_json::from_str(&raw)?
        } else {
            VersionIndex::default()
        };

        Ok(Self {
            dir,
            current_path,
            index,
        })
    }

    /// Commit new content: snapshot it when it differs from the latest
    /// snapshot, then overwrite the live file
    pub fn save(&mut self, content: &str) -> Result<Option<VersionMeta>> {
        let created = if self.matches_latest(content)? {
            None
        } else {
            Some(self.store_snapshot(content)?)
        };

        if let Some(meta) = &created {
            self.index.current_version = Some(meta.version);
            self.write_index()?;
        }
        atomic_write(&self.current_path, content)?;

        Ok(created)
    }

    /// List versions newest-first with pagination metadata
    pub fn list(&self, page: usize, limit: usize) -> (Vec<VersionMeta>, PageMeta) {
        let page = page.max(1);
        let limit = limit.max(1);

        let mut versions = self.index.versions.clone();
        versions.sort_by(|a, b| b.version.cmp(&a.version));

        let meta = PageMeta::new(page, limit, versions.len());
        let items = versions
            .into_iter()
            .skip((page - 1) * limit)
            .take(limit)
            .collect();
        (items, meta)
    }

    /// Restore the live file to a stored version's content
    pub fn rollback(&mut self, version: u64) -> Result<RollbackOutcome> {
        if !self.index.contains(version) {
            return Err(Error::version_not_found(version));
        }

        let target = self.version_content(version)?;
        let live = self.current_content()?;

        let mut saved_current_as = None;
        if live != target {
            // Preserve the live content unless the latest snapshot already
            // captured it byte-for-byte.
            if !self.matches_latest(&live)? {
                let meta = self.store_snapshot(&live)?;
                saved_current_as = Some(meta.version);
            }
            atomic_write(&self.current_path, &target)?;
        }

        self.index.current_version = Some(version);
        self.write_index()?;

        Ok(RollbackOutcome {
            restored_version: version,
            saved_current_as,
        })
    }

    /// Read the live content ("" when nothing has been saved yet)
    pub fn current_content(&self) -> Result<String> {
        if !self.current_path.exists() {
            return Ok(String::new());
        }
        Ok(fs::read_to_string(&self.current_path)?)
    }

    /// Read a stored snapshot's content
    pub fn version_content(&self, version: u64) -> Result<String> {
        let path = self.dir.join(format!("v{}", version));
        if !path.exists() {
            return Err(Error::version_not_found(version));
        }
        Ok(fs::read_to_string(path)?)
    }

    /// Number of stored snapshots
    pub fn count(&self) -> usize {
        self.index.versions.len()
    }

    /// Version whose content the live file currently holds, if known
    pub fn current_version(&self) -> Option<u64> {
        self.index.current_version
    }

    fn matches_latest(&self, content: &str) -> Result<bool> {
        match self.index.latest() {
            Some(meta) => Ok(self.version_content(meta.version)? == content),
            None => Ok(false),
        }
    }

    fn store_snapshot(&mut self, content: &str) -> Result<VersionMeta> {
        let version = self.index.next_version_number;
        self.index.next_version_number += 1;

        atomic_write(self.dir.join(format!("v{}", version)), content)?;

        let meta = VersionMeta {
            version,
            timestamp: current_timestamp(),
            size: content.len() as u64,
        };
        self.index.versions.push(meta.clone());
        self.write_index()?;

        Ok(meta)
    }

    fn write_index(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.index)?;
        atomic_write(self.dir.join("index.json"), &json)
    }
}
