//! Version snapshot metadata types

use serde::{Deserialize, Serialize};

/// Metadata of one stored content snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMeta {
    pub version: u64,
    pub timestamp: u64,
    /// Snapshot size in bytes
    pub size: u64,
}

/// On-disk index co-located with the snapshot files (`index.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionIndex {
    pub versions: Vec<VersionMeta>,
    #[serde(rename = "nextVersionNumber")]
    pub next_version_number: u64,
    #[serde(rename = "currentVersion")]
    pub current_version: Option<u64>,
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self {
            versions: Vec::new(),
            next_version_number: 1,
            current_version: None,
        }
    }
}

impl VersionIndex {
    /// Metadata of the most recently stored snapshot
    pub fn latest(&self) -> Option<&VersionMeta> {
        self.versions.iter().max_by_key(|v| v.version)
    }

    pub fn contains(&self, version: u64) -> bool {
        self.versions.iter().any(|v| v.version == version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_defaults() {
        let index = VersionIndex::default();
        assert_eq!(index.next_version_number, 1);
        assert!(index.latest().is_none());
    }

    #[test]
    fn test_latest_by_version_number() {
        let index = VersionIndex {
            versions: vec![
                VersionMeta { version: 2, timestamp: 5, size: 1 },
                VersionMeta { version: 7, timestamp: 1, size: 9 },
            ],
            next_version_number: 8,
            current_version: Some(7),
        };
        assert_eq!(index.latest().unwrap().version, 7);
        assert!(index.contains(2));
        assert!(!index.contains(3));
    }
}
