//! Completion marker for installed assets.
//!
//! `install.json` at the install root records which payload a finished
//! install came from. It is written only after extraction and validation
//! succeed, so its presence is what distinguishes a complete install from an
//! interrupted one; subtree non-emptiness alone is not trusted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AssetsError;

/// File name of the completion sentinel at the install root.
pub const MARKER_FILE: &str = "install.json";

/// Identity of a completed install.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallMarker {
    /// Payload version this install came from.
    pub version: String,

    /// Hex-encoded SHA-256 of the source archive, if the payload was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// Unix timestamp of the completed install.
    pub installed_at: u64,
}

impl InstallMarker {
    /// Create a marker for the given payload identity.
    pub fn new(version: String, checksum: Option<String>) -> Self {
        Self {
            version,
            checksum,
            installed_at: current_timestamp(),
        }
    }

    /// Path of the marker file under `install_dir`.
    pub fn path_under(install_dir: &Path) -> PathBuf {
        install_dir.join(MARKER_FILE)
    }

    /// Load the marker if present and parseable.
    ///
    /// An unreadable or corrupt marker reads as absent: the caller treats
    /// the install as incomplete and rebuilds it.
    pub fn load(install_dir: &Path) -> Option<Self> {
        let contents = fs::read_to_string(Self::path_under(install_dir)).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Persist the marker at the install root.
    pub fn save(&self, install_dir: &Path) -> Result<(), AssetsError> {
        let path = Self::path_under(install_dir);
        let json = serde_json::to_string_pretty(self).map_err(|e| AssetsError::Marker {
            path: path.clone(),
            detail: e.to_string(),
        })?;
        fs::write(&path, json).map_err(|e| AssetsError::Marker {
            path,
            detail: e.to_string(),
        })?;
        Ok(())
    }

    /// Whether this marker matches the given payload identity.
    pub fn matches(&self, version: &str, checksum: Option<&str>) -> bool {
        self.version == version && self.checksum.as_deref() == checksum
    }
}

fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let marker = InstallMarker::new("3.1.2".to_string(), Some("abc123".to_string()));

        marker.save(temp.path()).unwrap();
        let loaded = InstallMarker::load(temp.path()).unwrap();

        assert_eq!(loaded, marker);
    }

    #[test]
    fn test_missing_marker_loads_as_none() {
        let temp = tempfile::tempdir().unwrap();
        assert!(InstallMarker::load(temp.path()).is_none());
    }

    #[test]
    fn test_corrupt_marker_loads_as_none() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join(MARKER_FILE), "not json {").unwrap();

        assert!(InstallMarker::load(temp.path()).is_none());
    }

    #[test]
    fn test_matches_payload_identity() {
        let marker = InstallMarker::new("3.1.2".to_string(), Some("abc".to_string()));

        assert!(marker.matches("3.1.2", Some("abc")));
        assert!(!marker.matches("3.1.3", Some("abc")));
        assert!(!marker.matches("3.1.2", Some("def")));
        assert!(!marker.matches("3.1.2", None));
    }

    #[test]
    fn test_timestamp_is_set() {
        let marker = InstallMarker::new("1".to_string(), None);
        assert!(marker.installed_at > 0);
    }
}
