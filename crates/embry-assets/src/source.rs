//! Bundled asset payload location.
//!
//! The payload ships alongside the executable, either as plain `ruby/` and
//! `lib/` directory trees or as a single `runtime-assets.tar.gz` archive
//! holding both. An optional `payload.json` manifest next to the payload
//! carries its version; unversioned payloads get a fixed placeholder so the
//! install marker still has an identity to record.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AssetsError;
use crate::layout::{NATIVE_LIBS_DIR, STDLIB_DIR};

/// Environment variable overriding payload discovery.
pub const SOURCE_ENV_VAR: &str = "EMBRY_ASSETS_DIR";

/// File name of the archive payload form.
pub const ARCHIVE_NAME: &str = "runtime-assets.tar.gz";

/// File name of the optional payload manifest.
pub const PAYLOAD_MANIFEST: &str = "payload.json";

/// Version recorded for payloads that ship without a manifest.
const UNVERSIONED: &str = "0";

/// How the payload is shipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadKind {
    /// `ruby/` and `lib/` directory trees, copied as-is.
    Directory,

    /// A gzipped tarball holding `ruby/` and `lib/` at its top level.
    Archive(PathBuf),
}

/// Optional manifest shipped with the payload (`payload.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayloadManifest {
    /// Payload version stamped into the install marker.
    pub version: String,
}

impl PayloadManifest {
    /// Load the manifest from `root`, if present and parseable.
    pub fn load(root: &Path) -> Option<Self> {
        let contents = fs::read_to_string(root.join(PAYLOAD_MANIFEST)).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

/// A located bundled asset payload.
#[derive(Debug, Clone)]
pub struct BundledSource {
    root: PathBuf,
    kind: PayloadKind,
    version: String,
}

impl BundledSource {
    /// Probe the standard locations for a payload.
    ///
    /// Search order:
    /// 1. `$EMBRY_ASSETS_DIR` (explicit override)
    /// 2. `<exe_dir>/assets/`
    /// 3. `<exe_dir>/../share/embry/assets/`
    pub fn locate() -> Result<Self, AssetsError> {
        let mut searched = Vec::new();

        if let Some(dir) = env::var_os(SOURCE_ENV_VAR) {
            let dir = PathBuf::from(dir);
            if let Some(source) = Self::at(&dir) {
                return Ok(source);
            }
            searched.push(dir);
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(exe_dir) = exe.parent() {
                let candidates = [
                    exe_dir.join("assets"),
                    exe_dir.join("..").join("share").join("embry").join("assets"),
                ];
                for candidate in candidates {
                    if let Some(source) = Self::at(&candidate) {
                        return Ok(source);
                    }
                    searched.push(candidate);
                }
            }
        }

        Err(AssetsError::SourceMissing { searched })
    }

    /// Use `root` as the payload if it qualifies.
    ///
    /// A directory qualifies when it holds the archive or both asset
    /// subtrees. Returns `None` otherwise.
    pub fn at(root: &Path) -> Option<Self> {
        let kind = Self::detect(root)?;
        let version = PayloadManifest::load(root)
            .map(|m| m.version)
            .unwrap_or_else(|| UNVERSIONED.to_string());

        Some(Self {
            root: root.to_path_buf(),
            kind,
            version,
        })
    }

    fn detect(root: &Path) -> Option<PayloadKind> {
        let archive = root.join(ARCHIVE_NAME);
        if archive.is_file() {
            return Some(PayloadKind::Archive(archive));
        }
        if root.join(STDLIB_DIR).is_dir() && root.join(NATIVE_LIBS_DIR).is_dir() {
            return Some(PayloadKind::Directory);
        }
        None
    }

    /// Root directory the payload was found in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Payload form.
    pub fn kind(&self) -> &PayloadKind {
        &self.kind
    }

    /// Payload version (`"0"` when no manifest is shipped).
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_payload_detected() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join(STDLIB_DIR)).unwrap();
        fs::create_dir_all(temp.path().join(NATIVE_LIBS_DIR)).unwrap();

        let source = BundledSource::at(temp.path()).unwrap();
        assert_eq!(source.kind(), &PayloadKind::Directory);
        assert_eq!(source.version(), "0");
    }

    #[test]
    fn test_archive_payload_takes_precedence() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join(STDLIB_DIR)).unwrap();
        fs::create_dir_all(temp.path().join(NATIVE_LIBS_DIR)).unwrap();
        fs::write(temp.path().join(ARCHIVE_NAME), b"gzip bytes").unwrap();

        let source = BundledSource::at(temp.path()).unwrap();
        assert_eq!(
            source.kind(),
            &PayloadKind::Archive(temp.path().join(ARCHIVE_NAME))
        );
    }

    #[test]
    fn test_manifest_version_is_read() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join(STDLIB_DIR)).unwrap();
        fs::create_dir_all(temp.path().join(NATIVE_LIBS_DIR)).unwrap();
        fs::write(
            temp.path().join(PAYLOAD_MANIFEST),
            r#"{ "version": "3.1.2" }"#,
        )
        .unwrap();

        let source = BundledSource::at(temp.path()).unwrap();
        assert_eq!(source.version(), "3.1.2");
    }

    #[test]
    fn test_unqualified_directory_rejected() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join(STDLIB_DIR)).unwrap();
        // No lib/ and no archive.

        assert!(BundledSource::at(temp.path()).is_none());
    }

    #[test]
    fn test_missing_root_rejected() {
        let temp = tempfile::tempdir().unwrap();
        assert!(BundledSource::at(&temp.path().join("nope")).is_none());
    }
}
