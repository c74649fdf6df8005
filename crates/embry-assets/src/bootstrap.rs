//! Asset bootstrap.
//!
//! Ensures the runtime assets an embedded Ruby VM needs (the standard
//! library tree and the native shared-library directory) exist under an
//! install directory, populating them from the bundled payload when missing,
//! and resolves the final layout.
//!
//! Extraction is staged: the payload lands in `tmp/` under the install root,
//! completed subtrees are renamed into place, and the completion marker is
//! written last. An interrupted run therefore leaves either the previous
//! complete install or a tree the next run recognizes as incomplete and
//! rebuilds. Callers must serialize concurrent calls against the same
//! install directory.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::AssetsError;
use crate::extract;
use crate::layout::{AssetsLayout, NATIVE_LIBS_DIR, STDLIB_DIR};
use crate::marker::InstallMarker;
use crate::source::{BundledSource, PayloadKind};

/// Name of the staging directory used during extraction.
const STAGING_DIR: &str = "tmp";

/// Bootstrap the runtime assets under `install_dir` with default options.
///
/// Equivalent to `Bootstrapper::new(install_dir).run()`.
pub fn bootstrap(install_dir: impl AsRef<Path>) -> Result<AssetsLayout, AssetsError> {
    Bootstrapper::new(install_dir).run()
}

/// Conventional per-user install directory (`~/.embry/runtime`).
pub fn default_install_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".embry").join("runtime"))
}

/// State of an install directory, as reported by [`inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    /// No asset subtrees present (or the directory itself is missing).
    Absent,

    /// Subtrees present but no matching completion marker; the next
    /// bootstrap run will rebuild.
    Incomplete,

    /// Marker present and both subtrees populated.
    Complete(InstallMarker),
}

/// Inspect an install directory without modifying it.
pub fn inspect(install_dir: impl AsRef<Path>) -> InstallState {
    let install_dir = install_dir.as_ref();
    let populated = is_populated_dir(&install_dir.join(STDLIB_DIR))
        && is_populated_dir(&install_dir.join(NATIVE_LIBS_DIR));

    match InstallMarker::load(install_dir) {
        Some(marker) if populated => InstallState::Complete(marker),
        _ if populated => InstallState::Incomplete,
        _ if install_dir.join(STDLIB_DIR).exists()
            || install_dir.join(NATIVE_LIBS_DIR).exists() =>
        {
            InstallState::Incomplete
        }
        _ => InstallState::Absent,
    }
}

/// Remove the installed asset subtrees, staging leftovers, and marker.
///
/// The install directory itself is kept. Removing an absent install is a
/// no-op.
pub fn clean(install_dir: impl AsRef<Path>) -> Result<(), AssetsError> {
    let install_dir = install_dir.as_ref();

    for subtree in [STDLIB_DIR, NATIVE_LIBS_DIR, STAGING_DIR] {
        let dir = install_dir.join(subtree);
        if dir.exists() {
            fs::remove_dir_all(&dir).map_err(|e| AssetsError::Extract {
                path: dir.clone(),
                source: e,
            })?;
        }
    }

    let marker = InstallMarker::path_under(install_dir);
    if marker.exists() {
        fs::remove_file(&marker).map_err(|e| AssetsError::Marker {
            path: marker.clone(),
            detail: e.to_string(),
        })?;
    }

    Ok(())
}

/// Configurable bootstrap runner.
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    install_dir: PathBuf,
    source_override: Option<PathBuf>,
    force: bool,
}

impl Bootstrapper {
    /// Target the given install directory with default options.
    pub fn new(install_dir: impl AsRef<Path>) -> Self {
        Self {
            install_dir: install_dir.as_ref().to_path_buf(),
            source_override: None,
            force: false,
        }
    }

    /// Use `root` as the bundled payload instead of probing next to the
    /// executable.
    pub fn with_source(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_override = Some(root.into());
        self
    }

    /// Rebuild the install even when the completion marker matches.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Run the bootstrap to completion.
    ///
    /// Returns a layout whose paths are verified to exist. All writes are
    /// confined to the install directory, and a directory that is already
    /// complete is returned without any write side effects.
    pub fn run(&self) -> Result<AssetsLayout, AssetsError> {
        if self.install_dir.as_os_str().is_empty() {
            return Err(AssetsError::EmptyInstallDir);
        }

        fs::create_dir_all(&self.install_dir).map_err(|e| AssetsError::CreateDir {
            path: self.install_dir.clone(),
            source: e,
        })?;

        // Canonicalize after creation so the layout carries absolute paths.
        let install_dir = self.install_dir.canonicalize()?;

        let source = self.locate_source()?;

        // Archive payloads are read once: the bytes feed both the identity
        // check and the extraction.
        let archive_bytes = match source.kind() {
            PayloadKind::Archive(path) => {
                Some(fs::read(path).map_err(|e| AssetsError::Extract {
                    path: path.clone(),
                    source: e,
                })?)
            }
            PayloadKind::Directory => None,
        };
        let checksum = archive_bytes
            .as_deref()
            .map(|bytes| hex::encode(Sha256::digest(bytes)));

        if !self.force && is_complete(&install_dir, &source, checksum.as_deref()) {
            return AssetsLayout::resolve(&install_dir);
        }

        install(&install_dir, &source, archive_bytes.as_deref())?;

        InstallMarker::new(source.version().to_string(), checksum).save(&install_dir)?;

        AssetsLayout::resolve(&install_dir)
    }

    fn locate_source(&self) -> Result<BundledSource, AssetsError> {
        match &self.source_override {
            Some(root) => BundledSource::at(root).ok_or_else(|| AssetsError::SourceMissing {
                searched: vec![root.clone()],
            }),
            None => BundledSource::locate(),
        }
    }
}

/// A prior run completed with the same payload and its subtrees are intact.
fn is_complete(install_dir: &Path, source: &BundledSource, checksum: Option<&str>) -> bool {
    let Some(marker) = InstallMarker::load(install_dir) else {
        return false;
    };

    marker.matches(source.version(), checksum)
        && is_populated_dir(&install_dir.join(STDLIB_DIR))
        && is_populated_dir(&install_dir.join(NATIVE_LIBS_DIR))
}

/// Stage the payload under `tmp/`, then swap the subtrees into place.
fn install(
    install_dir: &Path,
    source: &BundledSource,
    archive_bytes: Option<&[u8]>,
) -> Result<(), AssetsError> {
    // A marker from a previous payload no longer applies; drop it before
    // touching the tree so an interruption cannot leave a stale "complete"
    // claim over mixed contents.
    let marker_path = InstallMarker::path_under(install_dir);
    if marker_path.exists() {
        fs::remove_file(&marker_path).map_err(|e| AssetsError::Marker {
            path: marker_path.clone(),
            detail: e.to_string(),
        })?;
    }

    let staging = install_dir.join(STAGING_DIR);
    if staging.exists() {
        // Leftover from an interrupted run.
        fs::remove_dir_all(&staging).map_err(|e| AssetsError::Extract {
            path: staging.clone(),
            source: e,
        })?;
    }
    fs::create_dir_all(&staging).map_err(|e| AssetsError::CreateDir {
        path: staging.clone(),
        source: e,
    })?;

    match (source.kind(), archive_bytes) {
        (PayloadKind::Archive(_), Some(bytes)) => extract::unpack_tar_gz(bytes, &staging)?,
        _ => {
            extract::copy_dir_all(&source.root().join(STDLIB_DIR), &staging.join(STDLIB_DIR))?;
            extract::copy_dir_all(
                &source.root().join(NATIVE_LIBS_DIR),
                &staging.join(NATIVE_LIBS_DIR),
            )?;
        }
    }

    for subtree in [STDLIB_DIR, NATIVE_LIBS_DIR] {
        let staged = staging.join(subtree);
        if !is_populated_dir(&staged) {
            return Err(AssetsError::Validation {
                path: staged,
                detail: format!("payload produced no `{}` subtree", subtree),
            });
        }

        let target = install_dir.join(subtree);
        if target.exists() {
            fs::remove_dir_all(&target).map_err(|e| AssetsError::Extract {
                path: target.clone(),
                source: e,
            })?;
        }
        fs::rename(&staged, &target).map_err(|e| AssetsError::Extract {
            path: target.clone(),
            source: e,
        })?;
    }

    fs::remove_dir_all(&staging).map_err(|e| AssetsError::Extract {
        path: staging,
        source: e,
    })?;

    Ok(())
}

/// Non-empty directory check used for structural validation.
fn is_populated_dir(dir: &Path) -> bool {
    match fs::read_dir(dir) {
        Ok(mut entries) => entries.next().is_some(),
        Err(_) => false,
    }
}
