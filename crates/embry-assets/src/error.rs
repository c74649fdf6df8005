//! Bootstrap error types.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while bootstrapping runtime assets
///
/// Every failure surfaces through this enum; the bootstrapper never panics
/// and never leaves a caller with both a layout and an error. Variants that
/// are tied to a filesystem location carry it, exposed uniformly through
/// [`AssetsError::context`].
#[derive(Debug, Error)]
pub enum AssetsError {
    /// Install directory argument was empty
    #[error("install directory path is empty")]
    EmptyInstallDir,

    /// Directory creation failed
    #[error("failed to create directory {}: {}", .path.display(), .source)]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No bundled asset payload could be located
    #[error("bundled runtime assets not found; searched: {}", searched_list(.searched))]
    SourceMissing { searched: Vec<PathBuf> },

    /// Copy or unpack into the install tree failed
    #[error("failed to extract runtime assets to {}: {}", .path.display(), .source)]
    Extract {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Archive contained an entry that would escape the destination
    #[error("archive entry escapes destination: {}", .path.display())]
    UnsafeArchiveEntry { path: PathBuf },

    /// Expected subtree absent or empty after extraction
    #[error("runtime assets at {} failed validation: {}", .path.display(), .detail)]
    Validation { path: PathBuf, detail: String },

    /// Completion marker could not be written or removed
    #[error("install marker at {} is unusable: {}", .path.display(), .detail)]
    Marker { path: PathBuf, detail: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl AssetsError {
    /// The offending path, when the failure is tied to one.
    ///
    /// For a missing bundled source this is the first searched location;
    /// the full list is in the `Display` message.
    pub fn context(&self) -> Option<&Path> {
        match self {
            AssetsError::CreateDir { path, .. }
            | AssetsError::Extract { path, .. }
            | AssetsError::UnsafeArchiveEntry { path }
            | AssetsError::Validation { path, .. }
            | AssetsError::Marker { path, .. } => Some(path),
            AssetsError::SourceMissing { searched } => searched.first().map(PathBuf::as_path),
            AssetsError::EmptyInstallDir | AssetsError::Io(_) => None,
        }
    }
}

fn searched_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
