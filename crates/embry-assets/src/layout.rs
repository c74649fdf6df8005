//! Resolved install layout.

use std::path::{Path, PathBuf};

use crate::error::AssetsError;

/// Name of the interpreter standard-library subtree under the install root.
pub const STDLIB_DIR: &str = "ruby";

/// Name of the native shared-library subtree under the install root.
pub const NATIVE_LIBS_DIR: &str = "lib";

/// Resolved absolute paths required to start the downstream VM.
///
/// Immutable once constructed. A layout is only handed out after both paths
/// have been verified to exist, so consumers can feed them straight into
/// interpreter creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetsLayout {
    ruby_stdlib_path: PathBuf,
    native_libs_dir: PathBuf,
}

impl AssetsLayout {
    /// Resolve the layout under `install_dir`, verifying both subtrees exist.
    pub(crate) fn resolve(install_dir: &Path) -> Result<Self, AssetsError> {
        let layout = Self {
            ruby_stdlib_path: install_dir.join(STDLIB_DIR),
            native_libs_dir: install_dir.join(NATIVE_LIBS_DIR),
        };
        layout.verify()?;
        Ok(layout)
    }

    /// Interpreter standard-library root.
    pub fn ruby_stdlib_path(&self) -> &Path {
        &self.ruby_stdlib_path
    }

    /// Directory containing the native shared libraries the VM loads.
    pub fn native_libs_dir(&self) -> &Path {
        &self.native_libs_dir
    }

    fn verify(&self) -> Result<(), AssetsError> {
        for dir in [&self.ruby_stdlib_path, &self.native_libs_dir] {
            if !dir.is_dir() {
                return Err(AssetsError::Validation {
                    path: dir.clone(),
                    detail: "expected directory is missing".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_verified_layout() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join(STDLIB_DIR)).unwrap();
        fs::create_dir_all(temp.path().join(NATIVE_LIBS_DIR)).unwrap();

        let layout = AssetsLayout::resolve(temp.path()).unwrap();
        assert_eq!(layout.ruby_stdlib_path(), temp.path().join(STDLIB_DIR));
        assert_eq!(layout.native_libs_dir(), temp.path().join(NATIVE_LIBS_DIR));
    }

    #[test]
    fn test_resolve_missing_subtree_fails() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join(STDLIB_DIR)).unwrap();

        let result = AssetsLayout::resolve(temp.path());
        assert!(matches!(result, Err(AssetsError::Validation { .. })));
    }
}
