//! Embry runtime asset bootstrap
//!
//! This crate makes sure the on-disk assets an embedded Ruby VM needs exist
//! before the VM starts: the interpreter standard-library tree and the
//! directory of native shared libraries. Given an install directory, it
//! either recognizes a completed install and returns its layout, or
//! populates the directory from a payload bundled next to the executable:
//! - Layout resolution (`ruby/` stdlib root, `lib/` native libraries)
//! - Bundled payload discovery (env override, exe-relative probing)
//! - Staged, idempotent extraction (directory copy or tar.gz unpack)
//! - Completion marker handling (`install.json`)
//!
//! The VM itself, its extensions, and their registration are external
//! consumers of the returned [`AssetsLayout`]; this crate never touches them.

pub mod bootstrap;
pub mod error;
pub mod layout;
pub mod marker;
pub mod source;

mod extract;

pub use bootstrap::{bootstrap, clean, default_install_dir, inspect, Bootstrapper, InstallState};
pub use error::AssetsError;
pub use layout::{AssetsLayout, NATIVE_LIBS_DIR, STDLIB_DIR};
pub use marker::{InstallMarker, MARKER_FILE};
pub use source::{BundledSource, PayloadKind, PayloadManifest, ARCHIVE_NAME, SOURCE_ENV_VAR};
