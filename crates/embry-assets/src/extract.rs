//! Payload extraction into the staging area.

use flate2::read::GzDecoder;
use std::fs;
use std::io::Cursor;
use std::path::{Component, Path};
use tar::Archive;

use crate::error::AssetsError;

/// Recursively copy `src` into `dest`, creating `dest` as needed.
pub(crate) fn copy_dir_all(src: &Path, dest: &Path) -> Result<(), AssetsError> {
    fs::create_dir_all(dest).map_err(|e| AssetsError::Extract {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let entries = fs::read_dir(src).map_err(|e| AssetsError::Extract {
        path: src.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| AssetsError::Extract {
            path: src.to_path_buf(),
            source: e,
        })?;
        let from = entry.path();
        let to = dest.join(entry.file_name());

        let file_type = entry.file_type().map_err(|e| AssetsError::Extract {
            path: from.clone(),
            source: e,
        })?;

        if file_type.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to).map_err(|e| AssetsError::Extract {
                path: to.clone(),
                source: e,
            })?;
        }
    }

    Ok(())
}

/// Unpack a gzipped tarball into `dest`.
///
/// Entries must stay inside `dest`: absolute paths and `..` components are
/// rejected before anything is written.
pub(crate) fn unpack_tar_gz(content: &[u8], dest: &Path) -> Result<(), AssetsError> {
    let decoder = GzDecoder::new(Cursor::new(content));
    let mut archive = Archive::new(decoder);

    let entries = archive.entries().map_err(|e| AssetsError::Extract {
        path: dest.to_path_buf(),
        source: e,
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| AssetsError::Extract {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let entry_path = entry
            .path()
            .map_err(|e| AssetsError::Extract {
                path: dest.to_path_buf(),
                source: e,
            })?
            .into_owned();

        if !is_safe_entry(&entry_path) {
            return Err(AssetsError::UnsafeArchiveEntry { path: entry_path });
        }

        let dest_path = dest.join(&entry_path);

        if entry.header().entry_type().is_dir() {
            fs::create_dir_all(&dest_path).map_err(|e| AssetsError::Extract {
                path: dest_path.clone(),
                source: e,
            })?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent).map_err(|e| AssetsError::Extract {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            entry.unpack(&dest_path).map_err(|e| AssetsError::Extract {
                path: dest_path.clone(),
                source: e,
            })?;
        }
    }

    Ok(())
}

/// An entry is safe when it cannot resolve outside the destination.
fn is_safe_entry(path: &Path) -> bool {
    !path.is_absolute()
        && path
            .components()
            .all(|c| !matches!(c, Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn build_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            // Write the entry name directly into the header rather than via
            // `append_data`/`set_path`, which reject names containing `..` and
            // would prevent building the malicious archives these tests rely on.
            let name = path.as_bytes();
            header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
            header.set_cksum();
            builder.append(&header, *data).unwrap();
        }

        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn test_unpack_creates_nested_files() {
        let temp = tempfile::tempdir().unwrap();
        let archive = build_archive(&[
            ("ruby/stdlib.rb", b"module Kernel; end" as &[u8]),
            ("ruby/net/http.rb", b"class HTTP; end"),
            ("lib/libgraphics.so", b"\x7fELF"),
        ]);

        unpack_tar_gz(&archive, temp.path()).unwrap();

        assert!(temp.path().join("ruby/stdlib.rb").is_file());
        assert!(temp.path().join("ruby/net/http.rb").is_file());
        assert_eq!(
            fs::read(temp.path().join("lib/libgraphics.so")).unwrap(),
            b"\x7fELF"
        );
    }

    #[test]
    fn test_unpack_rejects_parent_traversal() {
        let temp = tempfile::tempdir().unwrap();
        let dest = temp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        let archive = build_archive(&[("../evil.txt", b"pwned" as &[u8])]);

        let result = unpack_tar_gz(&archive, &dest);

        assert!(matches!(
            result,
            Err(AssetsError::UnsafeArchiveEntry { .. })
        ));
        assert!(!temp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_is_safe_entry() {
        assert!(is_safe_entry(Path::new("ruby/stdlib.rb")));
        assert!(is_safe_entry(Path::new("lib")));
        assert!(!is_safe_entry(Path::new("../escape")));
        assert!(!is_safe_entry(Path::new("ruby/../../escape")));
        assert!(!is_safe_entry(Path::new("/etc/passwd")));
    }

    #[test]
    fn test_copy_dir_all_nested() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::write(src.join("top.rb"), "top").unwrap();
        fs::write(src.join("a/b/deep.rb"), "deep").unwrap();

        let dest = temp.path().join("dest");
        copy_dir_all(&src, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("top.rb")).unwrap(), "top");
        assert_eq!(
            fs::read_to_string(dest.join("a/b/deep.rb")).unwrap(),
            "deep"
        );
    }

    #[test]
    fn test_copy_dir_all_missing_source_fails() {
        let temp = tempfile::tempdir().unwrap();
        let result = copy_dir_all(&temp.path().join("absent"), &temp.path().join("dest"));
        assert!(matches!(result, Err(AssetsError::Extract { .. })));
    }
}
