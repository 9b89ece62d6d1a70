//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Recursively copy a directory tree.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", src.display()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
        }
    }
    Ok(())
}

/// Find shared libraries under `dir` matching `*.so*` (or `*.dll`/`*.dylib`).
///
/// Versioned sonames like `libfcl.so.0.7` are included, which is why this
/// is a glob and not an extension check.
pub fn shared_libraries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in ["*.so*", "*.dylib", "*.dll"] {
        let full_pattern = dir.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob::glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern_str))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() || path.is_symlink() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_all() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("file.txt"), "content").unwrap();
        fs::write(src.join("nested/inner.h"), "#pragma once").unwrap();

        copy_dir_all(&src, &dst).unwrap();

        assert!(dst.join("file.txt").exists());
        assert!(dst.join("nested/inner.h").exists());
        assert_eq!(fs::read_to_string(dst.join("file.txt")).unwrap(), "content");
    }

    #[test]
    fn test_shared_libraries_matches_versioned_sonames() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("libfcl.so"), "").unwrap();
        fs::write(tmp.path().join("libfcl.so.0.7"), "").unwrap();
        fs::write(tmp.path().join("libfcl.a"), "").unwrap();
        fs::write(tmp.path().join("fcl.h"), "").unwrap();

        let libs = shared_libraries(tmp.path()).unwrap();
        let names: Vec<_> = libs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["libfcl.so", "libfcl.so.0.7"]);
    }
}
