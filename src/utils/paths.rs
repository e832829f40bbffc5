//! Workspace layout helpers

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Directory holding one folder per example sketch
pub fn get_examples_dir(workspace: &Path) -> PathBuf {
    workspace.join("examples")
}

/// Directory appended to the executable search path
pub fn get_bin_dir(workspace: &Path) -> PathBuf {
    workspace.join("bin")
}

/// Library sources copied next to the examples
pub fn get_library_src_dir(workspace: &Path) -> PathBuf {
    workspace.join("src")
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Copy the contents of `src` into `dest`, merging with what is there
///
/// Returns the number of files copied.
pub fn copy_dir_contents(src: &Path, dest: &Path) -> Result<usize> {
    if !src.is_dir() {
        anyhow::bail!("Source directory {} does not exist", src.display());
    }
    ensure_dir(dest)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .context("Walked outside of source directory")?;
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let root = Path::new("/work");
        assert_eq!(get_examples_dir(root), PathBuf::from("/work/examples"));
        assert_eq!(get_bin_dir(root), PathBuf::from("/work/bin"));
        assert_eq!(get_library_src_dir(root), PathBuf::from("/work/src"));
    }

    #[test]
    fn test_copy_dir_contents_recursive() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join("drivers")).unwrap();
        std::fs::write(src.join("Lib.h"), "#pragma once\n").unwrap();
        std::fs::write(src.join("drivers/flash.cpp"), "// flash\n").unwrap();

        let dest = temp.path().join("examples/Lib");
        let copied = copy_dir_contents(&src, &dest).unwrap();

        assert_eq!(copied, 2);
        assert!(dest.join("Lib.h").is_file());
        assert!(dest.join("drivers/flash.cpp").is_file());
    }

    #[test]
    fn test_copy_missing_source_fails() {
        let temp = tempfile::tempdir().unwrap();
        assert!(copy_dir_contents(&temp.path().join("absent"), &temp.path().join("out")).is_err());
    }
}
