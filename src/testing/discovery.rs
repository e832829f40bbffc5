//! Example sketch discovery
//!
//! An immediate subdirectory `foo/` of the examples directory is a sketch
//! when it contains `foo/foo.ino`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

/// Extension of Arduino sketch files
pub const SKETCH_EXTENSION: &str = "ino";

/// A compilable example
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sketch {
    /// Directory name, also the sketch file stem
    pub name: String,
    /// Example directory
    pub dir: PathBuf,
    /// Path to the `.ino` file passed to the compiler
    pub path: PathBuf,
}

/// Find the compilable examples directly under `examples_dir`
///
/// Results are sorted by directory name. A missing directory yields no
/// sketches.
pub fn discover_sketches(examples_dir: &Path) -> Result<Vec<Sketch>> {
    if !examples_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut sketches = Vec::new();
    let walker = WalkDir::new(examples_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry =
            entry.with_context(|| format!("Failed to read {}", examples_dir.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(sketch) = as_sketch(entry.path()) {
            sketches.push(sketch);
        }
    }

    Ok(sketches)
}

/// Classify one directory
pub fn as_sketch(dir: &Path) -> Option<Sketch> {
    let name = dir.file_name()?.to_str()?.to_string();
    let path = dir.join(format!("{}.{}", name, SKETCH_EXTENSION));
    if !path.is_file() {
        return None;
    }

    Some(Sketch {
        name,
        dir: dir.to_path_buf(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "void setup() {}\nvoid loop() {}\n").unwrap();
    }

    #[test]
    fn test_same_named_sketch_qualifies() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("foo/foo.ino"));
        std::fs::create_dir_all(temp.path().join("bar")).unwrap();
        touch(&temp.path().join("baz/other.ino"));

        let sketches = discover_sketches(temp.path()).unwrap();
        assert_eq!(sketches.len(), 1);
        assert_eq!(sketches[0].name, "foo");
        assert_eq!(sketches[0].path, temp.path().join("foo/foo.ino"));
    }

    #[test]
    fn test_nested_and_loose_files_ignored() {
        let temp = tempfile::tempdir().unwrap();
        touch(&temp.path().join("loose.ino"));
        touch(&temp.path().join("group/inner/inner.ino"));

        assert!(discover_sketches(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_sorted_by_name() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["Sleep", "Basic", "Magnet"] {
            touch(&temp.path().join(name).join(format!("{}.ino", name)));
        }

        let names: Vec<String> = discover_sketches(temp.path())
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Basic", "Magnet", "Sleep"]);
    }

    #[test]
    fn test_missing_examples_dir() {
        let temp = tempfile::tempdir().unwrap();
        assert!(discover_sketches(&temp.path().join("examples")).unwrap().is_empty());
    }
}
