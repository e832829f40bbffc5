//! `library.properties` manifest parsing
//!
//! Only the keys the run needs are interpreted: `name` (and `version`) for
//! staging the library next to its examples and `depends` for dependency
//! installation. Other keys are ignored.

use std::path::Path;

use anyhow::{Context, Result};

/// File name of the manifest at the workspace root
pub const LIBRARY_PROPERTIES: &str = "library.properties";

/// Parsed library manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryProperties {
    /// Library name (`name=`)
    pub name: Option<String>,
    /// Library version (`version=`)
    pub version: Option<String>,
    /// Declared dependencies (`depends=`), trimmed, in file order
    pub depends: Vec<String>,
}

impl LibraryProperties {
    /// Load the manifest from a workspace root, `None` when it does not exist
    pub fn load(workspace: &Path) -> Result<Option<Self>> {
        let path = workspace.join(LIBRARY_PROPERTIES);
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(Self::parse(&content)))
    }

    /// Parse manifest text
    pub fn parse(content: &str) -> Self {
        let mut props = Self::default();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "name" => props.name = Some(value.to_string()).filter(|v| !v.is_empty()),
                "version" => props.version = Some(value.to_string()).filter(|v| !v.is_empty()),
                "depends" => props.depends.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }

        props
    }
}

/// Whether `name` follows the Arduino library naming rules
///
/// A valid name is a single path component, so it is safe to use as a folder
/// under `examples/`.
pub fn is_valid_library_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '.' | '-'))
}
