//! Platforms file parsing
//!
//! A platforms file extends the built-in table with project-specific boards,
//! groups and board-support package indexes:
//!
//! ```toml
//! additional_urls = ["https://example.com/package_vendor_index.json"]
//!
//! [platforms]
//! feather_m4 = "adafruit:samd:adafruit_feather_m4"
//! nightly = ["uno", "feather_m4"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{hints, SketchCiError};
use crate::platforms::{Fqbn, PlatformEntry, PlatformTable};

/// Root of a platforms file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformsFile {
    /// Extra package index URLs for core commands
    #[serde(default)]
    pub additional_urls: Vec<String>,

    /// Boards and groups keyed by platform name
    #[serde(default)]
    pub platforms: BTreeMap<String, EntrySpec>,
}

/// A board identifier or a list of platform names
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Board(String),
    Group(Vec<String>),
}

impl PlatformsFile {
    /// Load a platforms file from disk
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read platforms file {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("Invalid platforms file {}", path.display()))
    }

    /// Parse a platforms file from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse platforms TOML")
    }

    /// Merge the file's entries into a table, replacing same-named entries
    ///
    /// Board identifiers are validated here; nothing is inserted if any is invalid.
    pub fn apply_to(&self, table: &mut PlatformTable) -> Result<(), SketchCiError> {
        let mut entries = Vec::with_capacity(self.platforms.len());
        for (key, spec) in &self.platforms {
            let entry = match spec {
                EntrySpec::Board(fqbn) => {
                    let fqbn = fqbn.parse::<Fqbn>().map_err(|e| {
                        SketchCiError::config_error_with_hint(
                            format!("Invalid board for platform '{}'", key),
                            Some(e),
                            hints::platforms_file(),
                        )
                    })?;
                    PlatformEntry::Board(fqbn)
                }
                EntrySpec::Group(members) => PlatformEntry::Group(members.clone()),
            };
            entries.push((key.clone(), entry));
        }
        for (key, entry) in entries {
            table.insert(key, entry);
        }
        Ok(())
    }
}

/// Build the table for this run: built-ins plus an optional platforms file
pub fn load_platform_table(
    platforms_file: Option<&Path>,
) -> Result<(PlatformTable, Vec<String>), SketchCiError> {
    let mut table = PlatformTable::builtin();
    let mut urls = Vec::new();

    if let Some(path) = platforms_file {
        let file = PlatformsFile::load_from_path(path).map_err(|e| {
            SketchCiError::config_error_with_hint(
                format!("Could not load platforms file {}", path.display()),
                Some(e),
                hints::platforms_file(),
            )
        })?;
        file.apply_to(&mut table)?;
        urls = file.additional_urls;
    }

    Ok((table, urls))
}
