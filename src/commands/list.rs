//! Platform listing

use std::path::Path;

use anyhow::Result;
use console::style;

use crate::config::load_platform_table;
use crate::platforms::{PlatformEntry, PlatformTable};

/// Print every board and group, then exit successfully
pub fn execute(platforms_file: Option<&Path>) -> Result<u8> {
    let (table, _) = load_platform_table(platforms_file)?;
    print!("{}", render_table(&table));
    Ok(crate::error::EXIT_SUCCESS)
}

/// Render the table as aligned text, boards before groups
pub fn render_table(table: &PlatformTable) -> String {
    if table.is_empty() {
        return "No platforms defined\n".to_string();
    }

    let width = table.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let mut boards = String::new();
    let mut groups = String::new();

    for (key, entry) in table.iter() {
        match entry {
            PlatformEntry::Board(fqbn) => {
                boards.push_str(&format!("  {:<width$}  {}\n", key, fqbn, width = width));
            }
            PlatformEntry::Group(members) => {
                groups.push_str(&format!(
                    "  {:<width$}  {}\n",
                    key,
                    members.join(", "),
                    width = width
                ));
            }
        }
    }

    let mut out = format!("{}\n{}", style("Platforms:").bold(), boards);
    if !groups.is_empty() {
        out.push_str(&format!("\n{}\n{}", style("Groups:").bold(), groups));
    }
    out
}
