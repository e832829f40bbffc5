//! CI service integration module
//!
//! On GitHub Actions, compile failures become workflow annotations and a
//! results table is appended to the job summary.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::results::{CompileStatus, RunSummary};

/// CI output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiFormat {
    /// GitHub Actions format (annotations, job summary)
    GitHubActions,
    /// Plain console output only
    #[default]
    Generic,
}

impl CiFormat {
    /// Auto-detect CI environment
    pub fn detect() -> Self {
        if std::env::var_os("GITHUB_ACTIONS").is_some() {
            CiFormat::GitHubActions
        } else {
            CiFormat::Generic
        }
    }
}

/// CI reporter for outputting results in CI-friendly formats
pub struct CiReporter {
    format: CiFormat,
    step_summary: Option<PathBuf>,
}

impl CiReporter {
    /// Create a new CI reporter
    pub fn new(format: CiFormat, step_summary: Option<PathBuf>) -> Self {
        Self {
            format,
            step_summary,
        }
    }

    /// Create a reporter with auto-detected format
    pub fn auto_detect() -> Self {
        let step_summary = std::env::var_os("GITHUB_STEP_SUMMARY").map(PathBuf::from);
        Self::new(CiFormat::detect(), step_summary)
    }

    /// Report compile results
    pub fn report(&self, summary: &RunSummary) -> Result<()> {
        match self.format {
            CiFormat::GitHubActions => {
                for line in github_annotations(summary) {
                    println!("{}", line);
                }
                if let Some(ref path) = self.step_summary {
                    append_step_summary(path, &markdown_table(summary))?;
                }
                Ok(())
            }
            CiFormat::Generic => Ok(()),
        }
    }
}

/// `::error` workflow commands for every failed compile
pub fn github_annotations(summary: &RunSummary) -> Vec<String> {
    summary
        .failed_outcomes()
        .map(|outcome| {
            let first_line = outcome
                .output
                .as_deref()
                .and_then(|o| o.lines().find(|l| l.contains("error")))
                .unwrap_or("compilation failed");
            format!(
                "::error file={},title={}::{}",
                escape_property(&outcome.path.display().to_string()),
                escape_property(&format!("{} failed on {}", outcome.sketch, outcome.fqbn)),
                escape_data(first_line)
            )
        })
        .collect()
}

/// Markdown results table for the job summary
pub fn markdown_table(summary: &RunSummary) -> String {
    let mut md = String::new();
    md.push_str("## Sketch Compile Results\n\n");
    md.push_str("| Sketch | Platform | Board | Result |\n");
    md.push_str("|--------|----------|-------|--------|\n");
    for outcome in &summary.outcomes {
        let result = match outcome.status {
            CompileStatus::Passed => "✅ Passed",
            CompileStatus::Failed => "❌ Failed",
        };
        md.push_str(&format!(
            "| {} | {} | `{}` | {} |\n",
            outcome.sketch, outcome.platform, outcome.fqbn, result
        ));
    }
    md.push_str(&format!(
        "\n**{} passed, {} failed**\n",
        summary.passed, summary.failed
    ));
    md
}

fn append_step_summary(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open job summary {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write job summary {}", path.display()))
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
