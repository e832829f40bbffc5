//! Compile result aggregation
//!
//! [`RunSummary`] is threaded through the compile loop and decides the
//! final exit status.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::platforms::ResolvedPlatform;
use crate::testing::discovery::Sketch;

/// Outcome of one compile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompileStatus {
    Passed,
    Failed,
}

/// One sketch compiled for one board
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutcome {
    /// Platform key from the table
    pub platform: String,
    /// Board identifier passed to the compiler
    pub fqbn: String,
    /// Sketch name
    pub sketch: String,
    /// Sketch file
    pub path: PathBuf,
    pub status: CompileStatus,
    /// Duration in seconds
    pub duration: f64,
    /// Captured compiler output, kept for failures only
    pub output: Option<String>,
}

impl CompileOutcome {
    /// A passing compile
    pub fn passed(platform: &ResolvedPlatform, sketch: &Sketch, duration: Duration) -> Self {
        Self {
            platform: platform.key.clone(),
            fqbn: platform.fqbn.to_string(),
            sketch: sketch.name.clone(),
            path: sketch.path.clone(),
            status: CompileStatus::Passed,
            duration: duration.as_secs_f64(),
            output: None,
        }
    }

    /// A failing compile with its diagnostics
    pub fn failed(
        platform: &ResolvedPlatform,
        sketch: &Sketch,
        duration: Duration,
        output: impl Into<String>,
    ) -> Self {
        Self {
            status: CompileStatus::Failed,
            output: Some(output.into()),
            ..Self::passed(platform, sketch, duration)
        }
    }

    /// `sketch@fqbn`
    pub fn full_name(&self) -> String {
        format!("{}@{}", self.sketch, self.fqbn)
    }
}

/// Aggregate result of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Passed compiles
    pub passed: usize,
    /// Failed compiles
    pub failed: usize,
    /// First failing compile, as `sketch@fqbn`
    pub first_failure: Option<String>,
    /// Total compile time in seconds
    pub duration: f64,
    /// Timestamp
    pub timestamp: String,
    /// Every compile in the order it ran
    pub outcomes: Vec<CompileOutcome>,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self {
            passed: 0,
            failed: 0,
            first_failure: None,
            duration: 0.0,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            outcomes: Vec::new(),
        }
    }

    /// Record one compile
    pub fn record(&mut self, outcome: CompileOutcome) {
        self.duration += outcome.duration;
        match outcome.status {
            CompileStatus::Passed => self.passed += 1,
            CompileStatus::Failed => {
                self.failed += 1;
                if self.first_failure.is_none() {
                    self.first_failure = Some(outcome.full_name());
                }
            }
        }
        self.outcomes.push(outcome);
    }

    /// Number of compiles
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// True when nothing failed, including when nothing ran
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Failed compiles
    pub fn failed_outcomes(&self) -> impl Iterator<Item = &CompileOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == CompileStatus::Failed)
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n{}", "═".repeat(60));
        println!("COMPILE RESULTS SUMMARY");
        println!("{}", "═".repeat(60));
        println!("Timestamp: {}", self.timestamp);
        println!("Duration:  {:.2}s", self.duration);
        println!();
        println!("  ✓ Passed:  {:>4}", self.passed);
        println!("  ✗ Failed:  {:>4}", self.failed);
        println!("  ─────────────────");
        println!("  Total:     {:>4}", self.total());

        if self.failed > 0 {
            println!();
            println!("{}", "─".repeat(60));
            println!("FAILED SKETCHES:");
            for outcome in self.failed_outcomes() {
                println!("  ✗ {} ({})", outcome.sketch, outcome.fqbn);
            }
        }

        println!("{}", "═".repeat(60));

        if self.total() == 0 {
            println!("No example sketches were compiled");
        } else if self.all_passed() {
            println!("✓ All sketches compiled!");
        } else {
            println!("✗ {} sketch build(s) failed", self.failed);
        }
    }

    /// Export to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run summary")
    }

    /// Export to JUnit XML, one suite per board
    pub fn to_junit_xml(&self) -> String {
        let mut suites: Vec<(&str, Vec<&CompileOutcome>)> = Vec::new();
        for outcome in &self.outcomes {
            match suites.iter_mut().find(|(fqbn, _)| *fqbn == outcome.fqbn) {
                Some((_, members)) => members.push(outcome),
                None => suites.push((outcome.fqbn.as_str(), vec![outcome])),
            }
        }

        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<testsuites tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
            self.total(),
            self.failed,
            self.duration
        ));

        for (fqbn, outcomes) in suites {
            let failures = outcomes
                .iter()
                .filter(|o| o.status == CompileStatus::Failed)
                .count();
            let time: f64 = outcomes.iter().map(|o| o.duration).sum();
            xml.push_str(&format!(
                "  <testsuite name=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">\n",
                escape_xml(fqbn),
                outcomes.len(),
                failures,
                time
            ));

            for outcome in outcomes {
                xml.push_str(&format!(
                    "    <testcase name=\"{}\" classname=\"{}\" time=\"{:.3}\"",
                    escape_xml(&outcome.sketch),
                    escape_xml(&outcome.platform),
                    outcome.duration
                ));
                match outcome.status {
                    CompileStatus::Passed => xml.push_str("/>\n"),
                    CompileStatus::Failed => {
                        xml.push_str(">\n");
                        xml.push_str(&format!(
                            "      <failure message=\"compilation failed\">{}</failure>\n",
                            escape_xml(outcome.output.as_deref().unwrap_or(""))
                        ));
                        xml.push_str("    </testcase>\n");
                    }
                }
            }

            xml.push_str("  </testsuite>\n");
        }

        xml.push_str("</testsuites>\n");
        xml
    }

    /// Write the JSON report
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write JSON report to {}", path.display()))
    }

    /// Write the JUnit report
    pub fn write_junit(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_junit_xml())
            .with_context(|| format!("Failed to write JUnit report to {}", path.display()))
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
