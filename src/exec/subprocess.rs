//! Subprocess execution with captured output

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Result of a subprocess execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code, -1 when killed by a signal
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        let exit_code = status.code().unwrap_or(-1);
        Self {
            success: status.success(),
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }

    /// Both streams joined, for diagnostics
    pub fn combined_output(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => String::new(),
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stdout, stderr),
        }
    }
}

/// Run a program with arguments and capture both output streams
///
/// No shell is involved. When `search_path` is given it replaces `PATH` for
/// the child so helper tools next to the program are found too.
pub fn run_command(program: &Path, args: &[String], search_path: Option<&OsStr>) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    if let Some(path) = search_path {
        cmd.env("PATH", path);
    }

    let output = cmd
        .output()
        .with_context(|| format!("Failed to execute {}", program.display()))?;

    let duration = start.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    Ok(CommandResult::from_status(
        output.status,
        stdout,
        stderr,
        duration,
    ))
}

/// Find a program in the given search path
pub fn find_program(program: &str, search_path: &OsStr) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    which::which_in(program, Some(search_path), cwd).ok()
}

/// The current `PATH` with extra directories appended
pub fn extend_search_path(extra: &[PathBuf]) -> Result<OsString> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|p| std::env::split_paths(&p).collect())
        .unwrap_or_default();
    dirs.extend(extra.iter().cloned());
    std::env::join_paths(dirs).context("Failed to build executable search path")
}
