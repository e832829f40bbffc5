//! Error types and helpers for user-friendly error messages
//!
//! Every fatal condition of a run maps to one [`SketchCiError`] variant,
//! which carries an actionable hint and decides the process exit code.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code when every sketch compiled (or there was nothing to compile)
pub const EXIT_SUCCESS: u8 = 0;

/// Exit code when at least one sketch failed to compile
pub const EXIT_COMPILE_FAILED: u8 = 1;

/// Exit code for usage errors such as an unknown platform name
pub const EXIT_USAGE: u8 = 2;

/// Exit code for any failed setup step
pub const EXIT_SETUP_FAILED: u8 = 3;

/// Custom error types with helpful context and suggestions
#[derive(Error, Debug)]
pub enum SketchCiError {
    /// A command-line token that names neither a board nor a group
    #[error("Unknown platform: {name}")]
    UnknownPlatform { name: String, hint: String },

    /// Platform table or platforms file problems
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
        hint: Option<String>,
    },

    /// Board manager executable not found
    #[error("Missing tool: {tool}")]
    MissingTool { tool: String, hint: String },

    /// Index update or core install failed
    #[error("{step} failed: {message}")]
    Setup {
        step: String,
        message: String,
        output: Option<String>,
        hint: Option<String>,
    },

    /// A declared library dependency could not be installed
    #[error("Failed to install dependency '{dependency}'")]
    Dependency {
        dependency: String,
        output: Option<String>,
        hint: Option<String>,
    },

    /// Copying the library sources next to the examples failed
    #[error("Failed to copy library to example folder {}", .destination.display())]
    Staging {
        destination: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl SketchCiError {
    /// Create an unknown platform error listing a few valid names
    pub fn unknown_platform(name: impl Into<String>, known: &[&str]) -> Self {
        let mut hint = String::from("Run with --list to see every platform and group.");
        if !known.is_empty() {
            hint = format!("Known platforms include: {}\n{}", known.join(", "), hint);
        }
        Self::UnknownPlatform {
            name: name.into(),
            hint,
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
            hint: None,
        }
    }

    /// Create a configuration error with source and hint
    pub fn config_error_with_hint(
        message: impl Into<String>,
        source: Option<anyhow::Error>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source,
            hint: Some(hint.into()),
        }
    }

    /// Create a missing tool error
    pub fn missing_tool(tool: impl Into<String>) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            hint: hints::arduino_cli().to_string(),
        }
    }

    /// Create a setup failure carrying the tool's captured error stream
    pub fn setup_failure(
        step: impl Into<String>,
        message: impl Into<String>,
        output: Option<String>,
    ) -> Self {
        Self::Setup {
            step: step.into(),
            message: message.into(),
            output,
            hint: None,
        }
    }

    /// Create a setup failure with a hint
    pub fn setup_failure_with_hint(
        step: impl Into<String>,
        message: impl Into<String>,
        output: Option<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::Setup {
            step: step.into(),
            message: message.into(),
            output,
            hint: Some(hint.into()),
        }
    }

    /// Create a dependency installation error
    pub fn dependency_error(dependency: impl Into<String>, output: Option<String>) -> Self {
        Self::Dependency {
            dependency: dependency.into(),
            output,
            hint: Some(hints::library_dependency().to_string()),
        }
    }

    /// Create a library staging error
    pub fn staging_error(destination: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::Staging {
            destination: destination.into(),
            source,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            SketchCiError::UnknownPlatform { .. } => EXIT_USAGE,
            _ => EXIT_SETUP_FAILED,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        match self {
            SketchCiError::Setup { output, .. } | SketchCiError::Dependency { output, .. } => {
                if let Some(out) = output.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
                    eprintln!("\n{}", style("OUTPUT:").cyan().bold());
                    for line in out.lines() {
                        eprintln!("  {}", style(line).red());
                    }
                }
            }
            SketchCiError::Config {
                source: Some(source),
                ..
            } => {
                eprintln!("  {}", source);
            }
            SketchCiError::Staging { source, .. } => {
                eprintln!("  {:#}", source);
            }
            _ => {}
        }

        match self {
            SketchCiError::Config { hint, .. }
            | SketchCiError::Setup { hint, .. }
            | SketchCiError::Dependency { hint, .. } => {
                if let Some(h) = hint {
                    eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
                }
            }
            SketchCiError::UnknownPlatform { hint, .. } | SketchCiError::MissingTool { hint, .. } => {
                eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
            }
            SketchCiError::Staging { .. } => {}
        }

        eprintln!();
    }
}

/// Common hints for typical errors
pub mod hints {
    /// Get hint for a missing arduino-cli
    pub fn arduino_cli() -> &'static str {
        "Install arduino-cli from https://arduino.github.io/arduino-cli/ or:\n\
         • macOS: brew install arduino-cli\n\
         • Linux: curl -fsSL https://raw.githubusercontent.com/arduino/arduino-cli/master/install.sh | sh\n\
         \n\
         The install script places the binary in ./bin, which is searched automatically.\n\
         Use --arduino-cli or ARDUINO_CLI to point at a different executable."
    }

    /// Get hint for a failed core index update
    pub fn index_update() -> &'static str {
        "Check network access and that every --additional-url points at a valid package index"
    }

    /// Get hint for a failed core install
    pub fn core_install() -> &'static str {
        "Make sure the core's vendor publishes it in one of the additional package indexes"
    }

    /// Get hint for a failed library install
    pub fn library_dependency() -> &'static str {
        "Check the 'depends=' line in library.properties against the Arduino Library Manager index"
    }

    /// Get hint for a library name that cannot be used as a folder
    pub fn library_name() -> &'static str {
        "Library names start with a letter or digit and may only contain letters, digits,\n\
         spaces, '_', '.' and '-'. Fix the 'name=' line in library.properties"
    }

    /// Get hint for an invalid platforms file
    pub fn platforms_file() -> &'static str {
        "Boards are written as key = \"vendor:arch:board[:options]\" and groups as key = [\"a\", \"b\"]\n\
         under a [platforms] table"
    }
}
