//! Board manager invocation
//!
//! [`ArduinoCli`] knows the arduino-cli command lines for index updates,
//! core and library installs and sketch compilation. Process spawning sits
//! behind [`ToolRunner`] so the run can be driven by a simulated tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::error::{hints, SketchCiError};
use crate::exec::subprocess::{find_program, run_command, CommandResult};
use crate::platforms::Fqbn;
use crate::utils::terminal;

/// Cores that need another core installed first
const CORE_PREREQUISITES: &[(&str, &str)] = &[("adafruit:avr", "arduino:avr")];

/// Something that can run the board manager with an argument list
pub trait ToolRunner {
    /// Run the tool and capture its result
    fn run(&self, args: &[String]) -> Result<CommandResult>;

    /// Name shown when echoing commands
    fn program_name(&self) -> String;
}

/// Runs the real executable as a child process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: PathBuf,
    search_path: OsString,
}

impl ProcessRunner {
    /// Resolve `program` against `search_path`
    pub fn locate(program: &str, search_path: OsString) -> Result<Self, SketchCiError> {
        match find_program(program, &search_path) {
            Some(program) => Ok(Self {
                program,
                search_path,
            }),
            None => Err(SketchCiError::missing_tool(program)),
        }
    }

    /// Resolved executable path
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, args: &[String]) -> Result<CommandResult> {
        run_command(&self.program, args, Some(&self.search_path))
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// arduino-cli front end
pub struct ArduinoCli<R> {
    runner: R,
    additional_urls: Vec<String>,
    verbose: bool,
}

impl<R: ToolRunner> ArduinoCli<R> {
    /// Create a front end passing `additional_urls` to every core command
    pub fn new(runner: R, additional_urls: Vec<String>, verbose: bool) -> Self {
        Self {
            runner,
            additional_urls,
            verbose,
        }
    }

    /// The underlying runner
    #[cfg(test)]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn with_urls(&self, mut args: Vec<String>) -> Vec<String> {
        if !self.additional_urls.is_empty() {
            args.push("--additional-urls".to_string());
            args.push(self.additional_urls.join(","));
        }
        args
    }

    fn invoke(&self, args: &[String]) -> Result<CommandResult> {
        if self.verbose {
            terminal::print_command(&self.runner.program_name(), args);
        }
        self.runner.run(args)
    }

    /// Run a setup command, turning any failure into a fatal error
    fn setup_step(&self, step: &str, args: &[String], hint: &str) -> Result<(), SketchCiError> {
        match self.invoke(args) {
            Ok(result) if result.success => Ok(()),
            Ok(result) => Err(SketchCiError::setup_failure_with_hint(
                step,
                format!("exit code {}", result.exit_code),
                Some(result.combined_output()),
                hint,
            )),
            Err(e) => Err(SketchCiError::setup_failure_with_hint(
                step,
                format!("{:#}", e),
                None,
                hint,
            )),
        }
    }

    /// `core update-index`
    pub fn update_index(&self) -> Result<(), SketchCiError> {
        let args = self.with_urls(vec!["core".into(), "update-index".into()]);
        self.setup_step("Core index update", &args, hints::index_update())
    }

    /// `core install`, preceded by any prerequisite core
    pub fn install_core(&self, core: &str) -> Result<(), SketchCiError> {
        for (dependent, prerequisite) in CORE_PREREQUISITES {
            if core == *dependent {
                self.install_core(prerequisite)?;
            }
        }

        let args = self.with_urls(vec!["core".into(), "install".into(), core.to_string()]);
        self.setup_step(&format!("Install of core {}", core), &args, hints::core_install())
    }

    /// `lib install`
    pub fn install_library(&self, name: &str) -> Result<(), SketchCiError> {
        let args = vec!["lib".to_string(), "install".to_string(), name.to_string()];
        match self.invoke(&args) {
            Ok(result) if result.success => Ok(()),
            Ok(result) => Err(SketchCiError::dependency_error(name, Some(result.combined_output()))),
            Err(e) => Err(SketchCiError::dependency_error(name, Some(format!("{:#}", e)))),
        }
    }

    /// `compile --fqbn`; a failed compile is an `Ok` result with `success == false`
    pub fn compile(&self, fqbn: &Fqbn, sketch: &Path) -> Result<CommandResult> {
        let args = vec![
            "compile".to_string(),
            "--fqbn".to_string(),
            fqbn.to_string(),
            sketch.display().to_string(),
        ];
        self.invoke(&args)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeRunner;
    use super::*;

    fn cli(runner: FakeRunner) -> ArduinoCli<FakeRunner> {
        ArduinoCli::new(runner, vec!["https://a/index.json".into(), "https://b/index.json".into()], false)
    }

    #[test]
    fn test_update_index_passes_urls() {
        let cli = cli(FakeRunner::succeeding());
        cli.update_index().unwrap();
        let calls = cli.runner().calls.borrow();
        assert_eq!(
            calls[0],
            vec![
                "core",
                "update-index",
                "--additional-urls",
                "https://a/index.json,https://b/index.json"
            ]
        );
    }

    #[test]
    fn test_install_adafruit_avr_installs_arduino_avr_first() {
        let cli = cli(FakeRunner::succeeding());
        cli.install_core("adafruit:avr").unwrap();
        let cores: Vec<String> = cli
            .runner()
            .calls_to("core")
            .into_iter()
            .map(|c| c[2].clone())
            .collect();
        assert_eq!(cores, vec!["arduino:avr", "adafruit:avr"]);
    }

    #[test]
    fn test_failed_core_install_is_setup_error() {
        let cli = cli(FakeRunner::failing_when(|args| args[1] == "install"));
        let err = cli.install_core("esp32:esp32").unwrap_err();
        match err {
            SketchCiError::Setup { step, output, .. } => {
                assert!(step.contains("esp32:esp32"));
                assert_eq!(output.as_deref(), Some("simulated failure"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_library_install_has_no_urls() {
        let cli = cli(FakeRunner::succeeding());
        cli.install_library("Adafruit NeoPixel").unwrap();
        assert_eq!(
            cli.runner().calls.borrow()[0],
            vec!["lib", "install", "Adafruit NeoPixel"]
        );
    }

    #[test]
    fn test_failed_library_install_is_dependency_error() {
        let cli = cli(FakeRunner::failing_when(|args| args[0] == "lib"));
        let err = cli.install_library("Servo").unwrap_err();
        assert!(matches!(err, SketchCiError::Dependency { ref dependency, .. } if dependency == "Servo"));
    }

    #[test]
    fn test_compile_arguments() {
        let cli = cli(FakeRunner::succeeding());
        let fqbn: Fqbn = "arduino:avr:uno".parse().unwrap();
        let result = cli.compile(&fqbn, Path::new("examples/Blink/Blink.ino")).unwrap();
        assert!(result.success);
        assert_eq!(
            cli.runner().calls.borrow()[0],
            vec!["compile", "--fqbn", "arduino:avr:uno", "examples/Blink/Blink.ino"]
        );
    }

    #[test]
    fn test_locate_missing_program() {
        let err = ProcessRunner::locate("sketchci-no-such-tool", OsString::from("")).unwrap_err();
        assert!(matches!(err, SketchCiError::MissingTool { .. }));
    }
}
