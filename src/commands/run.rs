//! Run command implementation
//!
//! Installs the requested board cores and library dependencies, then
//! compiles every example sketch for every resolved platform.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::config::{is_valid_library_name, load_platform_table, LibraryProperties};
use crate::error::{hints, SketchCiError, EXIT_COMPILE_FAILED, EXIT_SUCCESS};
use crate::exec::subprocess::extend_search_path;
use crate::exec::{ArduinoCli, ProcessRunner, ToolRunner};
use crate::platforms::{ResolvedPlatform, BSP_URLS};
use crate::testing::{discover_sketches, CiReporter, CompileOutcome, RunSummary, Sketch};
use crate::utils::{paths, terminal};

/// Compile the examples against one or more platforms
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Platforms or platform groups to test (see --list)
    #[arg(value_name = "PLATFORM", required_unless_present = "list")]
    pub platforms: Vec<String>,

    /// Library workspace root
    #[arg(short, long, env = "GITHUB_WORKSPACE", value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Board manager executable
    #[arg(long, env = "ARDUINO_CLI", default_value = "arduino-cli", value_name = "PROGRAM")]
    pub arduino_cli: String,

    /// TOML file with extra platforms, groups and package index URLs
    #[arg(long, value_name = "FILE")]
    pub platforms_file: Option<PathBuf>,

    /// Extra board package index URL (repeatable)
    #[arg(long = "additional-url", value_name = "URL")]
    pub additional_urls: Vec<String>,

    /// Write the results as JSON
    #[arg(long, value_name = "FILE")]
    pub report_json: Option<PathBuf>,

    /// Write the results as JUnit XML
    #[arg(long, value_name = "FILE")]
    pub junit: Option<PathBuf>,
}

impl RunCommand {
    /// Execute the run, returning the process exit code
    pub fn execute(self, verbose: bool) -> Result<u8> {
        let (table, file_urls) = load_platform_table(self.platforms_file.as_deref())?;
        let platforms = table.resolve(&self.platforms)?;

        let workspace = match self.workspace {
            Some(ref dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        terminal::print_info(&format!("Build dir: {}", workspace.display()));
        terminal::print_info(&format!(
            "Examples folder: {}",
            paths::get_examples_dir(&workspace).display()
        ));

        let search_path = extend_search_path(&[paths::get_bin_dir(&workspace)])?;
        let runner = ProcessRunner::locate(&self.arduino_cli, search_path)?;
        if verbose {
            terminal::print_info(&format!("Using {}", runner.program().display()));
        }

        let mut urls: Vec<String> = BSP_URLS.iter().map(|u| u.to_string()).collect();
        urls.extend(file_urls);
        urls.extend(self.additional_urls.iter().cloned());
        let cli = ArduinoCli::new(runner, urls, verbose);

        let summary = Pipeline::new(&cli, &workspace, verbose).run(&platforms)?;
        summary.print_summary();

        if let Some(ref path) = self.report_json {
            summary.write_json(path)?;
            terminal::print_info(&format!("JSON report written to {}", path.display()));
        }
        if let Some(ref path) = self.junit {
            summary.write_junit(path)?;
            terminal::print_info(&format!("JUnit report written to {}", path.display()));
        }
        if let Err(e) = CiReporter::auto_detect().report(&summary) {
            terminal::print_warning(&format!("{:#}", e));
        }

        Ok(exit_code_for(&summary))
    }
}

/// Exit code for a finished run
pub fn exit_code_for(summary: &RunSummary) -> u8 {
    if summary.all_passed() {
        EXIT_SUCCESS
    } else {
        EXIT_COMPILE_FAILED
    }
}

/// The fixed sequence of a run: setup, staging, then the compile loop
pub struct Pipeline<'a, R> {
    cli: &'a ArduinoCli<R>,
    workspace: &'a Path,
    verbose: bool,
}

impl<'a, R: ToolRunner> Pipeline<'a, R> {
    pub fn new(cli: &'a ArduinoCli<R>, workspace: &'a Path, verbose: bool) -> Self {
        Self {
            cli,
            workspace,
            verbose,
        }
    }

    /// Run every step; setup failures abort, compile failures are recorded
    pub fn run(&self, platforms: &[ResolvedPlatform]) -> Result<RunSummary, SketchCiError> {
        let library = LibraryProperties::load(self.workspace).map_err(|e| {
            SketchCiError::config_error_with_hint(
                "Could not read library.properties",
                Some(e),
                "Fix or remove the library.properties file",
            )
        })?;

        self.setup(library.as_ref())?;

        let examples_dir = paths::get_examples_dir(self.workspace);
        if examples_dir.is_dir() {
            self.stage_library(library.as_ref(), &examples_dir)?;
        } else {
            terminal::print_warning(&format!(
                "Examples folder {} does not exist",
                examples_dir.display()
            ));
        }

        let sketches = discover_sketches(&examples_dir).map_err(|e| {
            SketchCiError::setup_failure("Example discovery", format!("{:#}", e), None)
        })?;

        let mut summary = RunSummary::new();
        for platform in platforms {
            terminal::print_platform_header(&format!("SWITCHING TO {}", platform.fqbn));
            self.install_core(&platform.fqbn.core())?;

            for sketch in &sketches {
                summary.record(self.compile(platform, sketch));
            }
        }

        Ok(summary)
    }

    fn setup(&self, library: Option<&LibraryProperties>) -> Result<(), SketchCiError> {
        terminal::print_section("INSTALLING ARDUINO BOARDS");
        self.step("Updating core index", || self.cli.update_index())?;

        terminal::print_section("INSTALLING DEPENDENCIES");
        match library {
            Some(props) => {
                for dep in &props.depends {
                    self.step(&format!("Installing {}", dep), || self.cli.install_library(dep))?;
                }
                terminal::print_info("Libraries installed");
            }
            None => terminal::print_warning("No library dep or properties found!"),
        }

        Ok(())
    }

    fn install_core(&self, core: &str) -> Result<(), SketchCiError> {
        self.step(&format!("Installing {}", core), || self.cli.install_core(core))
    }

    /// Run a setup step behind a spinner and print its mark
    fn step(
        &self,
        message: &str,
        f: impl FnOnce() -> Result<(), SketchCiError>,
    ) -> Result<(), SketchCiError> {
        let spinner = (!self.verbose).then(|| terminal::create_spinner(message));
        let result = f();
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        println!("{} {}", message, terminal::status_mark(result.is_ok()));
        result
    }

    /// Copy the library sources into `examples/<name>` so sketches can include it
    fn stage_library(
        &self,
        library: Option<&LibraryProperties>,
        examples_dir: &Path,
    ) -> Result<(), SketchCiError> {
        let Some(name) = library.and_then(|l| l.name.as_deref()) else {
            terminal::print_warning("Library name unknown, sources are not copied next to the examples");
            return Ok(());
        };

        if !is_valid_library_name(name) {
            return Err(SketchCiError::config_error_with_hint(
                format!("Library name '{}' cannot be used as an examples folder", name),
                None,
                hints::library_name(),
            ));
        }

        let src = paths::get_library_src_dir(self.workspace);
        let dest = examples_dir.join(name);
        let copied = paths::copy_dir_contents(&src, &dest)
            .map_err(|e| SketchCiError::staging_error(&dest, e))?;

        match library.and_then(|l| l.version.as_deref()) {
            Some(version) => terminal::print_info(&format!("Library name: {} {}", name, version)),
            None => terminal::print_info(&format!("Library name: {}", name)),
        }
        if self.verbose {
            terminal::print_info(&format!("Copied {} file(s) to {}", copied, dest.display()));
        }
        Ok(())
    }

    fn compile(&self, platform: &ResolvedPlatform, sketch: &Sketch) -> CompileOutcome {
        print!("\t{} ", sketch.path.display());
        let _ = std::io::stdout().flush();

        match self.cli.compile(&platform.fqbn, &sketch.path) {
            Ok(result) if result.success => {
                println!("{}", terminal::status_mark(true));
                CompileOutcome::passed(platform, sketch, result.duration)
            }
            Ok(result) => {
                println!("{}", terminal::status_mark(false));
                let output = result.combined_output();
                terminal::print_failure_output(&output);
                CompileOutcome::failed(platform, sketch, result.duration, output)
            }
            Err(e) => {
                println!("{}", terminal::status_mark(false));
                let output = format!("{:#}", e);
                terminal::print_failure_output(&output);
                CompileOutcome::failed(platform, sketch, Duration::ZERO, output)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::error::EXIT_SETUP_FAILED;
    use crate::exec::arduino_cli::testing::FakeRunner;
    use crate::platforms::PlatformTable;

    fn workspace(sketches: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in sketches {
            let dir = temp.path().join("examples").join(name);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join(format!("{}.ino", name)), "void setup() {}\n").unwrap();
        }
        temp
    }

    fn platforms(tokens: &[&str]) -> Vec<ResolvedPlatform> {
        PlatformTable::builtin().resolve(tokens).unwrap()
    }

    fn cli(runner: FakeRunner) -> ArduinoCli<FakeRunner> {
        ArduinoCli::new(runner, vec!["https://example.com/index.json".into()], true)
    }

    #[test]
    fn test_all_sketches_compile_for_every_platform() {
        let ws = workspace(&["Basic", "Sleep"]);
        let cli = cli(FakeRunner::succeeding());
        let summary = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno", "esp32"]))
            .unwrap();

        assert_eq!(summary.passed, 4);
        assert_eq!(exit_code_for(&summary), EXIT_SUCCESS);

        let compiles = cli.runner().calls_to("compile");
        let order: Vec<(&str, bool)> = compiles
            .iter()
            .map(|c| (c[2].as_str(), c[3].ends_with("Basic.ino")))
            .collect();
        assert_eq!(
            order,
            vec![
                ("arduino:avr:uno", true),
                ("arduino:avr:uno", false),
                ("esp32:esp32:featheresp32:FlashFreq=80", true),
                ("esp32:esp32:featheresp32:FlashFreq=80", false),
            ]
        );
    }

    #[test]
    fn test_cores_installed_per_platform() {
        let ws = workspace(&[]);
        let cli = cli(FakeRunner::succeeding());
        Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["rak_platforms"]))
            .unwrap();

        let cores: Vec<String> = cli
            .runner()
            .calls_to("core")
            .into_iter()
            .filter(|c| c[1] == "install")
            .map(|c| c[2].clone())
            .collect();
        assert_eq!(
            cores,
            vec!["rakwireless:nrf52", "rakwireless:esp32", "rakwireless:mbed_rp2040"]
        );
    }

    #[test]
    fn test_compile_failure_continues() {
        let ws = workspace(&["Alpha", "Broken", "Gamma"]);
        let cli = cli(FakeRunner::failing_when(|args| {
            args[0] == "compile" && args[3].contains("Broken")
        }));
        let summary = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap();

        assert_eq!(cli.runner().calls_to("compile").len(), 3);
        assert_eq!(summary.passed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.first_failure.as_deref(), Some("Broken@arduino:avr:uno"));
        assert_eq!(summary.outcomes[1].output.as_deref(), Some("simulated failure"));
        assert_eq!(exit_code_for(&summary), EXIT_COMPILE_FAILED);
    }

    #[test]
    fn test_index_failure_stops_before_examples() {
        let ws = workspace(&["Basic"]);
        let cli = cli(FakeRunner::failing_when(|args| args[1] == "update-index"));
        let err = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap_err();

        assert!(matches!(err, SketchCiError::Setup { .. }));
        assert_eq!(err.exit_code(), EXIT_SETUP_FAILED);
        assert!(cli.runner().calls_to("compile").is_empty());
        assert_eq!(cli.runner().calls.borrow().len(), 1);
    }

    #[test]
    fn test_core_install_failure_stops_before_examples() {
        let ws = workspace(&["Basic"]);
        let cli = cli(FakeRunner::failing_when(|args| {
            args[0] == "core" && args[1] == "install"
        }));
        let err = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap_err();

        assert!(matches!(err, SketchCiError::Setup { .. }));
        assert!(cli.runner().calls_to("compile").is_empty());
    }

    #[test]
    fn test_dependency_failure_aborts() {
        let ws = workspace(&["Basic"]);
        std::fs::write(
            ws.path().join("library.properties"),
            "depends=Good Lib, Bad Lib, Never Reached\n",
        )
        .unwrap();
        let cli = cli(FakeRunner::failing_when(|args| {
            args[0] == "lib" && args[2] == "Bad Lib"
        }));
        let err = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap_err();

        assert!(matches!(err, SketchCiError::Dependency { ref dependency, .. } if dependency == "Bad Lib"));
        assert_eq!(cli.runner().calls_to("lib").len(), 2);
        assert!(cli.runner().calls_to("compile").is_empty());
    }

    #[test]
    fn test_no_examples_is_success() {
        let ws = workspace(&[]);
        let cli = cli(FakeRunner::succeeding());
        let summary = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap();

        assert_eq!(summary.total(), 0);
        assert_eq!(exit_code_for(&summary), EXIT_SUCCESS);
    }

    #[test]
    fn test_library_sources_staged_next_to_examples() {
        let ws = workspace(&["Basic"]);
        std::fs::write(ws.path().join("library.properties"), "name=MyLib\n").unwrap();
        std::fs::create_dir_all(ws.path().join("src")).unwrap();
        std::fs::write(ws.path().join("src/MyLib.h"), "#pragma once\n").unwrap();

        let cli = cli(FakeRunner::succeeding());
        let summary = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap();

        assert!(ws.path().join("examples/MyLib/MyLib.h").is_file());
        assert_eq!(summary.total(), 1);
    }

    #[test]
    fn test_missing_library_sources_is_fatal() {
        let ws = workspace(&["Basic"]);
        std::fs::write(ws.path().join("library.properties"), "name=MyLib\n").unwrap();

        let cli = cli(FakeRunner::succeeding());
        let err = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap_err();

        assert!(matches!(err, SketchCiError::Staging { .. }));
        assert!(cli.runner().calls_to("compile").is_empty());
    }

    #[test]
    fn test_library_name_outside_examples_refused() {
        let root = TempDir::new().unwrap();
        let ws_path = root.path().join("workspace");
        let dir = ws_path.join("examples/Basic");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("Basic.ino"), "void setup() {}\n").unwrap();
        std::fs::write(ws_path.join("library.properties"), "name=../../escaped\n").unwrap();
        std::fs::create_dir_all(ws_path.join("src")).unwrap();
        std::fs::write(ws_path.join("src/Lib.h"), "#pragma once\n").unwrap();

        let cli = cli(FakeRunner::succeeding());
        let err = Pipeline::new(&cli, &ws_path, true)
            .run(&platforms(&["uno"]))
            .unwrap_err();

        assert!(matches!(err, SketchCiError::Config { .. }));
        assert_eq!(err.exit_code(), EXIT_SETUP_FAILED);
        assert!(!root.path().join("escaped").exists());
        assert!(!ws_path.join("escaped").exists());
        assert!(cli.runner().calls_to("compile").is_empty());
    }

    #[test]
    fn test_missing_examples_folder_skips_staging() {
        let ws = workspace(&[]);
        std::fs::write(ws.path().join("library.properties"), "name=MyLib\n").unwrap();
        std::fs::create_dir_all(ws.path().join("src")).unwrap();
        std::fs::write(ws.path().join("src/MyLib.h"), "#pragma once\n").unwrap();

        let cli = cli(FakeRunner::succeeding());
        let summary = Pipeline::new(&cli, ws.path(), true)
            .run(&platforms(&["uno"]))
            .unwrap();

        assert_eq!(summary.total(), 0);
        assert!(!ws.path().join("examples").exists());
    }
}
