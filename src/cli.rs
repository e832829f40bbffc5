//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::Parser;

use crate::commands::{list, run::RunCommand};

/// sketchci - compile Arduino library examples against board platforms
///
/// Installs each platform's core and the library's dependencies through
/// arduino-cli, then compiles every example sketch and reports the results.
#[derive(Parser, Debug)]
#[command(name = "sketchci")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Echo every arduino-cli command
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// List known platforms and groups, then exit
    #[arg(long)]
    pub list: bool,

    #[command(flatten)]
    pub run: RunCommand,
}

impl Cli {
    /// Execute the CLI command, returning the process exit code
    pub fn execute(self) -> Result<u8> {
        // Set up terminal colors
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        if self.list {
            return list::execute(self.run.platforms_file.as_deref());
        }

        self.run.execute(self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serial_test::serial;

    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    #[serial]
    fn test_parse_platforms_and_options() {
        std::env::remove_var("GITHUB_WORKSPACE");
        std::env::remove_var("ARDUINO_CLI");
        let cli = Cli::try_parse_from([
            "sketchci",
            "uno",
            "rak_platforms",
            "--additional-url",
            "https://a/index.json",
            "--additional-url",
            "https://b/index.json",
        ])
        .unwrap();

        assert_eq!(cli.run.platforms, vec!["uno", "rak_platforms"]);
        assert_eq!(cli.run.additional_urls.len(), 2);
        assert_eq!(cli.run.arduino_cli, "arduino-cli");
        assert_eq!(cli.run.workspace, None);
    }

    #[test]
    #[serial]
    fn test_workspace_from_environment() {
        std::env::set_var("GITHUB_WORKSPACE", "/github/workspace");
        let cli = Cli::try_parse_from(["sketchci", "uno"]);
        std::env::remove_var("GITHUB_WORKSPACE");

        assert_eq!(
            cli.unwrap().run.workspace,
            Some(PathBuf::from("/github/workspace"))
        );
    }

    #[test]
    #[serial]
    fn test_platform_required_unless_listing() {
        std::env::remove_var("GITHUB_WORKSPACE");
        assert!(Cli::try_parse_from(["sketchci"]).is_err());
        assert!(Cli::try_parse_from(["sketchci", "--list"]).unwrap().list);
    }
}
