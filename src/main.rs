//! sketchci - Arduino library CI helper
//!
//! Drives arduino-cli to install board cores and library dependencies, then
//! compiles every example sketch against each requested platform.
//!
//! ## Flow
//!
//! ```text
//! resolve platforms → update index → install deps → stage library
//!     → for each platform: install core → compile each example
//! ```

mod cli;
mod commands;
mod config;
mod error;
mod exec;
mod platforms;
mod testing;
mod utils;

use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use error::{SketchCiError, EXIT_SETUP_FAILED};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.execute() {
        Ok(code) => ExitCode::from(code),
        Err(err) => match err.downcast_ref::<SketchCiError>() {
            Some(e) => {
                e.display_with_hints();
                ExitCode::from(e.exit_code())
            }
            None => {
                utils::terminal::print_error(&format!("{:#}", err));
                ExitCode::from(EXIT_SETUP_FAILED)
            }
        },
    }
}
