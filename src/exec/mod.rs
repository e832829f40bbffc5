//! External process execution

pub mod arduino_cli;
pub mod subprocess;

pub use arduino_cli::{ArduinoCli, ProcessRunner, ToolRunner};
