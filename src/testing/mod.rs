//! Example discovery and compile results
//!
//! This module provides:
//! - Discovery of compilable example sketches
//! - Aggregation of per-sketch compile results
//! - CI service integration

pub mod ci;
pub mod discovery;
pub mod results;

pub use ci::CiReporter;
pub use discovery::{discover_sketches, Sketch};
pub use results::{CompileOutcome, RunSummary};
