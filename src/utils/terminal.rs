//! Terminal output utilities

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Mark printed after a passing step
pub const CHECK: &str = "\u{2713}";

/// Mark printed after a failing step
pub const CROSS: &str = "\u{2717}";

/// Print an error message to stderr
pub fn print_error(message: &str) {
    eprintln!("{}: {}", style("error").red().bold(), message);
}

/// Print a warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("warning").yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{}: {}", style("info").blue().bold(), message);
}

/// Print a banner framing a phase of the run
pub fn print_section(title: &str) {
    let rule = "#".repeat(40);
    println!();
    println!("{}", style(&rule).blue().bold());
    println!("{}", style(title).bold());
    println!("{}", style(&rule).blue().bold());
}

/// Print a wide separator with a highlighted title, used per platform
pub fn print_platform_header(title: &str) {
    println!("{}", "#".repeat(80));
    println!("{}", style(title).blue().bold());
    println!("{}", "#".repeat(80));
}

/// Echo an external command line
pub fn print_command(program: &str, args: &[String]) {
    let rendered: Vec<String> = args
        .iter()
        .map(|a| {
            if a.contains(char::is_whitespace) {
                format!("\"{}\"", a)
            } else {
                a.clone()
            }
        })
        .collect();
    eprintln!("{} {} {}", style("$").dim(), program, rendered.join(" "));
}

/// Print captured tool output in the failure colour
pub fn print_failure_output(output: &str) {
    for line in output.lines() {
        println!("{}", style(line).red());
    }
}

/// Mark for a step result
pub fn status_mark(passed: bool) -> String {
    if passed {
        style(CHECK).green().bold().to_string()
    } else {
        style(CROSS).red().bold().to_string()
    }
}

/// Create a spinner progress bar
///
/// Draws to stderr and stays hidden when stderr is not a terminal.
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
