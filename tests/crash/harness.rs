//! Crash test harness for subprocess management
//!
//! - Starts the savecraft binary
//! - Injects crashes via SAVECRAFT_CRASH_POINT
//! - Captures output for post-crash checks

use std::path::Path;
use std::process::{Command, ExitStatus};

/// Result of a subprocess run
#[derive(Debug)]
pub struct CrashTestResult {
    /// Whether the process ended unsuccessfully
    pub crashed: bool,
    pub exit_status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
}

fn binary() -> &'static str {
    env!("CARGO_BIN_EXE_savecraft")
}

/// Runs the binary in `cwd` with the given arguments
pub fn run_savecraft(cwd: &Path, args: &[&str]) -> CrashTestResult {
    execute(Command::new(binary()).current_dir(cwd).args(args))
}

/// Runs the binary with a crash point armed
pub fn run_with_crash_point(crash_point: &str, cwd: &Path, args: &[&str]) -> CrashTestResult {
    execute(
        Command::new(binary())
            .current_dir(cwd)
            .args(args)
            .env("SAVECRAFT_CRASH_POINT", crash_point),
    )
}

fn execute(command: &mut Command) -> CrashTestResult {
    match command.output() {
        Ok(output) => CrashTestResult {
            crashed: !output.status.success(),
            exit_status: Some(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        },
        Err(e) => CrashTestResult {
            crashed: true,
            exit_status: None,
            stdout: String::new(),
            stderr: format!("Failed to execute: {}", e),
        },
    }
}
