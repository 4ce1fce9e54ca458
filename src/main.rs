//! savecraft CLI entry point
//!
//! This is a minimal entrypoint that:
//! 1. Delegates parsing and dispatch to `cli::run`
//! 2. Prints failures as a JSON error on stdout and a line on stderr
//! 3. Exits non-zero on failure (2 when the save may need manual restore)

use savecraft::cli;

fn main() {
    if let Err(e) = cli::run() {
        let _ = cli::write_error(e.code_str(), e.message());
        eprintln!("{}", e);
        std::process::exit(if e.is_fatal() { 2 } else { 1 });
    }
}
