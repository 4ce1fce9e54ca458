//! Crash and fault injection for testing save durability
//!
//! Two mechanisms share one set of named points:
//!
//! - `maybe_crash(point)` terminates the process via `std::process::abort()`
//!   when `SAVECRAFT_CRASH_POINT` names the point. No cleanup, no unwinding.
//!   Used by subprocess tests to prove a save interrupted at any point leaves
//!   either the old file or the new one.
//! - `maybe_fail(point)` returns an injected `io::Error` when the point is
//!   armed for the current thread (`arm_fault`) or named by
//!   `SAVECRAFT_FAULT_POINT`. Used to drive the rollback path in-process.
//!
//! ```bash
//! SAVECRAFT_CRASH_POINT=save_before_replace savecraft set-scalar XpLevel 30 --world ./w
//! ```

use std::cell::RefCell;
use std::io;
use std::sync::OnceLock;

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();
static FAULT_POINT: OnceLock<Option<String>> = OnceLock::new();

thread_local! {
    static ARMED: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var("SAVECRAFT_CRASH_POINT").ok())
        .as_deref()
}

fn get_fault_point() -> Option<&'static str> {
    FAULT_POINT
        .get_or_init(|| std::env::var("SAVECRAFT_FAULT_POINT").ok())
        .as_deref()
}

/// Returns true if `SAVECRAFT_CRASH_POINT` equals the given name
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// Returns true if the named fault point is armed on this thread or via env
pub fn fault_point_enabled(name: &str) -> bool {
    let armed = ARMED.with(|armed| armed.borrow().iter().any(|p| *p == name));
    armed || get_fault_point().map(|p| p == name).unwrap_or(false)
}

/// Fail with an injected I/O error if the named fault point is enabled
#[inline]
pub fn maybe_fail(name: &str) -> io::Result<()> {
    if fault_point_enabled(name) {
        return Err(io::Error::other(format!("injected fault at {}", name)));
    }
    Ok(())
}

/// Run every injection mechanism for a point
pub fn checkpoint(name: &str) -> io::Result<()> {
    maybe_crash(name);
    maybe_fail(name)
}

/// Arms a fault point on the current thread until the guard is dropped
#[must_use = "the fault is disarmed when the guard is dropped"]
pub fn arm_fault(name: &'static str) -> FaultGuard {
    ARMED.with(|armed| armed.borrow_mut().push(name));
    FaultGuard { name }
}

/// Disarms its fault point on drop
pub struct FaultGuard {
    name: &'static str,
}

impl Drop for FaultGuard {
    fn drop(&mut self) {
        ARMED.with(|armed| {
            let mut armed = armed.borrow_mut();
            if let Some(pos) = armed.iter().position(|p| *p == self.name) {
                armed.remove(pos);
            }
        });
    }
}

/// All defined crash/fault point names, in save order
pub mod points {
    /// Before anything touches the disk
    pub const SAVE_BEGIN: &str = "save_begin";
    /// Backup written and verified, target untouched
    pub const SAVE_AFTER_BACKUP: &str = "save_after_backup";
    /// In-place strategy only: half of the new bytes written to the target
    pub const SAVE_MID_WRITE: &str = "save_mid_write";
    /// New bytes staged, target not yet replaced
    pub const SAVE_BEFORE_REPLACE: &str = "save_before_replace";
    /// Target replaced, before post-write verification
    pub const SAVE_AFTER_REPLACE: &str = "save_after_replace";

    /// Get all point names
    pub fn all() -> &'static [&'static str] {
        &[
            SAVE_BEGIN,
            SAVE_AFTER_BACKUP,
            SAVE_MID_WRITE,
            SAVE_BEFORE_REPLACE,
            SAVE_AFTER_REPLACE,
        ]
    }
}
