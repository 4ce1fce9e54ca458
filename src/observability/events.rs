//! Observable events
//!
//! Events are explicit and typed. They cover:
//! - Configuration
//! - Layout resolution
//! - Document open / save / rollback
//! - Projection diagnostics

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Resolution
    /// Save layout determined for a world
    LayoutResolved,
    /// World uses a layout this editor refuses to guess at
    LayoutUnsupported,
    /// Cached resolution discarded because the root document changed
    ResolutionStale,

    // Documents
    /// Player document decoded
    DocumentOpened,

    // Save (begin and outcome are logged by the SAVE scope)
    /// Backup copy written and verified
    BackupCreated,
    /// Save failed and the original bytes were restored
    SaveRolledBack,
    /// Save failed and the restore failed too (FATAL)
    RollbackFailed,

    // Projections
    /// A malformed entry was dropped while reading
    EntrySkipped,
    /// Duplicate slot found in an inventory
    DuplicateSlot,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::LayoutResolved => "LAYOUT_RESOLVED",
            Event::LayoutUnsupported => "LAYOUT_UNSUPPORTED",
            Event::ResolutionStale => "RESOLUTION_STALE",

            Event::DocumentOpened => "DOCUMENT_OPENED",

            Event::BackupCreated => "BACKUP_CREATED",
            Event::SaveRolledBack => "SAVE_ROLLED_BACK",
            Event::RollbackFailed => "ROLLBACK_FAILED",

            Event::EntrySkipped => "ENTRY_SKIPPED",
            Event::DuplicateSlot => "DUPLICATE_SLOT",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::RollbackFailed)
    }

    /// Returns true for events that report tolerated damage
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::LayoutUnsupported
                | Event::SaveRolledBack
                | Event::EntrySkipped
                | Event::DuplicateSlot
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
