//! Transactional persistence of player documents
//!
//! A `PlayerDocument` is a decoded file plus a working copy of the player
//! subtree. Projections edit the working copy; nothing reaches disk until
//! `save`.
//!
//! # Save ordering
//!
//! 1. Splice the working copy back into the tree (`Data.Player` or the root)
//! 2. Encode the whole file in memory
//! 3. Copy the current on-disk bytes to `<name>.backup` and verify the copy
//! 4. Replace the target (`AtomicRename` or `InPlace`)
//! 5. Re-read and decode the target
//!
//! Any failure after step 3 restores the target from the backup and returns
//! the original error. If the restore fails too, the error is
//! `RollbackFailed` and the backup stays on disk for manual recovery.
//! Failures before step 3 leave the disk untouched.

mod backup;
mod checksum;
mod replace;

pub use backup::{backup_path, create_backup, restore_backup, Backup, BACKUP_SUFFIX};
pub use checksum::{compute_checksum, verify_checksum};
pub use replace::{replace, sibling_path, TEMP_SUFFIX};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{EditorConfig, ReplaceStrategy};
use crate::crash_point::{checkpoint, points};
use crate::errors::{EditorError, EditorResult};
use crate::nbt::{Compound, Compression, TagTree};
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::resolver::{Resolution, SaveLayout, DATA_TAG, PLAYER_TAG};

/// Root tags that mark a standalone player record
pub const PLAYER_MARKERS: &[&str] = &["Inventory", "EnderItems", "XpLevel", "attributes", "Attributes"];

/// Where the player subtree sits inside its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// `Data.Player` of a world's root document
    Embedded,
    /// The file's root compound is the player
    Standalone,
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Embedded => write!(f, "embedded"),
            Placement::Standalone => write!(f, "standalone"),
        }
    }
}

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveReport {
    pub path: PathBuf,
    pub backup_path: PathBuf,
    pub bytes_written: usize,
    pub strategy: ReplaceStrategy,
}

/// A decoded player-bearing file
#[derive(Debug, Clone)]
pub struct PlayerDocument {
    path: PathBuf,
    tree: TagTree,
    placement: Placement,
    player: Compound,
    modified: bool,
}

impl PlayerDocument {
    /// Opens a file and works out where its player subtree is.
    ///
    /// `Data.Player` means embedded; a root carrying any of
    /// [`PLAYER_MARKERS`] means standalone; anything else is refused.
    pub fn open(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path.as_ref();
        let tree = read_tree(path)?;
        let placement = detect_placement(&tree.root).ok_or_else(|| {
            EditorError::unsupported(path, "neither Data.Player nor player tags at the root")
        })?;
        Self::from_tree(path, tree, placement)
    }

    /// Opens the record a resolution points at, trusting its layout
    pub fn open_resolved(resolution: &Resolution) -> EditorResult<Self> {
        let (path, placement) = match &resolution.layout {
            SaveLayout::Embedded => (resolution.root_document.as_path(), Placement::Embedded),
            SaveLayout::SeparateFile { record_path, .. } => {
                (record_path.as_path(), Placement::Standalone)
            }
            SaveLayout::Unsupported { reason } => {
                return Err(EditorError::unsupported(
                    &resolution.root_document,
                    reason.clone(),
                ))
            }
        };
        let tree = read_tree(path)?;
        Self::from_tree(path, tree, placement)
    }

    fn from_tree(path: &Path, tree: TagTree, placement: Placement) -> EditorResult<Self> {
        let player = match placement {
            Placement::Embedded => tree
                .root
                .get_compound(DATA_TAG)
                .and_then(|data| data.get_compound(PLAYER_TAG))
                .cloned()
                .ok_or_else(|| EditorError::unsupported(path, "Data.Player is missing"))?,
            Placement::Standalone => tree.root.clone(),
        };

        log_event_with_fields(
            Event::DocumentOpened,
            &[
                ("compression", &tree.compression.to_string()),
                ("path", &path.display().to_string()),
                ("placement", &placement.to_string()),
            ],
        );

        Ok(Self {
            path: path.to_path_buf(),
            tree,
            placement,
            player,
            modified: false,
        })
    }

    pub fn player(&self) -> &Compound {
        &self.player
    }

    /// Mutable player subtree; marks the document modified
    pub fn player_mut(&mut self) -> &mut Compound {
        self.modified = true;
        &mut self.player
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn compression(&self) -> Compression {
        self.tree.compression
    }

    pub fn root_name(&self) -> &str {
        &self.tree.name
    }

    /// True if the player subtree was handed out mutably since open or the
    /// last successful save
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The whole file as it would be written, with the player spliced in
    pub fn to_tree(&self) -> EditorResult<TagTree> {
        let mut tree = self.tree.clone();
        splice(&mut tree, self.placement, self.player.clone(), &self.path)?;
        Ok(tree)
    }

    /// Writes the document back with backup, verification and rollback.
    pub fn save(&mut self, config: &EditorConfig) -> EditorResult<SaveReport> {
        let path = self.path.display().to_string();
        let scope = ObservationScope::with_fields("SAVE", &[("path", path.as_str())]);

        match self.save_inner(config) {
            Ok(report) => {
                self.modified = false;
                scope.complete_with_fields(&[("bytes", &report.bytes_written.to_string())]);
                Ok(report)
            }
            Err(e) => {
                if e.is_fatal() {
                    scope.fail_fatal(&e.to_string());
                } else {
                    scope.fail(&e.to_string());
                }
                Err(e)
            }
        }
    }

    fn save_inner(&mut self, config: &EditorConfig) -> EditorResult<SaveReport> {
        checkpoint(points::SAVE_BEGIN).map_err(|e| EditorError::io_raw("save", &self.path, e))?;

        splice(&mut self.tree, self.placement, self.player.clone(), &self.path)?;
        let bytes = self
            .tree
            .to_bytes()
            .map_err(|e| EditorError::invalid_value(PLAYER_TAG, e.to_string()))?;

        let backup = create_backup(&self.path, config.fsync)?;
        log_event_with_fields(
            Event::BackupCreated,
            &[
                ("checksum", &format!("{:08x}", backup.checksum)),
                ("path", &backup.path.display().to_string()),
            ],
        );

        match self.write_and_verify(&bytes, config) {
            Ok(()) => Ok(SaveReport {
                path: self.path.clone(),
                backup_path: backup.path,
                bytes_written: bytes.len(),
                strategy: config.replace_strategy,
            }),
            Err(original) => Err(self.roll_back(&backup, original, config)),
        }
    }

    fn write_and_verify(&self, bytes: &[u8], config: &EditorConfig) -> EditorResult<()> {
        checkpoint(points::SAVE_AFTER_BACKUP)
            .map_err(|e| EditorError::io_raw("save", &self.path, e))?;

        replace(&self.path, bytes, config.replace_strategy, config.fsync)?;

        checkpoint(points::SAVE_AFTER_REPLACE)
            .map_err(|e| EditorError::io_raw("save", &self.path, e))?;

        if config.verify_after_write {
            verify_written(&self.path, bytes)?;
        }
        Ok(())
    }

    /// Restores the pre-save bytes. Returns the error the caller should see.
    fn roll_back(&self, backup: &Backup, original: EditorError, config: &EditorConfig) -> EditorError {
        let _ = fs::remove_file(sibling_path(&self.path, TEMP_SUFFIX));

        match restore_backup(&self.path, backup, config.fsync) {
            Ok(()) => {
                log_event_with_fields(
                    Event::SaveRolledBack,
                    &[
                        ("error", &original.to_string()),
                        ("path", &self.path.display().to_string()),
                    ],
                );
                original
            }
            Err(rollback) => {
                log_event_with_fields(
                    Event::RollbackFailed,
                    &[
                        ("backup", &backup.path.display().to_string()),
                        ("error", &original.to_string()),
                        ("path", &self.path.display().to_string()),
                        ("rollback_error", &rollback.to_string()),
                    ],
                );
                EditorError::RollbackFailed {
                    path: self.path.clone(),
                    backup: backup.path.clone(),
                    original: Box::new(original),
                    rollback: Box::new(rollback),
                }
            }
        }
    }
}

fn read_tree(path: &Path) -> EditorResult<TagTree> {
    let bytes = fs::read(path).map_err(|e| EditorError::io("read", path, e))?;
    TagTree::from_bytes(&bytes).map_err(|e| EditorError::parse(path, e))
}

fn detect_placement(root: &Compound) -> Option<Placement> {
    let embedded = root
        .get_compound(DATA_TAG)
        .map(|data| data.get_compound(PLAYER_TAG).is_some())
        .unwrap_or(false);
    if embedded {
        Some(Placement::Embedded)
    } else if PLAYER_MARKERS.iter().any(|m| root.contains_key(m)) {
        Some(Placement::Standalone)
    } else {
        None
    }
}

/// Puts the player subtree back at its placement; siblings keep their order
fn splice(tree: &mut TagTree, placement: Placement, player: Compound, path: &Path) -> EditorResult<()> {
    match placement {
        Placement::Standalone => tree.root = player,
        Placement::Embedded => {
            let data = tree
                .root
                .get_compound_mut(DATA_TAG)
                .ok_or_else(|| EditorError::unsupported(path, "Data compound disappeared"))?;
            data.insert(PLAYER_TAG, player);
        }
    }
    Ok(())
}

fn verify_written(path: &Path, expected: &[u8]) -> EditorResult<()> {
    let written = fs::read(path).map_err(|e| EditorError::io_raw("read back", path, e))?;
    if !verify_checksum(&written, compute_checksum(expected)) {
        return Err(EditorError::io_raw(
            "verify",
            path,
            std::io::Error::other("written bytes do not match the encoded document"),
        ));
    }
    TagTree::from_bytes(&written).map_err(|e| EditorError::parse(path, e))?;
    Ok(())
}
