//! Save format resolution
//!
//! Decides where a world keeps its player record. Two historical layouts
//! exist and no version flag is guaranteed, so the root document is
//! inspected in priority order (first match wins):
//!
//! 1. `singleplayer_uuid` in `Data` (or at the root): separate-file layout,
//!    record at `<world>/playerdata/<uuid>.dat`
//! 2. `Data.Player` compound: embedded layout, record is `level.dat` itself
//! 3. Anything else: unsupported (multiplayer or unknown). No record path is
//!    guessed and no per-player file is picked automatically.
//!
//! Resolution is a pure function of the parsed root document. The result is
//! carried as data; consumers never re-inspect the document to decide layout.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::errors::{EditorError, EditorResult};
use crate::identifier::PlayerId;
use crate::nbt::{Compound, TagTree};
use crate::observability::{log_event_with_fields, Event};

/// Root document of every world
pub const LEVEL_FILE: &str = "level.dat";
/// Compound holding world-level data inside the root document
pub const DATA_TAG: &str = "Data";
/// Embedded player record inside `Data`
pub const PLAYER_TAG: &str = "Player";
/// Identifier of the single player whose record lives in its own file
pub const IDENTIFIER_TAG: &str = "singleplayer_uuid";
/// Directory of separate player records, relative to the world root
pub const PLAYER_DIR: &str = "playerdata";
/// Extension of separate player records
pub const RECORD_EXTENSION: &str = "dat";

/// Where the player record lives
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SaveLayout {
    /// Player compound nested at `Data.Player` of the root document
    Embedded,
    /// Player record in its own file named by the player identifier
    SeparateFile {
        player_id: PlayerId,
        record_path: PathBuf,
    },
    /// Multiplayer or unrecognised; refused rather than guessed
    Unsupported { reason: String },
}

/// Result of resolving one world
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// The world's root document (`level.dat`)
    pub root_document: PathBuf,
    #[serde(flatten)]
    pub layout: SaveLayout,
}

impl Resolution {
    pub fn is_single_player(&self) -> bool {
        !matches!(self.layout, SaveLayout::Unsupported { .. })
    }

    /// File holding the player record, if the layout is supported
    pub fn player_record_path(&self) -> Option<&Path> {
        match &self.layout {
            SaveLayout::Embedded => Some(&self.root_document),
            SaveLayout::SeparateFile { record_path, .. } => Some(record_path),
            SaveLayout::Unsupported { .. } => None,
        }
    }

    pub fn player_identifier(&self) -> Option<PlayerId> {
        match &self.layout {
            SaveLayout::SeparateFile { player_id, .. } => Some(*player_id),
            _ => None,
        }
    }

    /// Turns the unsupported branch into `UnsupportedLayout`
    pub fn require_supported(&self) -> EditorResult<&Path> {
        match &self.layout {
            SaveLayout::Unsupported { reason } => {
                Err(EditorError::unsupported(&self.root_document, reason.clone()))
            }
            _ => self
                .player_record_path()
                .ok_or_else(|| EditorError::unsupported(&self.root_document, "no player record")),
        }
    }
}

/// Path of the separate record for a player
pub fn player_record_path(world_root: &Path, player_id: PlayerId) -> PathBuf {
    world_root
        .join(PLAYER_DIR)
        .join(format!("{}.{}", player_id, RECORD_EXTENSION))
}

/// Resolves the layout of an already-parsed root document.
///
/// Fails only with `MalformedIdentifier`, when an identifier field is present
/// but cannot be decoded. The unsupported branch is an `Ok` result.
pub fn resolve_document(world_root: &Path, root: &Compound) -> EditorResult<Resolution> {
    let root_document = world_root.join(LEVEL_FILE);
    let data = root.get_compound(DATA_TAG);

    let identifier = data
        .and_then(|d| d.get(IDENTIFIER_TAG))
        .or_else(|| root.get(IDENTIFIER_TAG));

    let layout = if let Some(tag) = identifier {
        let player_id = PlayerId::from_tag(IDENTIFIER_TAG, tag)?;
        SaveLayout::SeparateFile {
            player_id,
            record_path: player_record_path(world_root, player_id),
        }
    } else if data.and_then(|d| d.get_compound(PLAYER_TAG)).is_some() {
        SaveLayout::Embedded
    } else if data.is_none() {
        SaveLayout::Unsupported {
            reason: format!("root document has no '{}' compound", DATA_TAG),
        }
    } else {
        SaveLayout::Unsupported {
            reason: format!(
                "'{}' has neither '{}' nor '{}' (multiplayer world or unknown layout)",
                DATA_TAG, IDENTIFIER_TAG, PLAYER_TAG
            ),
        }
    };

    Ok(Resolution {
        root_document,
        layout,
    })
}

/// Reads a world's root document and resolves its layout.
pub fn resolve_world(world_root: &Path) -> EditorResult<Resolution> {
    let level = world_root.join(LEVEL_FILE);
    let bytes = fs::read(&level).map_err(|e| EditorError::io("read", &level, e))?;
    let tree = TagTree::from_bytes(&bytes).map_err(|e| EditorError::parse(&level, e))?;

    let resolution = resolve_document(world_root, &tree.root)?;
    log_resolution(&resolution);
    Ok(resolution)
}

fn log_resolution(resolution: &Resolution) {
    let path = resolution.root_document.display().to_string();
    match &resolution.layout {
        SaveLayout::Embedded => log_event_with_fields(
            Event::LayoutResolved,
            &[("layout", "embedded"), ("path", path.as_str())],
        ),
        SaveLayout::SeparateFile {
            player_id,
            record_path,
        } => log_event_with_fields(
            Event::LayoutResolved,
            &[
                ("layout", "separate_file"),
                ("path", &path),
                ("player_id", &player_id.to_string()),
                ("record", &record_path.display().to_string()),
            ],
        ),
        SaveLayout::Unsupported { reason } => log_event_with_fields(
            Event::LayoutUnsupported,
            &[("path", path.as_str()), ("reason", reason)],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::{Compression, Tag};
    use tempfile::TempDir;

    fn id_tag() -> Tag {
        Tag::IntArray(vec![0x01020304, -1, 0, 42])
    }

    fn player() -> Compound {
        Compound::new().with("XpLevel", 5i32)
    }

    #[test]
    fn test_identifier_in_data_selects_separate_file() {
        let root = Compound::new().with(DATA_TAG, Compound::new().with(IDENTIFIER_TAG, id_tag()));
        let r = resolve_document(Path::new("/saves/w"), &root).unwrap();

        let expected = "/saves/w/playerdata/01020304-ffff-ffff-0000-00000000002a.dat";
        assert_eq!(r.player_record_path(), Some(Path::new(expected)));
        assert_eq!(r.player_identifier(), Some(PlayerId([0x01020304, -1, 0, 42])));
        assert!(r.is_single_player());
    }

    #[test]
    fn test_identifier_at_root_selects_separate_file() {
        let root = Compound::new()
            .with(IDENTIFIER_TAG, id_tag())
            .with(DATA_TAG, Compound::new());
        let r = resolve_document(Path::new("/w"), &root).unwrap();
        assert!(matches!(r.layout, SaveLayout::SeparateFile { .. }));
    }

    #[test]
    fn test_identifier_wins_over_embedded_player() {
        let data = Compound::new()
            .with(PLAYER_TAG, player())
            .with(IDENTIFIER_TAG, id_tag());
        let root = Compound::new().with(DATA_TAG, data);
        let r = resolve_document(Path::new("/w"), &root).unwrap();
        assert!(matches!(r.layout, SaveLayout::SeparateFile { .. }));
    }

    #[test]
    fn test_embedded_player() {
        let root = Compound::new().with(DATA_TAG, Compound::new().with(PLAYER_TAG, player()));
        let r = resolve_document(Path::new("/w"), &root).unwrap();
        assert_eq!(r.layout, SaveLayout::Embedded);
        assert_eq!(r.player_record_path(), Some(Path::new("/w/level.dat")));
        assert_eq!(r.player_identifier(), None);
    }

    #[test]
    fn test_unrecognised_shape_is_unsupported() {
        let root = Compound::new().with(DATA_TAG, Compound::new().with("LevelName", "Server"));
        let r = resolve_document(Path::new("/w"), &root).unwrap();
        assert!(!r.is_single_player());
        assert_eq!(r.player_record_path(), None);
        assert_eq!(r.require_supported().unwrap_err().code(), "SAVECRAFT_UNSUPPORTED_LAYOUT");

        let r = resolve_document(Path::new("/w"), &Compound::new()).unwrap();
        assert!(matches!(r.layout, SaveLayout::Unsupported { .. }));
    }

    #[test]
    fn test_player_tag_must_be_compound() {
        let root = Compound::new().with(DATA_TAG, Compound::new().with(PLAYER_TAG, "nope"));
        let r = resolve_document(Path::new("/w"), &root).unwrap();
        assert!(matches!(r.layout, SaveLayout::Unsupported { .. }));
    }

    #[test]
    fn test_malformed_identifier_is_error() {
        let root = Compound::new().with(
            DATA_TAG,
            Compound::new()
                .with(IDENTIFIER_TAG, Tag::IntArray(vec![1, 2]))
                .with(PLAYER_TAG, player()),
        );
        let err = resolve_document(Path::new("/w"), &root).unwrap_err();
        assert_eq!(err.code(), "SAVECRAFT_MALFORMED_IDENTIFIER");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let root = Compound::new().with(DATA_TAG, Compound::new().with(PLAYER_TAG, player()));
        let a = resolve_document(Path::new("/w"), &root).unwrap();
        let b = resolve_document(Path::new("/w"), &root).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_world_reads_level_file() {
        let dir = TempDir::new().unwrap();
        let root = Compound::new().with(DATA_TAG, Compound::new().with(PLAYER_TAG, player()));
        let bytes = TagTree::new(root, Compression::Gzip).to_bytes().unwrap();
        fs::write(dir.path().join(LEVEL_FILE), bytes).unwrap();

        let r = resolve_world(dir.path()).unwrap();
        assert_eq!(r.layout, SaveLayout::Embedded);
    }

    #[test]
    fn test_resolve_world_errors() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_world(dir.path()).unwrap_err().code(), "SAVECRAFT_NOT_FOUND");

        fs::write(dir.path().join(LEVEL_FILE), b"garbage").unwrap();
        assert_eq!(resolve_world(dir.path()).unwrap_err().code(), "SAVECRAFT_PARSE_ERROR");
    }

    #[test]
    fn test_layout_serializes_with_kind() {
        let r = Resolution {
            root_document: PathBuf::from("/w/level.dat"),
            layout: SaveLayout::Embedded,
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["kind"], "embedded");
        assert_eq!(v["root_document"], "/w/level.dat");
    }
}
