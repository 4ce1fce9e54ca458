//! World records
//!
//! A `WorldRecord` is one world directory handed over by whatever scans the
//! saves folder. Its layout is resolved on first use and cached together with
//! the root document's modification time; a changed timestamp forces a fresh
//! resolution on the next access.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::errors::{EditorError, EditorResult};
use crate::identifier::PlayerId;
use crate::observability::{log_event_with_fields, Event};
use crate::resolver::{resolve_world, Resolution, LEVEL_FILE};

#[derive(Debug, Clone)]
struct CachedResolution {
    resolution: Resolution,
    modified: Option<SystemTime>,
}

#[derive(Debug)]
pub struct WorldRecord {
    name: String,
    root_path: PathBuf,
    cache: RefCell<Option<CachedResolution>>,
}

impl WorldRecord {
    pub fn new(name: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root_path: root_path.into(),
            cache: RefCell::new(None),
        }
    }

    /// Builds fresh records from a scanner's `(name, root_path)` output.
    /// Every call yields unresolved records.
    pub fn from_scan<I, N, P>(entries: I) -> Vec<Self>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<PathBuf>,
    {
        entries
            .into_iter()
            .map(|(name, root)| Self::new(name, root))
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn level_path(&self) -> PathBuf {
        self.root_path.join(LEVEL_FILE)
    }

    pub fn is_resolved(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Drops the cached resolution
    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    /// The world's layout, resolving on first use or when `level.dat` changed
    pub fn resolution(&self) -> EditorResult<Resolution> {
        let level = self.level_path();
        let modified = fs::metadata(&level)
            .map_err(|e| EditorError::io("stat", &level, e))?
            .modified()
            .ok();

        if let Some(cached) = self.cache.borrow().as_ref() {
            if cached.modified == modified && modified.is_some() {
                return Ok(cached.resolution.clone());
            }
            log_event_with_fields(
                Event::ResolutionStale,
                &[("path", level.display().to_string().as_str()), ("world", self.name.as_str())],
            );
        }

        let resolution = resolve_world(&self.root_path)?;
        *self.cache.borrow_mut() = Some(CachedResolution {
            resolution: resolution.clone(),
            modified,
        });
        Ok(resolution)
    }

    pub fn is_single_player(&self) -> EditorResult<bool> {
        Ok(self.resolution()?.is_single_player())
    }

    pub fn player_record_path(&self) -> EditorResult<Option<PathBuf>> {
        Ok(self.resolution()?.player_record_path().map(Path::to_path_buf))
    }

    pub fn player_identifier(&self) -> EditorResult<Option<PlayerId>> {
        Ok(self.resolution()?.player_identifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::{Compound, Compression, Tag, TagTree};
    use crate::resolver::SaveLayout;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn write_level(dir: &Path, data: Compound) {
        let root = Compound::new().with("Data", data);
        let bytes = TagTree::new(root, Compression::Gzip).to_bytes().unwrap();
        fs::write(dir.join(LEVEL_FILE), bytes).unwrap();
    }

    fn embedded() -> Compound {
        Compound::new().with("Player", Compound::new().with("XpLevel", 1i32))
    }

    fn separate() -> Compound {
        Compound::new().with("singleplayer_uuid", Tag::IntArray(vec![1, 2, 3, 4]))
    }

    fn bump_mtime(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_lazy_resolution() {
        let dir = TempDir::new().unwrap();
        write_level(dir.path(), embedded());

        let world = WorldRecord::new("Test", dir.path());
        assert!(!world.is_resolved());
        assert!(world.is_single_player().unwrap());
        assert!(world.is_resolved());
        assert_eq!(world.player_record_path().unwrap(), Some(world.level_path()));
        assert_eq!(world.player_identifier().unwrap(), None);
    }

    #[test]
    fn test_changed_level_is_re_resolved() {
        let dir = TempDir::new().unwrap();
        let level = dir.path().join(LEVEL_FILE);
        write_level(dir.path(), embedded());
        bump_mtime(&level, 1_000_000);

        let world = WorldRecord::new("Test", dir.path());
        assert_eq!(world.resolution().unwrap().layout, SaveLayout::Embedded);

        write_level(dir.path(), separate());
        bump_mtime(&level, 2_000_000);

        let layout = world.resolution().unwrap().layout;
        assert!(matches!(layout, SaveLayout::SeparateFile { .. }));
        assert_eq!(
            world.player_identifier().unwrap(),
            Some(PlayerId([1, 2, 3, 4]))
        );
    }

    #[test]
    fn test_same_mtime_uses_cache_until_invalidated() {
        let dir = TempDir::new().unwrap();
        let level = dir.path().join(LEVEL_FILE);
        write_level(dir.path(), embedded());
        bump_mtime(&level, 1_000_000);

        let world = WorldRecord::new("Test", dir.path());
        assert_eq!(world.resolution().unwrap().layout, SaveLayout::Embedded);

        write_level(dir.path(), separate());
        bump_mtime(&level, 1_000_000);
        assert_eq!(world.resolution().unwrap().layout, SaveLayout::Embedded);

        world.invalidate();
        assert!(!world.is_resolved());
        assert!(matches!(
            world.resolution().unwrap().layout,
            SaveLayout::SeparateFile { .. }
        ));
    }

    #[test]
    fn test_missing_level_is_not_found() {
        let dir = TempDir::new().unwrap();
        let world = WorldRecord::new("Empty", dir.path());
        assert_eq!(world.resolution().unwrap_err().code(), "SAVECRAFT_NOT_FOUND");
    }

    #[test]
    fn test_from_scan() {
        let worlds = WorldRecord::from_scan(vec![("A", "/saves/a"), ("B", "/saves/b")]);
        assert_eq!(worlds.len(), 2);
        assert_eq!(worlds[1].name(), "B");
        assert_eq!(worlds[1].root_path(), Path::new("/saves/b"));
        assert!(worlds.iter().all(|w| !w.is_resolved()));
    }
}
