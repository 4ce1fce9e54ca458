//! Player edit sessions
//!
//! `PlayerEditor` is the open → read/mutate → save cycle in one value. Reads
//! and writes go through the projections; only `save` touches the disk.

use std::path::Path;

use crate::config::EditorConfig;
use crate::errors::EditorResult;
use crate::persistence::{PlayerDocument, SaveReport};
use crate::projection::{
    apply_attribute_edits, fill_stacks, pending_fills, read_attributes, read_ender_items,
    read_inventory, replace_attributes, write_inventory, write_scalar, AttributeMap,
    AttributeReport, FillReport, InventoryEntry, InventoryReport, ScalarValue,
};
use crate::resolver::Resolution;
use crate::world::WorldRecord;

pub struct PlayerEditor {
    document: PlayerDocument,
    config: EditorConfig,
    resolution: Option<Resolution>,
}

impl PlayerEditor {
    /// Resolves the world's layout and opens its player record
    pub fn for_world(world: &WorldRecord, config: &EditorConfig) -> EditorResult<Self> {
        let resolution = world.resolution()?;
        let document = PlayerDocument::open_resolved(&resolution)?;
        Ok(Self {
            document,
            config: config.clone(),
            resolution: Some(resolution),
        })
    }

    /// Opens an explicitly named player-bearing file
    pub fn for_file(path: impl AsRef<Path>, config: &EditorConfig) -> EditorResult<Self> {
        Ok(Self {
            document: PlayerDocument::open(path)?,
            config: config.clone(),
            resolution: None,
        })
    }

    pub fn document(&self) -> &PlayerDocument {
        &self.document
    }

    /// How the record was located, when opened through a world
    pub fn resolution(&self) -> Option<&Resolution> {
        self.resolution.as_ref()
    }

    pub fn inventory(&self) -> InventoryReport {
        read_inventory(self.document.player())
    }

    pub fn ender_items(&self) -> InventoryReport {
        read_ender_items(self.document.player())
    }

    pub fn attributes(&self) -> AttributeReport {
        read_attributes(self.document.player())
    }

    pub fn set_scalar(&mut self, field: &str, value: ScalarValue) -> EditorResult<()> {
        write_scalar(self.document.player_mut(), field, value)
    }

    /// Replaces the whole attribute list under `field`. Takes the same keys
    /// `attributes()` reports, so `XpLevel` and short names are accepted.
    pub fn set_attributes(&mut self, field: &str, map: &AttributeMap) -> EditorResult<()> {
        replace_attributes(
            self.document.player_mut(),
            field,
            map,
            &self.config.default_namespace,
        )
    }

    /// Merges attribute edits (including `XpLevel`) into the existing list
    pub fn edit_attributes(&mut self, edits: &AttributeMap) -> EditorResult<()> {
        apply_attribute_edits(
            self.document.player_mut(),
            edits,
            &self.config.default_namespace,
        )
    }

    pub fn set_items(&mut self, entries: &[InventoryEntry]) -> EditorResult<()> {
        write_inventory(
            self.document.player_mut(),
            entries,
            &self.config.default_namespace,
        )
    }

    /// Leaves the document unmodified when every stack is already full
    pub fn fill_stacks(&mut self) -> FillReport {
        if pending_fills(self.document.player()).changed.is_empty() {
            return FillReport::default();
        }
        fill_stacks(self.document.player_mut())
    }

    pub fn is_modified(&self) -> bool {
        self.document.is_modified()
    }

    pub fn save(&mut self) -> EditorResult<SaveReport> {
        self.document.save(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbt::{Compound, Compression, Tag, TagList, TagTree};
    use std::fs;
    use tempfile::TempDir;

    fn world_with_player(dir: &Path) -> WorldRecord {
        let item = Compound::new()
            .with("Slot", 0i8)
            .with("id", "minecraft:stone")
            .with("count", 5i32);
        let player = Compound::new()
            .with("XpLevel", 2i32)
            .with("Inventory", TagList::of_compounds(vec![item]));
        let root = Compound::new().with("Data", Compound::new().with("Player", player));
        let bytes = TagTree::new(root, Compression::Gzip).to_bytes().unwrap();
        fs::write(dir.join("level.dat"), bytes).unwrap();
        WorldRecord::new("Test", dir)
    }

    fn config() -> EditorConfig {
        EditorConfig {
            fsync: false,
            ..EditorConfig::default()
        }
    }

    #[test]
    fn test_edit_session_round_trip() {
        let dir = TempDir::new().unwrap();
        let world = world_with_player(dir.path());

        let mut editor = PlayerEditor::for_world(&world, &config()).unwrap();
        assert!(editor.resolution().is_some());
        assert_eq!(editor.inventory().entries[0].count, 5);
        assert!(!editor.is_modified());

        editor.set_scalar("XpLevel", ScalarValue::Int(40)).unwrap();
        editor
            .set_items(&[InventoryEntry {
                slot: 1,
                item_id: "torch".into(),
                count: 10,
            }])
            .unwrap();
        editor.fill_stacks();
        editor.save().unwrap();

        let reopened = PlayerEditor::for_file(world.level_path(), &config()).unwrap();
        assert_eq!(reopened.attributes().values.get("XpLevel"), Some(40.0));
        let counts: Vec<_> = reopened.inventory().entries.iter().map(|e| e.count).collect();
        assert_eq!(counts, vec![64, 64]);
        assert_eq!(
            reopened.document().player().get("XpLevel"),
            Some(&Tag::Int(40))
        );
    }

    #[test]
    fn test_replace_accepts_reported_keys() {
        let dir = TempDir::new().unwrap();
        let world = world_with_player(dir.path());

        let mut editor = PlayerEditor::for_world(&world, &config()).unwrap();
        let map: AttributeMap = [("XpLevel", 30.0), ("max_health", 40.0)].into_iter().collect();
        editor.set_attributes("attributes", &map).unwrap();
        editor.save().unwrap();

        let reopened = PlayerEditor::for_file(world.level_path(), &config()).unwrap();
        assert_eq!(reopened.document().player().get("XpLevel"), Some(&Tag::Int(30)));
        let ids = crate::projection::read_attribute_ids(reopened.document().player());
        assert_eq!(ids.iter().collect::<Vec<_>>(), vec![("minecraft:max_health", 40.0)]);
        let values = reopened.attributes().values;
        assert_eq!(values.get("XpLevel"), Some(30.0));
        assert_eq!(values.get("max_health"), Some(40.0));
    }

    #[test]
    fn test_fill_with_full_stacks_leaves_document_clean() {
        let dir = TempDir::new().unwrap();
        let world = world_with_player(dir.path());

        let mut editor = PlayerEditor::for_world(&world, &config()).unwrap();
        assert_eq!(editor.fill_stacks().changed.len(), 1);
        editor.save().unwrap();

        let mut editor = PlayerEditor::for_world(&world, &config()).unwrap();
        assert!(editor.fill_stacks().changed.is_empty());
        assert!(!editor.is_modified());
    }

    #[test]
    fn test_nothing_written_before_save() {
        let dir = TempDir::new().unwrap();
        let world = world_with_player(dir.path());
        let before = fs::read(world.level_path()).unwrap();

        let mut editor = PlayerEditor::for_world(&world, &config()).unwrap();
        let edits: AttributeMap = [("max_health", 40.0)].into_iter().collect();
        editor.edit_attributes(&edits).unwrap();
        assert!(editor.is_modified());

        assert_eq!(fs::read(world.level_path()).unwrap(), before);
        assert!(!dir.path().join("level.dat.backup").exists());
    }
}
