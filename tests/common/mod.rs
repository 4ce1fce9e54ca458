//! Shared fixtures: worlds and player records written to temp directories

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use savecraft::nbt::{Compound, Compression, Tag, TagList, TagTree};
use savecraft::PlayerId;

pub const SEED: i64 = -4_172_144_997_902_289_642;

pub fn item(slot: i8, id: &str, count: i32) -> Compound {
    Compound::new()
        .with("Slot", slot)
        .with("id", id)
        .with("count", count)
}

pub fn attribute(id: &str, base: f64) -> Compound {
    Compound::new().with("id", id).with("base", base)
}

/// A player with a two-item inventory, one attribute, and level 5
pub fn sample_player() -> Compound {
    Compound::new()
        .with("DataVersion", 3955i32)
        .with(
            "Inventory",
            TagList::of_compounds(vec![
                item(0, "minecraft:stone", 5),
                item(1, "minecraft:diamond_sword", 1).with("components", Compound::new()),
            ]),
        )
        .with("EnderItems", TagList::of_compounds(vec![]))
        .with(
            "attributes",
            TagList::of_compounds(vec![attribute("minecraft:max_health", 20.0)]),
        )
        .with("XpLevel", 5i32)
        .with("Health", 20.0f32)
}

fn data(extra: Vec<(&str, Tag)>) -> Compound {
    let mut data = Compound::new()
        .with("LevelName", "Fixture")
        .with("RandomSeed", SEED)
        .with("DataVersion", 3955i32);
    for (key, tag) in extra {
        data.insert(key, tag);
    }
    data
}

pub fn write_tree(path: &Path, root: Compound, compression: Compression) {
    let bytes = TagTree::new(root, compression).to_bytes().unwrap();
    fs::write(path, bytes).unwrap();
}

pub fn read_tree(path: &Path) -> TagTree {
    TagTree::from_bytes(&fs::read(path).unwrap()).unwrap()
}

/// World whose player lives at `Data.Player`; returns the level path
pub fn embedded_world(dir: &Path) -> PathBuf {
    let level = dir.join("level.dat");
    let root = Compound::new().with(
        "Data",
        data(vec![("Player", Tag::Compound(sample_player()))]),
    );
    write_tree(&level, root, Compression::Gzip);
    level
}

/// World whose player lives in `playerdata/<uuid>.dat`; returns the record path
pub fn separate_world(dir: &Path, id: PlayerId) -> PathBuf {
    let root = Compound::new().with(
        "Data",
        data(vec![("singleplayer_uuid", id.to_tag())]),
    );
    write_tree(&dir.join("level.dat"), root, Compression::Gzip);

    fs::create_dir_all(dir.join("playerdata")).unwrap();
    let record = dir.join("playerdata").join(format!("{}.dat", id));
    write_tree(&record, sample_player(), Compression::Gzip);
    record
}

/// World with neither layout, as a dedicated server writes it
pub fn multiplayer_world(dir: &Path) -> PathBuf {
    let level = dir.join("level.dat");
    write_tree(&level, Compound::new().with("Data", data(vec![])), Compression::Gzip);
    level
}
