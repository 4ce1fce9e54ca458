//! Stack filling
//!
//! Raises every item in the inventory and ender chest to its maximum stack
//! size. Stack sizes come from two fixed tables: items that never stack, and
//! items that stack to 16. Everything else stacks to 64.

use serde::Serialize;

use super::inventory::{ENDER_ITEMS_TAG, INVENTORY_TAG};
use super::{count_key, set_count, strip_namespace};
use crate::nbt::{Compound, Tag};

/// Item path words that mark a tool, armour piece, or other single item.
/// Matched as whole `_`-separated words at either end of the path.
const UNSTACKABLE_WORDS: &[&str] = &[
    "sword",
    "pickaxe",
    "axe",
    "shovel",
    "hoe",
    "helmet",
    "chestplate",
    "leggings",
    "boots",
    "bow",
    "crossbow",
    "trident",
    "shield",
    "shears",
    "flint_and_steel",
    "fishing_rod",
    "carrot_on_a_stick",
    "warped_fungus_on_a_stick",
    "elytra",
    "saddle",
    "horse_armor",
    "music_disc",
    "potion",
    "splash_potion",
    "lingering_potion",
    "enchanted_book",
    "writable_book",
    "written_book",
    "suspicious_stew",
    "totem_of_undying",
];

const STACK_16_ITEMS: &[&str] = &[
    "snowball",
    "egg",
    "ender_pearl",
    "sign",
    "oak_sign",
    "spruce_sign",
    "birch_sign",
    "jungle_sign",
    "acacia_sign",
    "dark_oak_sign",
    "crimson_sign",
    "warped_sign",
    "mangrove_sign",
    "bamboo_sign",
    "cherry_sign",
    "bucket",
    "water_bucket",
    "lava_bucket",
    "milk_bucket",
    "powder_snow_bucket",
    "axolotl_bucket",
    "tadpole_bucket",
    "cod_bucket",
    "salmon_bucket",
    "pufferfish_bucket",
    "tropical_fish_bucket",
];

const DEFAULT_STACK: i32 = 64;

/// Maximum stack size for an item id, with or without namespace
pub fn max_stack_size(item_id: &str) -> i32 {
    let path = strip_namespace(item_id);
    if STACK_16_ITEMS.contains(&path) {
        16
    } else if UNSTACKABLE_WORDS.iter().any(|word| has_word(path, word)) {
        1
    } else {
        DEFAULT_STACK
    }
}

fn has_word(path: &str, word: &str) -> bool {
    path == word
        || path
            .strip_suffix(word)
            .map(|rest| rest.ends_with('_'))
            .unwrap_or(false)
        || path
            .strip_prefix(word)
            .map(|rest| rest.starts_with('_'))
            .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilledSlot {
    pub field: &'static str,
    pub slot: Option<i32>,
    pub item_id: String,
    pub from: i64,
    pub to: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub changed: Vec<FilledSlot>,
}

/// Items in `Inventory` and `EnderItems` that are below their maximum stack
/// size, without changing anything
pub fn pending_fills(player: &Compound) -> FillReport {
    let mut report = FillReport::default();
    for field in [INVENTORY_TAG, ENDER_ITEMS_TAG] {
        let Some(list) = player.get_list(field) else {
            continue;
        };
        let items = list.iter().filter_map(Tag::as_compound);
        report
            .changed
            .extend(items.filter_map(|item| plan_fill(field, item)));
    }
    report
}

/// Sets every item in `Inventory` and `EnderItems` to its maximum stack
/// size. Entries without a string `id` are left alone.
pub fn fill_stacks(player: &mut Compound) -> FillReport {
    let mut report = FillReport::default();
    for field in [INVENTORY_TAG, ENDER_ITEMS_TAG] {
        let Some(list) = player.get_list_mut(field) else {
            continue;
        };
        for item in list.compounds_mut() {
            if let Some(filled) = plan_fill(field, item) {
                set_count(item, filled.to);
                report.changed.push(filled);
            }
        }
    }
    report
}

fn plan_fill(field: &'static str, item: &Compound) -> Option<FilledSlot> {
    let item_id = item.get_str("id")?.to_string();
    let max = max_stack_size(&item_id);
    let current = count_key(item)
        .and_then(|key| item.get(key))
        .and_then(Tag::as_i64)
        .unwrap_or(0);
    if current == max as i64 {
        return None;
    }

    Some(FilledSlot {
        field,
        slot: item.get("Slot").and_then(Tag::as_i64).map(|s| s as i32),
        item_id,
        from: current,
        to: max,
    })
}
