//! Inventory projection
//!
//! Items are compounds in the `Inventory` (or `EnderItems`) list with a
//! `Slot`, an `id`, and a count stored as `count` or, in older saves, `Count`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::{
    count_key, count_template, qualify, set_count, strip_namespace, SkipReason, SkippedEntry,
};
use crate::errors::{EditorError, EditorResult};
use crate::nbt::{Compound, Tag, TagList, TagType};

pub const INVENTORY_TAG: &str = "Inventory";
pub const ENDER_ITEMS_TAG: &str = "EnderItems";

/// Largest count an item stack may carry on disk
pub const MAX_COUNT: i32 = 127;

/// Components that describe one particular item; dropped when a slot
/// changes to a different item id
const ITEM_DATA_TAGS: [&str; 2] = ["components", "tag"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub slot: i32,
    /// Item id; reads strip the namespace
    pub item_id: String,
    pub count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryReport {
    pub entries: Vec<InventoryEntry>,
    pub skipped: Vec<SkippedEntry>,
}

/// Reads the main inventory
pub fn read_inventory(player: &Compound) -> InventoryReport {
    read_item_list(player, INVENTORY_TAG)
}

/// Reads the ender chest, same rules as the main inventory
pub fn read_ender_items(player: &Compound) -> InventoryReport {
    read_item_list(player, ENDER_ITEMS_TAG)
}

fn read_item_list(player: &Compound, field: &str) -> InventoryReport {
    let mut report = InventoryReport::default();
    let Some(tag) = player.get(field) else {
        return report;
    };
    let Some(list) = tag.as_list() else {
        report.skipped.push(SkippedEntry::report(
            field,
            None,
            SkipReason::WrongType(field.to_string()),
        ));
        return report;
    };

    let mut seen = HashSet::new();
    for (index, tag) in list.iter().enumerate() {
        match read_entry(tag) {
            Ok(entry) => {
                if !seen.insert(entry.slot) {
                    report.skipped.push(SkippedEntry::report(
                        field,
                        Some(index),
                        SkipReason::DuplicateSlot(entry.slot as i64),
                    ));
                }
                report.entries.push(entry);
            }
            Err(reason) => report
                .skipped
                .push(SkippedEntry::report(field, Some(index), reason)),
        }
    }
    report
}

fn read_entry(tag: &Tag) -> Result<InventoryEntry, SkipReason> {
    let item = tag
        .as_compound()
        .ok_or_else(|| SkipReason::WrongType("entry".into()))?;

    let slot = integer_field(item, "Slot")?;
    let id = item
        .get("id")
        .ok_or_else(|| SkipReason::MissingField("id".into()))?
        .as_str()
        .ok_or_else(|| SkipReason::WrongType("id".into()))?;
    let key = count_key(item).ok_or_else(|| SkipReason::MissingField("count".into()))?;
    let count = integer_field(item, key)?;

    if !(1..=MAX_COUNT as i64).contains(&count) {
        return Err(SkipReason::CountOutOfRange(count));
    }
    let slot = i8::try_from(slot).map_err(|_| SkipReason::WrongType("Slot".into()))?;

    Ok(InventoryEntry {
        slot: slot as i32,
        item_id: strip_namespace(id).to_string(),
        count: count as i32,
    })
}

fn integer_field(item: &Compound, name: &str) -> Result<i64, SkipReason> {
    item.get(name)
        .ok_or_else(|| SkipReason::MissingField(name.to_string()))?
        .as_i64()
        .ok_or_else(|| SkipReason::WrongType(name.to_string()))
}

/// Upserts items into the main inventory by slot.
///
/// An existing item keeps its other tags; its count keeps the stored key and
/// width, and new items copy that convention from the list. A count of 0
/// empties the slot. Ids without a namespace are written under `namespace`.
/// The request is validated as a whole before anything changes.
pub fn write_inventory(
    player: &mut Compound,
    entries: &[InventoryEntry],
    namespace: &str,
) -> EditorResult<()> {
    validate_entries(entries)?;

    if let Some(existing) = player.get(INVENTORY_TAG) {
        let usable = existing
            .as_list()
            .map(|l| matches!(l.element_type(), TagType::Compound | TagType::End))
            .unwrap_or(false);
        if !usable {
            return Err(EditorError::invalid_value(
                INVENTORY_TAG,
                "existing field is not a list of compounds",
            ));
        }
    } else {
        player.insert(INVENTORY_TAG, TagList::new(TagType::Compound));
    }

    let list = player
        .get_list_mut(INVENTORY_TAG)
        .ok_or_else(|| EditorError::invalid_value(INVENTORY_TAG, "not a list"))?;

    let requested: HashMap<i32, &InventoryEntry> = entries.iter().map(|e| (e.slot, e)).collect();
    let mut updated = HashSet::new();
    // New items follow the list's count convention (`Count` as Byte in older saves)
    let template = list
        .iter()
        .filter_map(Tag::as_compound)
        .find_map(count_template)
        .unwrap_or(("count", Tag::Int(0)));

    list.retain(|tag| {
        slot_of(tag)
            .and_then(|slot| requested.get(&slot))
            .map(|entry| entry.count != 0)
            .unwrap_or(true)
    });

    for item in list.compounds_mut() {
        let Some(slot) = item.get("Slot").and_then(Tag::as_i64) else {
            continue;
        };
        let Some(entry) = requested.get(&(slot as i32)) else {
            continue;
        };
        if !updated.insert(entry.slot) {
            continue;
        }
        let id = qualify(&entry.item_id, namespace);
        if item.get_str("id") != Some(id.as_str()) {
            for data in ITEM_DATA_TAGS {
                item.remove(data);
            }
            item.insert("id", id);
        }
        set_count(item, entry.count);
    }

    for entry in entries {
        if entry.count == 0 || updated.contains(&entry.slot) {
            continue;
        }
        let (key, tag) = &template;
        let mut item = Compound::new()
            .with("Slot", entry.slot as i8)
            .with("id", qualify(&entry.item_id, namespace))
            .with(*key, tag.clone());
        set_count(&mut item, entry.count);
        list.push(item)
            .map_err(|e| EditorError::invalid_value(INVENTORY_TAG, e.to_string()))?;
    }
    Ok(())
}

fn slot_of(tag: &Tag) -> Option<i32> {
    tag.as_compound()?
        .get("Slot")?
        .as_i64()
        .map(|slot| slot as i32)
}

fn validate_entries(entries: &[InventoryEntry]) -> EditorResult<()> {
    let mut seen = HashSet::new();
    for entry in entries {
        let field = format!("slot {}", entry.slot);
        if i8::try_from(entry.slot).is_err() {
            return Err(EditorError::invalid_value(field, "slot must fit in a byte"));
        }
        if !(0..=MAX_COUNT).contains(&entry.count) {
            return Err(EditorError::invalid_value(
                field,
                format!("count {} outside 0..={}", entry.count, MAX_COUNT),
            ));
        }
        if entry.count > 0 && entry.item_id.trim().is_empty() {
            return Err(EditorError::invalid_value(field, "item id must not be empty"));
        }
        if !seen.insert(entry.slot) {
            return Err(EditorError::invalid_input(format!(
                "slot {} appears more than once",
                entry.slot
            )));
        }
    }
    Ok(())
}
