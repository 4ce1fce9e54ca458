//! Player data projections
//!
//! Flat, typed views over the player subtree and the writes that go back.
//!
//! Reads are tolerant: a malformed entry is skipped and reported in the
//! result's `skipped` list, never fatal. Writes are strict: they validate
//! everything first and either apply fully or return an error with the
//! subtree untouched.

mod attributes;
mod inventory;
mod stacks;

pub use attributes::{
    apply_attribute_edits, display_key, read_attribute_ids, read_attributes, replace_attributes,
    write_attributes, AttributeMap, AttributeReport, ATTRIBUTES_TAG, LEGACY_ATTRIBUTES_TAG,
    XP_LEVEL_TAG,
};
pub use inventory::{
    read_ender_items, read_inventory, write_inventory, InventoryEntry, InventoryReport,
    ENDER_ITEMS_TAG, INVENTORY_TAG, MAX_COUNT,
};
pub use stacks::{fill_stacks, max_stack_size, pending_fills, FillReport, FilledSlot};

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::errors::{EditorError, EditorResult};
use crate::nbt::{Compound, Tag, TagType};
use crate::observability::{log_event_with_fields, Event};

/// Why a list entry was left out of a read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    MissingField(String),
    WrongType(String),
    CountOutOfRange(i64),
    /// Entry kept, but its slot was already seen
    DuplicateSlot(i64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(name) => write!(f, "missing field '{}'", name),
            SkipReason::WrongType(name) => write!(f, "wrong type for '{}'", name),
            SkipReason::CountOutOfRange(n) => write!(f, "count {} out of range", n),
            SkipReason::DuplicateSlot(slot) => write!(f, "duplicate slot {}", slot),
        }
    }
}

/// A diagnostic from a tolerant read
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Position in the source list; `None` when the whole field is unusable
    pub index: Option<usize>,
    pub reason: SkipReason,
}

impl SkippedEntry {
    fn report(field: &str, index: Option<usize>, reason: SkipReason) -> Self {
        let event = match reason {
            SkipReason::DuplicateSlot(_) => Event::DuplicateSlot,
            _ => Event::EntrySkipped,
        };
        let index_text = index.map(|i| i.to_string()).unwrap_or_default();
        log_event_with_fields(
            event,
            &[
                ("field", field),
                ("index", &index_text),
                ("reason", &reason.to_string()),
            ],
        );
        Self { index, reason }
    }
}

/// A single value written to a named player field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Int(i32),
    Float(f32),
    Text(String),
}

impl ScalarValue {
    /// Maps an untyped JSON value to a tag kind: integers become `Int`, other
    /// numbers `Float`, strings `Text`. Anything else is refused.
    pub fn from_json(field: &str, value: &Value) -> EditorResult<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i32::try_from(i).map(ScalarValue::Int).map_err(|_| {
                        EditorError::invalid_value(field, format!("{} does not fit in Int", i))
                    })
                } else if n.is_u64() {
                    Err(EditorError::invalid_value(
                        field,
                        format!("{} does not fit in Int", n),
                    ))
                } else {
                    let f = n.as_f64().unwrap_or(f64::NAN);
                    let narrowed = f as f32;
                    if !narrowed.is_finite() {
                        return Err(EditorError::invalid_value(
                            field,
                            format!("{} does not fit in Float", n),
                        ));
                    }
                    Ok(ScalarValue::Float(narrowed))
                }
            }
            Value::String(s) => Ok(ScalarValue::Text(s.clone())),
            Value::Bool(_) => Err(EditorError::invalid_value(field, "booleans are not supported")),
            Value::Null => Err(EditorError::invalid_value(field, "null is not a value")),
            Value::Array(_) | Value::Object(_) => Err(EditorError::invalid_value(
                field,
                "expected a number or a string",
            )),
        }
    }

    fn into_tag(self) -> Tag {
        match self {
            ScalarValue::Int(v) => Tag::Int(v),
            ScalarValue::Float(v) => Tag::Float(v),
            ScalarValue::Text(v) => Tag::String(v),
        }
    }
}

/// Sets a scalar field on the player, inserting it if absent.
///
/// An existing compound, list, or array under the same name is not
/// overwritten.
pub fn write_scalar(player: &mut Compound, field: &str, value: ScalarValue) -> EditorResult<()> {
    check_scalar_field(player, field)?;
    player.insert(field, value.into_tag());
    Ok(())
}

/// Fails unless `field` is a usable name that holds no container tag
fn check_scalar_field(player: &Compound, field: &str) -> EditorResult<()> {
    if field.is_empty() {
        return Err(EditorError::invalid_input("field name must not be empty"));
    }
    if let Some(existing) = player.get(field) {
        if is_container(existing.tag_type()) {
            return Err(EditorError::invalid_value(
                field,
                format!("refusing to replace a {} with a scalar", existing.tag_type()),
            ));
        }
    }
    Ok(())
}

fn is_container(ty: TagType) -> bool {
    matches!(
        ty,
        TagType::List
            | TagType::Compound
            | TagType::ByteArray
            | TagType::IntArray
            | TagType::LongArray
    )
}

/// `minecraft:stone` stays as is; `stone` becomes `<namespace>:stone`
pub fn qualify(id: &str, namespace: &str) -> String {
    if id.contains(':') {
        id.to_string()
    } else {
        format!("{}:{}", namespace, id)
    }
}

/// `minecraft:stone` → `stone`
pub fn strip_namespace(id: &str) -> &str {
    id.split_once(':').map(|(_, path)| path).unwrap_or(id)
}

/// Current and legacy item count keys
const COUNT_KEYS: [&str; 2] = ["count", "Count"];

fn count_key(item: &Compound) -> Option<&'static str> {
    COUNT_KEYS.iter().copied().find(|k| item.contains_key(k))
}

/// Count key and tag of an existing item, used as the template for new
/// items in the same list
fn count_template(item: &Compound) -> Option<(&'static str, Tag)> {
    let key = count_key(item)?;
    Some((key, item.get(key)?.clone()))
}

/// Sets an item's count, keeping the existing key and numeric width
fn set_count(item: &mut Compound, count: i32) {
    let key = count_key(item).unwrap_or(COUNT_KEYS[0]);
    let tag = match item.get(key) {
        Some(Tag::Byte(_)) => Tag::Byte(count as i8),
        Some(Tag::Short(_)) => Tag::Short(count as i16),
        Some(Tag::Long(_)) => Tag::Long(count as i64),
        _ => Tag::Int(count),
    };
    item.insert(key, tag);
}
