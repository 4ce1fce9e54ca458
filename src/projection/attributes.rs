//! Attribute projection
//!
//! Attributes are a list of `{id, base}` compounds under `attributes`, or
//! `{Name, Base}` under `Attributes` in older saves. The experience level is
//! a plain scalar, `XpLevel`, reported in the same map.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::{
    check_scalar_field, qualify, strip_namespace, write_scalar, ScalarValue, SkipReason,
    SkippedEntry,
};
use crate::errors::{EditorError, EditorResult};
use crate::nbt::{Compound, Tag, TagList, TagType};

pub const ATTRIBUTES_TAG: &str = "attributes";
pub const LEGACY_ATTRIBUTES_TAG: &str = "Attributes";
pub const XP_LEVEL_TAG: &str = "XpLevel";

const ID_KEYS: [&str; 2] = ["id", "Name"];
const BASE_KEYS: [&str; 2] = ["base", "Base"];

/// Attribute name → base value, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeMap {
    entries: IndexMap<String, f64>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates; an updated key keeps its position
    pub fn insert(&mut self, name: impl Into<String>, base: f64) -> Option<f64> {
        self.entries.insert(name.into(), base)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a JSON object of name → number, keeping the object's order
    pub fn from_json(value: &Value) -> EditorResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| EditorError::invalid_input("attributes must be a JSON object"))?;

        let mut map = Self::new();
        for (name, base) in object {
            let base = base.as_f64().ok_or_else(|| {
                EditorError::invalid_value(name.as_str(), "attribute values must be numbers")
            })?;
            map.insert(name.as_str(), base);
        }
        Ok(map)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttributeReport {
    pub values: AttributeMap,
    pub skipped: Vec<SkippedEntry>,
}

/// `minecraft:generic.max_health` → `max_health`
pub fn display_key(id: &str) -> &str {
    let path = strip_namespace(id);
    path.rsplit('.').next().unwrap_or(path)
}

/// Name of the attribute list field this player uses. `attributes` wins
/// unless it is an empty list and the legacy field exists.
fn attribute_field(player: &Compound) -> &'static str {
    match player.get(ATTRIBUTES_TAG) {
        Some(tag) if !is_empty_list(tag) => ATTRIBUTES_TAG,
        _ if player.contains_key(LEGACY_ATTRIBUTES_TAG) => LEGACY_ATTRIBUTES_TAG,
        _ => ATTRIBUTES_TAG,
    }
}

fn is_empty_list(tag: &Tag) -> bool {
    tag.as_list().map(TagList::is_empty).unwrap_or(false)
}

fn first_of<'a>(entry: &'a Compound, keys: &[&str]) -> Option<&'a Tag> {
    keys.iter().find_map(|k| entry.get(k))
}

fn read_entry(tag: &Tag) -> Result<(&str, f64), SkipReason> {
    let entry = tag
        .as_compound()
        .ok_or_else(|| SkipReason::WrongType("entry".into()))?;
    let id = first_of(entry, &ID_KEYS).ok_or_else(|| SkipReason::MissingField("id".into()))?;
    let id = id.as_str().ok_or_else(|| SkipReason::WrongType("id".into()))?;
    let base =
        first_of(entry, &BASE_KEYS).ok_or_else(|| SkipReason::MissingField("base".into()))?;
    let base = base.as_f64().ok_or_else(|| SkipReason::WrongType("base".into()))?;
    Ok((id, base))
}

fn read_entries(player: &Compound, mut skip: impl FnMut(SkippedEntry)) -> Vec<(&str, f64)> {
    let field = attribute_field(player);
    let Some(tag) = player.get(field) else {
        return Vec::new();
    };
    let Some(list) = tag.as_list() else {
        skip(SkippedEntry::report(field, None, SkipReason::WrongType(field.to_string())));
        return Vec::new();
    };

    let mut entries = Vec::with_capacity(list.len());
    for (index, tag) in list.iter().enumerate() {
        match read_entry(tag) {
            Ok(entry) => entries.push(entry),
            Err(reason) => skip(SkippedEntry::report(field, Some(index), reason)),
        }
    }
    entries
}

/// Attribute bases under their short names, plus `XpLevel`
pub fn read_attributes(player: &Compound) -> AttributeReport {
    let mut report = AttributeReport::default();
    for (id, base) in read_entries(player, |s| report.skipped.push(s)) {
        report.values.insert(display_key(id), base);
    }

    if let Some(tag) = player.get(XP_LEVEL_TAG) {
        match tag.as_i64() {
            Some(level) => {
                report.values.insert(XP_LEVEL_TAG, level as f64);
            }
            None => report.skipped.push(SkippedEntry::report(
                XP_LEVEL_TAG,
                None,
                SkipReason::WrongType(XP_LEVEL_TAG.to_string()),
            )),
        }
    }
    report
}

/// Attribute bases under their stored, fully-qualified ids
pub fn read_attribute_ids(player: &Compound) -> AttributeMap {
    read_entries(player, |_| {}).into_iter().collect()
}

/// Replaces the attribute list under `field` with one `{id, base}` compound
/// per map entry, in map order. Nothing of the previous list is kept.
pub fn write_attributes(player: &mut Compound, field: &str, map: &AttributeMap) -> EditorResult<()> {
    if field.is_empty() {
        return Err(EditorError::invalid_input("field name must not be empty"));
    }
    for (name, base) in map.iter() {
        validate_base(name, base)?;
    }

    let compounds = map
        .iter()
        .map(|(id, base)| Compound::new().with("id", id).with("base", base))
        .collect();
    player.insert(field, TagList::of_compounds(compounds));
    Ok(())
}

/// Merges edits keyed by short or qualified names into the player.
///
/// `XpLevel` must be a whole number and is written as an Int scalar. Other
/// keys update the matching existing entry in place (its other tags, such as
/// modifiers, stay) or are appended as `{id, base}` with `namespace` added to
/// un-namespaced names.
pub fn apply_attribute_edits(
    player: &mut Compound,
    edits: &AttributeMap,
    namespace: &str,
) -> EditorResult<()> {
    let level = validate_edits(player, edits)?;

    let field = attribute_field(player);
    match player.get(field) {
        Some(tag) => {
            let usable = tag
                .as_list()
                .map(|l| matches!(l.element_type(), TagType::Compound | TagType::End))
                .unwrap_or(false);
            if !usable {
                return Err(EditorError::invalid_value(field, "not a list of compounds"));
            }
        }
        None => {
            if edits.iter().any(|(name, _)| name != XP_LEVEL_TAG) {
                player.insert(field, TagList::new(TagType::Compound));
            }
        }
    }

    if let Some(level) = level {
        write_scalar(player, XP_LEVEL_TAG, ScalarValue::Int(level))?;
    }

    let Some(list) = player.get_list_mut(field) else {
        return Ok(());
    };
    for (name, base) in edits.iter().filter(|(name, _)| *name != XP_LEVEL_TAG) {
        let mut found = false;
        for entry in list.compounds_mut() {
            if !entry_matches(entry, name, namespace) {
                continue;
            }
            let key = BASE_KEYS
                .iter()
                .copied()
                .find(|k| entry.contains_key(k))
                .unwrap_or(BASE_KEYS[0]);
            entry.insert(key, base);
            found = true;
        }
        if !found {
            let entry = Compound::new()
                .with("id", qualify(name, namespace))
                .with("base", base);
            list.push(entry)
                .map_err(|e| EditorError::invalid_value(field, e.to_string()))?;
        }
    }
    Ok(())
}

/// Replaces the attribute list under `field` with the edits, as the read
/// side reports them: `XpLevel` goes to its scalar and short names get
/// `namespace`.
pub fn replace_attributes(
    player: &mut Compound,
    field: &str,
    edits: &AttributeMap,
    namespace: &str,
) -> EditorResult<()> {
    if field.is_empty() {
        return Err(EditorError::invalid_input("field name must not be empty"));
    }
    let level = validate_edits(player, edits)?;

    let qualified: AttributeMap = edits
        .iter()
        .filter(|(name, _)| *name != XP_LEVEL_TAG)
        .map(|(name, base)| (qualify(name, namespace), base))
        .collect();
    write_attributes(player, field, &qualified)?;
    if let Some(level) = level {
        write_scalar(player, XP_LEVEL_TAG, ScalarValue::Int(level))?;
    }
    Ok(())
}

/// Checks every edit against the player before anything is written and
/// returns the requested experience level, if any
fn validate_edits(player: &Compound, edits: &AttributeMap) -> EditorResult<Option<i32>> {
    let mut level = None;
    for (name, base) in edits.iter() {
        if name == XP_LEVEL_TAG {
            level = Some(xp_level(base)?);
            check_scalar_field(player, XP_LEVEL_TAG)?;
        } else if name.is_empty() {
            return Err(EditorError::invalid_input("attribute name must not be empty"));
        } else {
            validate_base(name, base)?;
        }
    }
    Ok(level)
}

fn entry_matches(entry: &Compound, name: &str, namespace: &str) -> bool {
    let Some(id) = ID_KEYS.iter().find_map(|k| entry.get_str(k)) else {
        return false;
    };
    if name.contains(':') {
        id == qualify(name, namespace)
    } else {
        display_key(id) == display_key(name)
    }
}

fn validate_base(name: &str, base: f64) -> EditorResult<()> {
    if !base.is_finite() {
        return Err(EditorError::invalid_value(name, "base must be a finite number"));
    }
    Ok(())
}

fn xp_level(value: f64) -> EditorResult<i32> {
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(EditorError::invalid_value(
            XP_LEVEL_TAG,
            format!("{} is not a whole Int", value),
        ));
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attribute(id: &str, base: f64) -> Compound {
        Compound::new().with("id", id).with("base", base)
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let mut player = Compound::new().with(XP_LEVEL_TAG, 7i32);
        let map: AttributeMap = [("namespace:max_health", 20.0), ("namespace:movement_speed", 0.1)]
            .into_iter()
            .collect();

        write_attributes(&mut player, ATTRIBUTES_TAG, &map).unwrap();
        let values = read_attributes(&player).values;

        let expected: AttributeMap = [("max_health", 20.0), ("movement_speed", 0.1), ("XpLevel", 7.0)]
            .into_iter()
            .collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_write_replaces_previous_list() {
        let mut player = Compound::new().with(
            ATTRIBUTES_TAG,
            TagList::of_compounds(vec![attribute("minecraft:armor", 2.0)]),
        );
        let map: AttributeMap = [("minecraft:luck", 1.0)].into_iter().collect();
        write_attributes(&mut player, ATTRIBUTES_TAG, &map).unwrap();
        assert_eq!(read_attribute_ids(&player), map);
    }

    #[test]
    fn test_legacy_names_and_dotted_ids() {
        let legacy = Compound::new()
            .with("Name", "minecraft:generic.max_health")
            .with("Base", 20.0f64);
        let player = Compound::new().with(LEGACY_ATTRIBUTES_TAG, TagList::of_compounds(vec![legacy]));

        let report = read_attributes(&player);
        assert_eq!(report.values.get("max_health"), Some(20.0));
        assert_eq!(report.values.len(), 1);
    }

    #[test]
    fn test_empty_current_list_falls_back_to_legacy() {
        let player = Compound::new()
            .with(ATTRIBUTES_TAG, TagList::new(TagType::End))
            .with(
                LEGACY_ATTRIBUTES_TAG,
                TagList::of_compounds(vec![attribute("minecraft:generic.armor", 4.0)]),
            );
        assert_eq!(read_attributes(&player).values.get("armor"), Some(4.0));
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let player = Compound::new().with(
            ATTRIBUTES_TAG,
            TagList::of_compounds(vec![
                attribute("minecraft:armor", 2.0),
                Compound::new().with("id", "minecraft:luck"),
                Compound::new().with("id", 3i32).with("base", 1.0f64),
            ]),
        );
        let report = read_attributes(&player);
        assert_eq!(report.values.len(), 1);
        assert_eq!(
            report.skipped.iter().map(|s| s.index).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );
        assert_eq!(report.skipped[0].reason, SkipReason::MissingField("base".into()));
    }

    #[test]
    fn test_from_json() {
        let map = AttributeMap::from_json(&json!({"max_health": 40, "luck": 0.5})).unwrap();
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("max_health", 40.0), ("luck", 0.5)]);

        let err = AttributeMap::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(err.code(), "SAVECRAFT_INVALID_INPUT");
        let err = AttributeMap::from_json(&json!({"luck": "high"})).unwrap_err();
        assert_eq!(err.code(), "SAVECRAFT_INVALID_VALUE");
    }

    #[test]
    fn test_apply_edits_merges_in_place() {
        let with_modifiers = attribute("minecraft:generic.max_health", 20.0)
            .with("modifiers", TagList::new(TagType::End));
        let mut player = Compound::new()
            .with(XP_LEVEL_TAG, 1i32)
            .with(ATTRIBUTES_TAG, TagList::of_compounds(vec![with_modifiers]));

        let edits: AttributeMap = [("max_health", 40.0), ("XpLevel", 30.0), ("luck", 1.0)]
            .into_iter()
            .collect();
        apply_attribute_edits(&mut player, &edits, "minecraft").unwrap();

        assert_eq!(player.get(XP_LEVEL_TAG), Some(&Tag::Int(30)));
        let ids = read_attribute_ids(&player);
        assert_eq!(ids.get("minecraft:generic.max_health"), Some(40.0));
        assert_eq!(ids.get("minecraft:luck"), Some(1.0));
        let first = player.get_list(ATTRIBUTES_TAG).unwrap().get(0).unwrap();
        assert!(first.as_compound().unwrap().contains_key("modifiers"));
    }

    #[test]
    fn test_apply_edits_validates_first() {
        let mut player = Compound::new().with(XP_LEVEL_TAG, 1i32);
        let before = player.clone();

        let edits: AttributeMap = [("luck", 1.0), ("XpLevel", 2.5)].into_iter().collect();
        let err = apply_attribute_edits(&mut player, &edits, "minecraft").unwrap_err();
        assert_eq!(err.code(), "SAVECRAFT_INVALID_VALUE");
        assert_eq!(player, before);

        let edits: AttributeMap = [("luck", f64::INFINITY)].into_iter().collect();
        assert!(apply_attribute_edits(&mut player, &edits, "minecraft").is_err());
        assert_eq!(player, before);
    }

    #[test]
    fn test_apply_edits_refused_level_leaves_player_untouched() {
        let mut player = Compound::new().with(XP_LEVEL_TAG, Compound::new());
        let before = player.clone();

        let edits: AttributeMap = [("luck", 1.0), ("XpLevel", 3.0)].into_iter().collect();
        let err = apply_attribute_edits(&mut player, &edits, "minecraft").unwrap_err();
        assert_eq!(err.code(), "SAVECRAFT_INVALID_VALUE");
        assert_eq!(player, before);
        assert!(!player.contains_key(ATTRIBUTES_TAG));
    }

    #[test]
    fn test_replace_routes_level_and_qualifies_names() {
        let mut player = Compound::new().with(XP_LEVEL_TAG, 5i32).with(
            ATTRIBUTES_TAG,
            TagList::of_compounds(vec![attribute("minecraft:armor", 2.0)]),
        );

        let edits: AttributeMap = [("XpLevel", 30.0), ("max_health", 40.0), ("mod:mana", 9.0)]
            .into_iter()
            .collect();
        replace_attributes(&mut player, ATTRIBUTES_TAG, &edits, "minecraft").unwrap();

        assert_eq!(player.get(XP_LEVEL_TAG), Some(&Tag::Int(30)));
        let ids: Vec<_> = read_attribute_ids(&player)
            .iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(ids, vec!["minecraft:max_health", "mod:mana"]);
    }

    #[test]
    fn test_replace_validates_before_writing() {
        let mut player = Compound::new().with(XP_LEVEL_TAG, TagList::new(TagType::End)).with(
            ATTRIBUTES_TAG,
            TagList::of_compounds(vec![attribute("minecraft:armor", 2.0)]),
        );
        let before = player.clone();

        let edits: AttributeMap = [("max_health", 40.0), ("XpLevel", 30.0)].into_iter().collect();
        assert!(replace_attributes(&mut player, ATTRIBUTES_TAG, &edits, "minecraft").is_err());
        assert_eq!(player, before);
    }

    #[test]
    fn test_display_key() {
        assert_eq!(display_key("minecraft:generic.movement_speed"), "movement_speed");
        assert_eq!(display_key("minecraft:max_health"), "max_health");
        assert_eq!(display_key("luck"), "luck");
    }
}
