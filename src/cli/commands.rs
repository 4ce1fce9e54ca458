//! CLI command implementations

use std::path::Path;

use serde_json::{json, Value};

use crate::config::EditorConfig;
use crate::editor::PlayerEditor;
use crate::errors::EditorError;
use crate::identifier;
use crate::persistence::SaveReport;
use crate::projection::{AttributeMap, InventoryEntry, ScalarValue, ATTRIBUTES_TAG};
use crate::resolver::resolve_world;
use crate::world::WorldRecord;

use super::args::{Cli, Command, IdAction, Target, DEFAULT_CONFIG_PATH};
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Main CLI entry point
///
/// Parses arguments, loads configuration, and dispatches the command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = match &cli.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };
    config.apply_logging()?;
    run_command(cli.command, &config)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command, config: &EditorConfig) -> CliResult<()> {
    match cmd {
        Command::Resolve { world } => resolve(&world),
        Command::Inventory { target, ender } => inventory(&target, ender, config),
        Command::Attributes { target } => attributes(&target, config),
        Command::SetScalar {
            target,
            field,
            value,
        } => set_scalar(&target, &field, &value, config),
        Command::SetAttributes {
            target,
            attributes,
            replace,
        } => set_attributes(&target, &attributes, replace, config),
        Command::SetItem {
            target,
            slot,
            id,
            count,
        } => set_item(&target, InventoryEntry { slot, item_id: id, count }, config),
        Command::FillStacks { target } => fill_stacks(&target, config),
        Command::Id { action } => id(action),
    }
}

fn open(target: &Target, config: &EditorConfig) -> CliResult<PlayerEditor> {
    match (&target.world, &target.player_file) {
        (Some(world), _) => {
            let name = world
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let record = WorldRecord::new(name, world);
            Ok(PlayerEditor::for_world(&record, config)?)
        }
        (None, Some(file)) => Ok(PlayerEditor::for_file(file, config)?),
        (None, None) => Err(CliError::invalid_argument(
            "either --world or --player-file is required",
        )),
    }
}

fn document_summary(editor: &PlayerEditor) -> Value {
    let document = editor.document();
    json!({
        "path": document.path(),
        "placement": document.placement(),
        "compression": document.compression(),
    })
}

fn save(editor: &mut PlayerEditor) -> CliResult<SaveReport> {
    Ok(editor.save()?)
}

fn parse_json(text: &str) -> Result<Value, EditorError> {
    serde_json::from_str(text)
        .map_err(|e| EditorError::invalid_input(format!("not valid JSON: {}", e)))
}

/// Report the resolved layout of a world
pub fn resolve(world: &Path) -> CliResult<()> {
    let resolution = resolve_world(world)?;
    let mut data = serde_json::to_value(&resolution)?;
    if let Some(object) = data.as_object_mut() {
        object.insert(
            "single_player".to_string(),
            json!(resolution.is_single_player()),
        );
    }
    write_response(data)
}

pub fn inventory(target: &Target, ender: bool, config: &EditorConfig) -> CliResult<()> {
    let editor = open(target, config)?;
    let report = if ender {
        editor.ender_items()
    } else {
        editor.inventory()
    };
    write_response(json!({
        "document": document_summary(&editor),
        "entries": report.entries,
        "skipped": report.skipped,
    }))
}

pub fn attributes(target: &Target, config: &EditorConfig) -> CliResult<()> {
    let editor = open(target, config)?;
    let report = editor.attributes();
    write_response(json!({
        "document": document_summary(&editor),
        "values": report.values,
        "skipped": report.skipped,
    }))
}

/// The value is parsed as JSON so `30` is an Int and `0.5` a Float; text
/// that is not JSON is stored as a string.
pub fn set_scalar(target: &Target, field: &str, value: &str, config: &EditorConfig) -> CliResult<()> {
    let json_value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    let scalar = ScalarValue::from_json(field, &json_value)?;

    let mut editor = open(target, config)?;
    editor.set_scalar(field, scalar.clone())?;
    let report = save(&mut editor)?;
    write_response(json!({
        "field": field,
        "value": scalar,
        "save": report,
    }))
}

pub fn set_attributes(
    target: &Target,
    attributes: &str,
    replace: bool,
    config: &EditorConfig,
) -> CliResult<()> {
    let map = AttributeMap::from_json(&parse_json(attributes)?)?;

    let mut editor = open(target, config)?;
    if replace {
        editor.set_attributes(ATTRIBUTES_TAG, &map)?;
    } else {
        editor.edit_attributes(&map)?;
    }
    let report = save(&mut editor)?;
    write_response(json!({
        "values": editor.attributes().values,
        "save": report,
    }))
}

pub fn set_item(target: &Target, entry: InventoryEntry, config: &EditorConfig) -> CliResult<()> {
    let mut editor = open(target, config)?;
    editor.set_items(std::slice::from_ref(&entry))?;
    let report = save(&mut editor)?;
    write_response(json!({
        "entries": editor.inventory().entries,
        "save": report,
    }))
}

pub fn fill_stacks(target: &Target, config: &EditorConfig) -> CliResult<()> {
    let mut editor = open(target, config)?;
    let filled = editor.fill_stacks();
    let report = if editor.is_modified() {
        Some(save(&mut editor)?)
    } else {
        None
    };
    write_response(json!({
        "changed": filled.changed,
        "save": report,
    }))
}

pub fn id(action: IdAction) -> CliResult<()> {
    match action {
        IdAction::Encode { ints } => {
            let ints: [i32; 4] = ints
                .try_into()
                .map_err(|_| CliError::invalid_argument("exactly four integers are required"))?;
            write_response(json!({
                "identifier": identifier::encode(ints),
                "ints": ints,
            }))
        }
        IdAction::Decode { text } => {
            let ints = identifier::decode(&text)?;
            write_response(json!({
                "identifier": identifier::encode(ints),
                "ints": ints,
            }))
        }
    }
}
