//! CLI output contract: one JSON object on stdout per invocation

mod common;
mod crash;

use serde_json::Value;
use tempfile::TempDir;

use common::*;
use crash::run_savecraft;

fn stdout_json(stdout: &str) -> Value {
    serde_json::from_str(stdout.trim()).unwrap()
}

#[test]
fn test_id_encode_and_decode() {
    let dir = TempDir::new().unwrap();

    let result = run_savecraft(dir.path(), &["id", "encode", "1", "-2", "3", "-4"]);
    assert!(!result.crashed, "{}", result.stderr);
    let out = stdout_json(&result.stdout);
    assert_eq!(out["status"], "ok");
    assert_eq!(out["data"]["identifier"], "00000001-ffff-fffe-0000-0003fffffffc");

    let result = run_savecraft(dir.path(), &["id", "decode", "00000001-ffff-fffe-0000-0003fffffffc"]);
    let out = stdout_json(&result.stdout);
    assert_eq!(out["data"]["ints"], serde_json::json!([1, -2, 3, -4]));
}

#[test]
fn test_malformed_identifier_exit_code() {
    let dir = TempDir::new().unwrap();
    let result = run_savecraft(dir.path(), &["id", "decode", "xyz"]);
    assert_eq!(result.exit_status.and_then(|s| s.code()), Some(1));
    let out = stdout_json(&result.stdout);
    assert_eq!(out["status"], "error");
    assert_eq!(out["code"], "SAVECRAFT_MALFORMED_IDENTIFIER");
}

#[test]
fn test_inventory_and_resolve_output() {
    let dir = TempDir::new().unwrap();
    let world = dir.path().join("world");
    std::fs::create_dir(&world).unwrap();
    embedded_world(&world);
    let world_arg = world.display().to_string();

    let result = run_savecraft(dir.path(), &["inventory", "--world", &world_arg]);
    assert!(!result.crashed, "{}", result.stderr);
    let out = stdout_json(&result.stdout);
    assert_eq!(out["data"]["entries"][0]["item_id"], "stone");
    assert_eq!(out["data"]["entries"][1]["count"], 1);
    assert_eq!(out["data"]["document"]["placement"], "embedded");

    let result = run_savecraft(dir.path(), &["resolve", "--world", &world_arg]);
    let out = stdout_json(&result.stdout);
    assert_eq!(out["data"]["kind"], "embedded");
    assert_eq!(out["data"]["single_player"], true);
}

#[test]
fn test_unsupported_world_is_error() {
    let dir = TempDir::new().unwrap();
    multiplayer_world(dir.path());
    let world_arg = dir.path().display().to_string();

    let result = run_savecraft(dir.path(), &["attributes", "--world", &world_arg]);
    assert!(result.crashed);
    let out = stdout_json(&result.stdout);
    assert_eq!(out["code"], "SAVECRAFT_UNSUPPORTED_LAYOUT");
}

#[test]
fn test_set_item_and_fill_stacks() {
    let dir = TempDir::new().unwrap();
    let level = embedded_world(dir.path());
    let file_arg = level.display().to_string();

    let result = run_savecraft(
        dir.path(),
        &["set-item", "--player-file", &file_arg, "--slot", "3", "--id", "ender_pearl", "--count", "2"],
    );
    assert!(!result.crashed, "{}", result.stderr);

    let result = run_savecraft(dir.path(), &["fill-stacks", "--player-file", &file_arg]);
    let out = stdout_json(&result.stdout);
    let changed = out["data"]["changed"].as_array().unwrap();
    let pearl = changed.iter().find(|c| c["item_id"] == "minecraft:ender_pearl").unwrap();
    assert_eq!(pearl["to"], 16);
    assert_eq!(pearl["slot"], 3);
}

#[test]
fn test_fill_stacks_without_changes_skips_save() {
    let dir = TempDir::new().unwrap();
    let level = embedded_world(dir.path());
    let file_arg = level.display().to_string();

    let result = run_savecraft(dir.path(), &["fill-stacks", "--player-file", &file_arg]);
    assert!(!result.crashed, "{}", result.stderr);
    let out = stdout_json(&result.stdout);
    assert!(out["data"]["save"].is_object());

    let level_before = std::fs::read(&level).unwrap();
    let backup_before = std::fs::read(dir.path().join("level.dat.backup")).unwrap();

    let result = run_savecraft(dir.path(), &["fill-stacks", "--player-file", &file_arg]);
    let out = stdout_json(&result.stdout);
    assert!(out["data"]["changed"].as_array().unwrap().is_empty());
    assert!(out["data"]["save"].is_null());
    assert_eq!(std::fs::read(&level).unwrap(), level_before);
    assert_eq!(
        std::fs::read(dir.path().join("level.dat.backup")).unwrap(),
        backup_before
    );
}

#[test]
fn test_replace_attributes_with_reported_keys() {
    let dir = TempDir::new().unwrap();
    let level = embedded_world(dir.path());
    let file_arg = level.display().to_string();

    let result = run_savecraft(
        dir.path(),
        &[
            "set-attributes",
            "--player-file",
            &file_arg,
            r#"{"XpLevel":30,"max_health":40}"#,
            "--replace",
        ],
    );
    assert!(!result.crashed, "{}", result.stderr);
    let out = stdout_json(&result.stdout);
    assert_eq!(out["data"]["values"]["XpLevel"], 30.0);
    assert_eq!(out["data"]["values"]["max_health"], 40.0);

    let tree = read_tree(&level);
    let player = tree.root.get_compound("Data").unwrap().get_compound("Player").unwrap();
    assert_eq!(player.get("XpLevel"), Some(&savecraft::nbt::Tag::Int(30)));
    let list = player.get_list("attributes").unwrap();
    assert_eq!(list.len(), 1);
    let entry = list.get(0).unwrap().as_compound().unwrap();
    assert_eq!(entry.get_str("id"), Some("minecraft:max_health"));
}
