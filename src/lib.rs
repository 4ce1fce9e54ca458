//! savecraft - a transactional editor for sandbox game player saves
//!
//! Reads a world's binary tag-tree files, finds the player record whichever
//! layout the world uses, exposes flat inventory and attribute views, and
//! writes edits back with a verified backup and rollback on failure.

pub mod cli;
pub mod config;
pub mod crash_point;
pub mod editor;
pub mod errors;
pub mod identifier;
pub mod nbt;
pub mod observability;
pub mod persistence;
pub mod projection;
pub mod resolver;
pub mod world;

pub use config::{EditorConfig, ReplaceStrategy};
pub use editor::PlayerEditor;
pub use errors::{EditorError, EditorResult};
pub use identifier::PlayerId;
pub use persistence::{Placement, PlayerDocument, SaveReport};
pub use resolver::{resolve_document, resolve_world, Resolution, SaveLayout};
pub use world::WorldRecord;
