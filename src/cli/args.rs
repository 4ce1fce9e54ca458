//! CLI argument definitions using clap
//!
//! Commands:
//! - savecraft resolve --world <dir>
//! - savecraft inventory (--world <dir> | --player-file <file>) [--ender]
//! - savecraft attributes (--world <dir> | --player-file <file>)
//! - savecraft set-scalar <field> <value> (--world <dir> | --player-file <file>)
//! - savecraft set-attributes <json-object> [--replace] (...)
//! - savecraft set-item --slot <n> --id <id> --count <n> (...)
//! - savecraft fill-stacks (...)
//! - savecraft id encode <i0> <i1> <i2> <i3>
//! - savecraft id decode <text>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Config file read when `--config` is not given; absent means defaults
pub const DEFAULT_CONFIG_PATH: &str = "./savecraft.json";

/// savecraft - transactional editor for sandbox game player saves
#[derive(Parser, Debug)]
#[command(name = "savecraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default ./savecraft.json, optional)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which player record to open
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// World directory; the player record is found by resolving its layout
    #[arg(long, conflicts_with = "player_file", required_unless_present = "player_file")]
    pub world: Option<PathBuf>,

    /// Player-bearing file opened as given, without resolution
    #[arg(long)]
    pub player_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report where a world keeps its player record
    Resolve {
        #[arg(long)]
        world: PathBuf,
    },

    /// List inventory items
    Inventory {
        #[command(flatten)]
        target: Target,

        /// Read the ender chest instead of the main inventory
        #[arg(long)]
        ender: bool,
    },

    /// List attribute bases and the experience level
    Attributes {
        #[command(flatten)]
        target: Target,
    },

    /// Set a scalar field; the value is read as JSON, falling back to text
    SetScalar {
        #[command(flatten)]
        target: Target,

        field: String,

        value: String,
    },

    /// Edit attributes from a JSON object of name to base value
    SetAttributes {
        #[command(flatten)]
        target: Target,

        attributes: String,

        /// Replace the whole attribute list instead of merging
        #[arg(long)]
        replace: bool,
    },

    /// Put an item in a slot; count 0 empties it
    SetItem {
        #[command(flatten)]
        target: Target,

        #[arg(long, allow_negative_numbers = true)]
        slot: i32,

        #[arg(long, default_value = "")]
        id: String,

        #[arg(long, allow_negative_numbers = true)]
        count: i32,
    },

    /// Raise every item to its maximum stack size
    FillStacks {
        #[command(flatten)]
        target: Target,
    },

    /// Convert player identifiers
    Id {
        #[command(subcommand)]
        action: IdAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum IdAction {
    /// Four signed 32-bit integers to hyphenated text
    Encode {
        #[arg(num_args = 4, required = true, allow_negative_numbers = true)]
        ints: Vec<i32>,
    },

    /// Hyphenated or plain hex text to four integers
    Decode { text: String },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_world_and_player_file_conflict() {
        let parsed = Cli::try_parse_from([
            "savecraft",
            "inventory",
            "--world",
            "w",
            "--player-file",
            "p.dat",
        ]);
        assert!(parsed.is_err());
        assert!(Cli::try_parse_from(["savecraft", "attributes"]).is_err());
    }

    #[test]
    fn test_negative_identifier_ints() {
        let cli = Cli::try_parse_from(["savecraft", "id", "encode", "1", "-2", "3", "-4"]).unwrap();
        match cli.command {
            Command::Id {
                action: IdAction::Encode { ints },
            } => assert_eq!(ints, vec![1, -2, 3, -4]),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
