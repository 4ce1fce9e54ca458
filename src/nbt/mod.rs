//! Binary tag tree ("NBT") codec
//!
//! Self-describing, named, typed, nested key/value nodes. This module owns
//! the in-memory model and the wire format; it knows nothing about worlds or
//! players.
//!
//! # Guarantees
//!
//! - Compound key order is preserved
//! - Empty lists keep their declared element type
//! - decode then encode reproduces the uncompressed input bytes exactly
//!   (a compound that repeats a key is rejected on decode)

mod compression;
mod errors;
mod mutf8;
mod reader;
mod tag;
mod writer;

pub use compression::Compression;
pub use errors::{NbtError, NbtResult};
pub use reader::{decode_root, MAX_DEPTH};
pub use tag::{Compound, Tag, TagList, TagType};
pub use writer::{encode_payload, encode_root};

/// A decoded file: root name, root compound, and the outer compression used.
#[derive(Debug, Clone, PartialEq)]
pub struct TagTree {
    pub name: String,
    pub root: Compound,
    pub compression: Compression,
}

impl TagTree {
    pub fn new(root: Compound, compression: Compression) -> Self {
        Self {
            name: String::new(),
            root,
            compression,
        }
    }

    /// Decodes raw file bytes, detecting compression
    pub fn from_bytes(bytes: &[u8]) -> NbtResult<Self> {
        let compression = Compression::detect(bytes);
        let raw = compression.decompress(bytes)?;
        let (name, root) = decode_root(&raw)?;
        Ok(Self {
            name,
            root,
            compression,
        })
    }

    /// Encodes to file bytes using the remembered compression
    pub fn to_bytes(&self) -> NbtResult<Vec<u8>> {
        let raw = encode_root(&self.name, &self.root)?;
        Ok(self.compression.compress(&raw)?)
    }
}
