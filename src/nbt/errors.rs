//! Tag tree codec errors

use std::io;

use thiserror::Error;

use super::tag::TagType;

/// Result type for codec operations
pub type NbtResult<T> = Result<T, NbtError>;

/// Failures while decoding or encoding a tag tree
#[derive(Debug, Error)]
pub enum NbtError {
    #[error("unexpected end of data at offset {0}")]
    UnexpectedEof(u64),

    #[error("invalid tag type id {id} at offset {offset}")]
    InvalidTagType { id: u8, offset: u64 },

    #[error("negative length {length} at offset {offset}")]
    NegativeLength { length: i32, offset: u64 },

    #[error("invalid modified UTF-8 string at offset {0}")]
    InvalidString(u64),

    #[error("nesting deeper than {0} levels")]
    DepthLimit(usize),

    #[error("{0} trailing bytes after root tag")]
    TrailingBytes(usize),

    #[error("key {key:?} repeated in one compound at offset {offset}")]
    DuplicateKey { key: String, offset: u64 },

    #[error("root tag must be a compound, found {0}")]
    RootNotCompound(TagType),

    #[error("list holds {expected} elements, cannot add {found}")]
    ListTypeMismatch { expected: TagType, found: TagType },

    #[error("string of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),

    #[error("length {0} does not fit a signed 32-bit prefix")]
    LengthOverflow(usize),

    #[error("compression error: {0}")]
    Io(#[from] io::Error),
}
