//! Player identifier codec
//!
//! A player identifier is 16 bytes stored in save files as four big-endian
//! signed 32-bit integers (most significant first). Its text form is the
//! canonical 8-4-4-4-12 lowercase hex grouping.
//!
//! `decode(encode(x)) == x` holds for every `[i32; 4]`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{EditorError, EditorResult};
use crate::nbt::Tag;

/// Encodes four integers as hyphenated lowercase hex.
///
/// Each integer contributes its 8-digit two's-complement hex form.
pub fn encode(ints: [i32; 4]) -> String {
    PlayerId(ints).to_uuid().hyphenated().to_string()
}

/// Decodes hyphenated (or bare) hex text back into four integers.
///
/// All hyphens are removed first; what remains must be exactly 32 hex digits.
pub fn decode(text: &str) -> EditorResult<[i32; 4]> {
    let digits: String = text.chars().filter(|&c| c != '-').collect();

    if digits.len() != 32 {
        return Err(EditorError::malformed_identifier(
            text,
            format!("expected 32 hex digits, found {}", digits.chars().count()),
        ));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(EditorError::malformed_identifier(
            text,
            format!("non-hex character {bad:?}"),
        ));
    }

    let value = u128::from_str_radix(&digits, 16)
        .map_err(|e| EditorError::malformed_identifier(text, e.to_string()))?;
    Ok(PlayerId::from_uuid(Uuid::from_u128(value)).0)
}

/// A 16-byte player identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerId(pub [i32; 4]);

impl PlayerId {
    pub fn ints(&self) -> [i32; 4] {
        self.0
    }

    pub fn to_uuid(self) -> Uuid {
        let value = self
            .0
            .iter()
            .fold(0u128, |acc, &part| (acc << 32) | (part as u32 as u128));
        Uuid::from_u128(value)
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        let value = uuid.as_u128();
        Self([
            (value >> 96) as u32 as i32,
            (value >> 64) as u32 as i32,
            (value >> 32) as u32 as i32,
            value as u32 as i32,
        ])
    }

    /// Reads an identifier stored as an `IntArray` of four, or a list of four `Int`s.
    ///
    /// `field` names the tag for error messages.
    pub fn from_tag(field: &str, tag: &Tag) -> EditorResult<Self> {
        let ints: Vec<i32> = match tag {
            Tag::IntArray(values) => values.clone(),
            Tag::List(list) => list
                .iter()
                .map(|t| match t {
                    Tag::Int(v) => Ok(*v),
                    other => Err(EditorError::malformed_identifier(
                        field,
                        format!("list element is {}, expected Int", other.tag_type()),
                    )),
                })
                .collect::<EditorResult<_>>()?,
            other => {
                return Err(EditorError::malformed_identifier(
                    field,
                    format!("stored as {}, expected IntArray", other.tag_type()),
                ))
            }
        };

        let ints: [i32; 4] = ints.as_slice().try_into().map_err(|_| {
            EditorError::malformed_identifier(
                field,
                format!("expected 4 integers, found {}", ints.len()),
            )
        })?;
        Ok(Self(ints))
    }

    pub fn to_tag(self) -> Tag {
        Tag::IntArray(self.0.to_vec())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self.0))
    }
}

impl FromStr for PlayerId {
    type Err = EditorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).map(PlayerId)
    }
}

impl Serialize for PlayerId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PlayerId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
