//! Tag tree decoder
//!
//! Decodes the big-endian wire format:
//! - root: type id, u16-prefixed name, payload
//! - strings: u16 length + modified UTF-8
//! - lists: element type id + i32 length + payloads
//! - arrays: i32 length + elements
//!
//! Every length is checked against the bytes remaining before anything is
//! allocated, so a corrupt length fails fast instead of exhausting memory.

use std::io::{self, Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};

use super::errors::{NbtError, NbtResult};
use super::mutf8;
use super::tag::{Compound, Tag, TagList, TagType};

/// Maximum compound/list nesting accepted
pub const MAX_DEPTH: usize = 512;

/// Decodes an uncompressed tag tree into its root name and compound.
pub fn decode_root(bytes: &[u8]) -> NbtResult<(String, Compound)> {
    let mut decoder = Decoder::new(bytes);

    let offset = decoder.offset();
    let id = decoder.read_u8()?;
    let ty = TagType::from_id(id).ok_or(NbtError::InvalidTagType { id, offset })?;
    if ty != TagType::Compound {
        return Err(NbtError::RootNotCompound(ty));
    }

    let name = decoder.read_string()?;
    let root = decoder.read_compound(0)?;

    let trailing = decoder.remaining();
    if trailing > 0 {
        return Err(NbtError::TrailingBytes(trailing));
    }

    Ok((name, root))
}

struct Decoder<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Decoder<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    fn offset(&self) -> u64 {
        self.cursor.position()
    }

    fn remaining(&self) -> usize {
        let len = self.cursor.get_ref().len() as u64;
        len.saturating_sub(self.cursor.position()) as usize
    }

    fn eof(&self, e: io::Error) -> NbtError {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            NbtError::UnexpectedEof(self.offset())
        } else {
            NbtError::Io(e)
        }
    }

    fn read_u8(&mut self) -> NbtResult<u8> {
        self.cursor.read_u8().map_err(|e| self.eof(e))
    }

    fn read_i8(&mut self) -> NbtResult<i8> {
        self.cursor.read_i8().map_err(|e| self.eof(e))
    }

    fn read_i16(&mut self) -> NbtResult<i16> {
        self.cursor.read_i16::<BigEndian>().map_err(|e| self.eof(e))
    }

    fn read_i32(&mut self) -> NbtResult<i32> {
        self.cursor.read_i32::<BigEndian>().map_err(|e| self.eof(e))
    }

    fn read_i64(&mut self) -> NbtResult<i64> {
        self.cursor.read_i64::<BigEndian>().map_err(|e| self.eof(e))
    }

    fn read_f32(&mut self) -> NbtResult<f32> {
        self.cursor.read_f32::<BigEndian>().map_err(|e| self.eof(e))
    }

    fn read_f64(&mut self) -> NbtResult<f64> {
        self.cursor.read_f64::<BigEndian>().map_err(|e| self.eof(e))
    }

    fn read_type(&mut self) -> NbtResult<TagType> {
        let offset = self.offset();
        let id = self.read_u8()?;
        TagType::from_id(id).ok_or(NbtError::InvalidTagType { id, offset })
    }

    /// Reads an i32 element count and checks `count * width` bytes remain
    fn read_len(&mut self, width: usize) -> NbtResult<usize> {
        let offset = self.offset();
        let length = self.read_i32()?;
        if length < 0 {
            return Err(NbtError::NegativeLength { length, offset });
        }
        let length = length as usize;
        if length.saturating_mul(width) > self.remaining() {
            return Err(NbtError::UnexpectedEof(self.cursor.get_ref().len() as u64));
        }
        Ok(length)
    }

    fn read_string(&mut self) -> NbtResult<String> {
        let len = self.cursor.read_u16::<BigEndian>().map_err(|e| self.eof(e))? as usize;
        let offset = self.offset();
        if len > self.remaining() {
            return Err(NbtError::UnexpectedEof(self.cursor.get_ref().len() as u64));
        }
        let mut buf = vec![0u8; len];
        self.cursor.read_exact(&mut buf).map_err(|e| self.eof(e))?;
        mutf8::decode(&buf).ok_or(NbtError::InvalidString(offset))
    }

    fn read_payload(&mut self, ty: TagType, depth: usize) -> NbtResult<Tag> {
        Ok(match ty {
            TagType::End => {
                return Err(NbtError::InvalidTagType {
                    id: 0,
                    offset: self.offset(),
                })
            }
            TagType::Byte => Tag::Byte(self.read_i8()?),
            TagType::Short => Tag::Short(self.read_i16()?),
            TagType::Int => Tag::Int(self.read_i32()?),
            TagType::Long => Tag::Long(self.read_i64()?),
            TagType::Float => Tag::Float(self.read_f32()?),
            TagType::Double => Tag::Double(self.read_f64()?),
            TagType::ByteArray => {
                let len = self.read_len(1)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(self.read_i8()?);
                }
                Tag::ByteArray(values)
            }
            TagType::String => Tag::String(self.read_string()?),
            TagType::List => Tag::List(self.read_list(depth + 1)?),
            TagType::Compound => Tag::Compound(self.read_compound(depth + 1)?),
            TagType::IntArray => {
                let len = self.read_len(4)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(self.read_i32()?);
                }
                Tag::IntArray(values)
            }
            TagType::LongArray => {
                let len = self.read_len(8)?;
                let mut values = Vec::with_capacity(len);
                for _ in 0..len {
                    values.push(self.read_i64()?);
                }
                Tag::LongArray(values)
            }
        })
    }

    fn read_list(&mut self, depth: usize) -> NbtResult<TagList> {
        if depth > MAX_DEPTH {
            return Err(NbtError::DepthLimit(MAX_DEPTH));
        }
        let element_type = self.read_type()?;
        // Every element occupies at least one byte, except End which has none
        let width = if element_type == TagType::End { 0 } else { 1 };
        let len = self.read_len(width)?;
        if element_type == TagType::End {
            // An End-typed list may only be empty
            if len > 0 {
                return Err(NbtError::InvalidTagType {
                    id: 0,
                    offset: self.offset(),
                });
            }
            return Ok(TagList::new(TagType::End));
        }

        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.read_payload(element_type, depth)?);
        }
        Ok(TagList::from_raw(element_type, items))
    }

    fn read_compound(&mut self, depth: usize) -> NbtResult<Compound> {
        if depth > MAX_DEPTH {
            return Err(NbtError::DepthLimit(MAX_DEPTH));
        }
        let mut compound = Compound::new();
        loop {
            let ty = self.read_type()?;
            if ty == TagType::End {
                return Ok(compound);
            }
            let offset = self.offset();
            let name = self.read_string()?;
            if compound.contains_key(&name) {
                return Err(NbtError::DuplicateKey { key: name, offset });
            }
            let tag = self.read_payload(ty, depth)?;
            compound.insert(name, tag);
        }
    }
}
