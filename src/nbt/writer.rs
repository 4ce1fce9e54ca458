//! Tag tree encoder
//!
//! Mirror of the decoder. Compound keys are written in insertion order and
//! floats are written from their bit patterns, so decode followed by encode
//! reproduces the input bytes exactly.

use byteorder::{BigEndian, WriteBytesExt};

use super::errors::{NbtError, NbtResult};
use super::mutf8;
use super::tag::{Compound, Tag, TagList, TagType};

/// Encodes a named root compound (uncompressed)
pub fn encode_root(name: &str, root: &Compound) -> NbtResult<Vec<u8>> {
    let mut out = Vec::with_capacity(4096);
    out.push(TagType::Compound.id());
    write_string(&mut out, name)?;
    write_compound(&mut out, root)?;
    Ok(out)
}

/// Encodes a single tag payload without name or type id.
///
/// Useful for comparing subtrees byte-for-byte.
pub fn encode_payload(tag: &Tag) -> NbtResult<Vec<u8>> {
    let mut out = Vec::new();
    write_payload(&mut out, tag)?;
    Ok(out)
}

fn write_len(out: &mut Vec<u8>, len: usize) -> NbtResult<()> {
    let len = i32::try_from(len).map_err(|_| NbtError::LengthOverflow(len))?;
    out.write_i32::<BigEndian>(len)?;
    Ok(())
}

fn write_string(out: &mut Vec<u8>, s: &str) -> NbtResult<()> {
    let bytes = mutf8::encode(s);
    let len = u16::try_from(bytes.len()).map_err(|_| NbtError::StringTooLong(bytes.len()))?;
    out.write_u16::<BigEndian>(len)?;
    out.extend_from_slice(&bytes);
    Ok(())
}

fn write_payload(out: &mut Vec<u8>, tag: &Tag) -> NbtResult<()> {
    match tag {
        Tag::Byte(v) => out.write_i8(*v)?,
        Tag::Short(v) => out.write_i16::<BigEndian>(*v)?,
        Tag::Int(v) => out.write_i32::<BigEndian>(*v)?,
        Tag::Long(v) => out.write_i64::<BigEndian>(*v)?,
        Tag::Float(v) => out.write_f32::<BigEndian>(*v)?,
        Tag::Double(v) => out.write_f64::<BigEndian>(*v)?,
        Tag::ByteArray(values) => {
            write_len(out, values.len())?;
            out.extend(values.iter().map(|&b| b as u8));
        }
        Tag::String(s) => write_string(out, s)?,
        Tag::List(list) => write_list(out, list)?,
        Tag::Compound(compound) => write_compound(out, compound)?,
        Tag::IntArray(values) => {
            write_len(out, values.len())?;
            for v in values {
                out.write_i32::<BigEndian>(*v)?;
            }
        }
        Tag::LongArray(values) => {
            write_len(out, values.len())?;
            for v in values {
                out.write_i64::<BigEndian>(*v)?;
            }
        }
    }
    Ok(())
}

fn write_list(out: &mut Vec<u8>, list: &TagList) -> NbtResult<()> {
    out.push(list.element_type().id());
    write_len(out, list.len())?;
    for item in list.iter() {
        write_payload(out, item)?;
    }
    Ok(())
}

fn write_compound(out: &mut Vec<u8>, compound: &Compound) -> NbtResult<()> {
    for (name, tag) in compound.iter() {
        out.push(tag.tag_type().id());
        write_string(out, name)?;
        write_payload(out, tag)?;
    }
    out.push(TagType::End.id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::reader::decode_root;
    use super::*;

    fn player_like() -> Compound {
        let item = Compound::new()
            .with("Slot", 3i8)
            .with("id", "minecraft:torch")
            .with("count", 64i32);
        Compound::new()
            .with("DataVersion", 3955i32)
            .with("Inventory", TagList::of_compounds(vec![item]))
            .with("Motion", TagList::from_tags(vec![Tag::Double(0.0), Tag::Double(-0.0784)]).unwrap())
            .with("Pos", Tag::LongArray(vec![i64::MIN, 0, i64::MAX]))
            .with("UUID", Tag::IntArray(vec![1, -2, 3, -4]))
            .with("Seed", 42i64)
            .with("Flags", Tag::ByteArray(vec![-1, 0, 1]))
            .with("Empty", TagList::new(TagType::End))
            .with("Name", "Zoë\0")
            .with("Speed", 0.1f32)
            .with("Fire", -20i16)
    }

    #[test]
    fn test_encode_then_decode_preserves_tree() {
        let root = player_like();
        let bytes = encode_root("", &root).unwrap();
        let (name, decoded) = decode_root(&bytes).unwrap();
        assert_eq!(name, "");
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_decode_then_encode_is_byte_identical() {
        let bytes = encode_root("level", &player_like()).unwrap();
        let (name, decoded) = decode_root(&bytes).unwrap();
        assert_eq!(encode_root(&name, &decoded).unwrap(), bytes);
    }

    #[test]
    fn test_nan_bit_pattern_survives() {
        let weird = f64::from_bits(0x7FF8_0000_0000_1234);
        let root = Compound::new().with("x", weird);
        let bytes = encode_root("", &root).unwrap();
        let (_, decoded) = decode_root(&bytes).unwrap();
        match decoded.get("x") {
            Some(Tag::Double(v)) => assert_eq!(v.to_bits(), weird.to_bits()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_string_too_long() {
        let root = Compound::new().with("s", "x".repeat(70_000));
        assert!(matches!(
            encode_root("", &root).unwrap_err(),
            NbtError::StringTooLong(70_000)
        ));
    }

    #[test]
    fn test_empty_compound_list_keeps_type() {
        let root = Compound::new().with("Inventory", TagList::new(TagType::Compound));
        let bytes = encode_root("", &root).unwrap();
        let (_, decoded) = decode_root(&bytes).unwrap();
        assert_eq!(
            decoded.get_list("Inventory").unwrap().element_type(),
            TagType::Compound
        );
    }
}
