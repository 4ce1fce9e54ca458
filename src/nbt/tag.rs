//! Tag model: typed scalars, arrays, lists and compounds.

use std::fmt;

use indexmap::IndexMap;

use super::errors::{NbtError, NbtResult};

/// Wire type ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagType {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagType {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => TagType::End,
            1 => TagType::Byte,
            2 => TagType::Short,
            3 => TagType::Int,
            4 => TagType::Long,
            5 => TagType::Float,
            6 => TagType::Double,
            7 => TagType::ByteArray,
            8 => TagType::String,
            9 => TagType::List,
            10 => TagType::Compound,
            11 => TagType::IntArray,
            12 => TagType::LongArray,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TagType::End => "End",
            TagType::Byte => "Byte",
            TagType::Short => "Short",
            TagType::Int => "Int",
            TagType::Long => "Long",
            TagType::Float => "Float",
            TagType::Double => "Double",
            TagType::ByteArray => "ByteArray",
            TagType::String => "String",
            TagType::List => "List",
            TagType::Compound => "Compound",
            TagType::IntArray => "IntArray",
            TagType::LongArray => "LongArray",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node in the tag tree
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(TagList),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn tag_type(&self) -> TagType {
        match self {
            Tag::Byte(_) => TagType::Byte,
            Tag::Short(_) => TagType::Short,
            Tag::Int(_) => TagType::Int,
            Tag::Long(_) => TagType::Long,
            Tag::Float(_) => TagType::Float,
            Tag::Double(_) => TagType::Double,
            Tag::ByteArray(_) => TagType::ByteArray,
            Tag::String(_) => TagType::String,
            Tag::List(_) => TagType::List,
            Tag::Compound(_) => TagType::Compound,
            Tag::IntArray(_) => TagType::IntArray,
            Tag::LongArray(_) => TagType::LongArray,
        }
    }

    /// Integer value of any integral scalar width
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v as i64),
            Tag::Short(v) => Some(v as i64),
            Tag::Int(v) => Some(v as i64),
            Tag::Long(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric value of any scalar width, integral or floating
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Tag::Float(v) => Some(v as f64),
            Tag::Double(v) => Some(v),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&TagList> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut TagList> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }
}

macro_rules! tag_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Tag {
            fn from(v: $ty) -> Self {
                Tag::$variant(v)
            }
        })*
    };
}

tag_from! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    TagList => List,
    Compound => Compound,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self {
        Tag::String(v.to_owned())
    }
}

/// Ordered mapping with unique string keys.
///
/// Insertion order is the wire order, so an untouched compound encodes back
/// to the bytes it was decoded from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: IndexMap<String, Tag>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, tag: impl Into<Tag>) -> Self {
        self.insert(key, tag);
        self
    }

    /// Inserts or replaces a tag. A replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        self.entries.insert(key.into(), tag.into())
    }

    /// Removes a tag, keeping the order of the remaining keys
    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.entries.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get_compound(&self, key: &str) -> Option<&Compound> {
        self.get(key).and_then(Tag::as_compound)
    }

    pub fn get_compound_mut(&mut self, key: &str) -> Option<&mut Compound> {
        self.get_mut(key).and_then(Tag::as_compound_mut)
    }

    pub fn get_list(&self, key: &str) -> Option<&TagList> {
        self.get(key).and_then(Tag::as_list)
    }

    pub fn get_list_mut(&mut self, key: &str) -> Option<&mut TagList> {
        self.get_mut(key).and_then(Tag::as_list_mut)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Tag::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Tag)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Homogeneous list with a declared element type.
///
/// The element type is fixed at creation; an empty list keeps whatever type
/// it was declared with (commonly `End`).
#[derive(Debug, Clone, PartialEq)]
pub struct TagList {
    element_type: TagType,
    items: Vec<Tag>,
}

impl TagList {
    pub fn new(element_type: TagType) -> Self {
        Self {
            element_type,
            items: Vec::new(),
        }
    }

    /// Builds a list whose element type is taken from the first tag.
    /// An empty input yields an `End`-typed list.
    pub fn from_tags(tags: Vec<Tag>) -> NbtResult<Self> {
        let element_type = tags.first().map(Tag::tag_type).unwrap_or(TagType::End);
        let mut list = Self::new(element_type);
        for tag in tags {
            list.push(tag)?;
        }
        Ok(list)
    }

    /// Builds a compound list; cannot fail since every element is a compound
    pub fn of_compounds(compounds: Vec<Compound>) -> Self {
        Self {
            element_type: TagType::Compound,
            items: compounds.into_iter().map(Tag::Compound).collect(),
        }
    }

    pub fn push(&mut self, tag: impl Into<Tag>) -> NbtResult<()> {
        let tag = tag.into();
        let found = tag.tag_type();
        if self.items.is_empty() && self.element_type == TagType::End {
            self.element_type = found;
        } else if found != self.element_type {
            return Err(NbtError::ListTypeMismatch {
                expected: self.element_type,
                found,
            });
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn element_type(&self) -> TagType {
        self.element_type
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    /// Mutable access to compound elements. Element types cannot change
    /// through this view.
    pub fn compounds_mut(&mut self) -> impl Iterator<Item = &mut Compound> {
        self.items.iter_mut().filter_map(Tag::as_compound_mut)
    }

    pub fn remove(&mut self, index: usize) -> Tag {
        self.items.remove(index)
    }

    pub fn retain<F: FnMut(&Tag) -> bool>(&mut self, f: F) {
        self.items.retain(f)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn from_raw(element_type: TagType, items: Vec<Tag>) -> Self {
        Self {
            element_type,
            items,
        }
    }
}
