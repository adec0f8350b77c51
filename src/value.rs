//! The dynamic, runtime-typed value a decoded or to-be-encoded field holds.
//!
//! Messages here are open records rather than one generated struct per
//! dialect message (see `SPEC_FULL.md` §9): a field's value is always one of
//! these variants, looked up by field name out of the message record.

use indexmap::IndexMap;
use std::collections::BTreeSet;

/// The value of a single field, before or after wire encoding.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    Char(u8),
    /// A fixed-length array of scalar values of the same element type.
    Array(Vec<FieldValue>),
    /// An enum-typed scalar field.
    Enum(EnumValue),
    /// A bitmask-typed scalar field.
    Bitmask(BitmaskValue),
}

impl FieldValue {
    /// Interprets this value as an unsigned integer, for fields that accept
    /// either a numeric or symbolic form (enum/bitmask) as well as plain
    /// integers. Returns `None` for floats, chars, and arrays.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt8(v) => Some(*v as u64),
            FieldValue::Int8(v) => Some(*v as u64),
            FieldValue::UInt16(v) => Some(*v as u64),
            FieldValue::Int16(v) => Some(*v as u64),
            FieldValue::UInt32(v) => Some(*v as u64),
            FieldValue::Int32(v) => Some(*v as u64),
            FieldValue::UInt64(v) => Some(*v),
            FieldValue::Int64(v) => Some(*v as u64),
            FieldValue::Char(v) => Some(*v as u64),
            FieldValue::Enum(e) => Some(e.numeric() as u64),
            FieldValue::Bitmask(b) => Some(b.to_bits() as u64),
            FieldValue::Float(_) | FieldValue::Double(_) | FieldValue::Array(_) => None,
        }
    }
}

/// Sum type modeling the enum/numeric duality from `SPEC_FULL.md` §9: decode
/// produces `Known` when the numeric value matches an entry in the enum
/// group, `Raw` otherwise; encode accepts either form from the application.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EnumValue {
    Known { tag: String, value: u32 },
    Raw(u32),
}

impl EnumValue {
    pub fn numeric(&self) -> u32 {
        match self {
            EnumValue::Known { value, .. } => *value,
            EnumValue::Raw(value) => *value,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            EnumValue::Known { tag, .. } => Some(tag.as_str()),
            EnumValue::Raw(_) => None,
        }
    }
}

/// A bitmask field's value: the set of symbolic flags known to be set, plus
/// any set bits that do not correspond to a known flag (the "unknown-bits
/// residual" from `SPEC_FULL.md` §4.4).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BitmaskValue {
    pub known: BTreeSet<String>,
    /// Bits set in the raw mask that do not correspond to a known flag.
    pub unknown_bits: u32,
    /// The full numeric mask, retained so `to_bits` is lossless even if a
    /// known flag's bit value changes between catalog versions.
    raw_bits: u32,
}

impl BitmaskValue {
    pub fn new(known: BTreeSet<String>, unknown_bits: u32, raw_bits: u32) -> Self {
        Self {
            known,
            unknown_bits,
            raw_bits,
        }
    }

    pub fn to_bits(&self) -> u32 {
        self.raw_bits
    }
}

/// A decoded or to-be-encoded message's fields, keyed by declaration name and
/// preserving declaration order for deterministic iteration (diagnostics,
/// `Debug`, serde).
pub type FieldMap = IndexMap<String, FieldValue>;
