//! Primitive wire types: the closed set of scalar encodings a dialect field
//! can declare, their byte widths, and the descending-width sort key used to
//! build a message's wire order.

use std::fmt;

/// A primitive MAVLink wire type, as named in dialect XML `type` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    Float,
    Double,
    Char,
}

impl WireType {
    /// Parses the primitive portion of a dialect `type` attribute (the part
    /// before any `[N]` array suffix), e.g. `"uint8_t"`, `"float"`, `"char"`.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "uint8_t" | "uint8_t_mavlink_version" => WireType::UInt8,
            "int8_t" => WireType::Int8,
            "uint16_t" => WireType::UInt16,
            "int16_t" => WireType::Int16,
            "uint32_t" => WireType::UInt32,
            "int32_t" => WireType::Int32,
            "uint64_t" => WireType::UInt64,
            "int64_t" => WireType::Int64,
            "float" => WireType::Float,
            "double" => WireType::Double,
            "char" => WireType::Char,
            _ => return None,
        })
    }

    /// Byte width of a single element of this type.
    pub const fn width(self) -> usize {
        match self {
            WireType::UInt8 | WireType::Int8 | WireType::Char => 1,
            WireType::UInt16 | WireType::Int16 => 2,
            WireType::UInt32 | WireType::Int32 | WireType::Float => 4,
            WireType::UInt64 | WireType::Int64 | WireType::Double => 8,
        }
    }

    /// The C type name as it appears in the dialect XML and as digested into
    /// CRC_EXTRA, e.g. `"uint8_t"`.
    pub fn primitive_name(self) -> &'static str {
        match self {
            WireType::UInt8 => "uint8_t",
            WireType::Int8 => "int8_t",
            WireType::UInt16 => "uint16_t",
            WireType::Int16 => "int16_t",
            WireType::UInt32 => "uint32_t",
            WireType::Int32 => "int32_t",
            WireType::UInt64 => "uint64_t",
            WireType::Int64 => "int64_t",
            WireType::Float => "float",
            WireType::Double => "double",
            WireType::Char => "char",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.primitive_name())
    }
}

/// A field's declared shape: a primitive type repeated `array_len` times.
/// `array_len == 1` means a scalar field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeShape {
    pub element: WireType,
    pub array_len: usize,
}

impl TypeShape {
    pub const fn scalar(element: WireType) -> Self {
        Self {
            element,
            array_len: 1,
        }
    }

    pub const fn array(element: WireType, len: usize) -> Self {
        Self {
            element,
            array_len: len,
        }
    }

    /// Total byte width of the field on the wire.
    pub const fn byte_len(self) -> usize {
        self.element.width() * self.array_len
    }

    /// The width used to order fields by descending size: arrays sort by
    /// their element width, not their total size (matching the reference
    /// compiler, which sorts `uint8_t[16]` alongside other 1-byte fields
    /// rather than ahead of a lone `uint32_t`).
    pub const fn sort_width(self) -> usize {
        self.element.width()
    }

    pub fn is_array(self) -> bool {
        self.array_len != 1
    }
}

/// Parses a dialect `type` attribute such as `"uint8_t"` or `"char[16]"`.
pub fn parse_type_attr(attr: &str) -> Option<TypeShape> {
    if let Some(open) = attr.find('[') {
        let (base, rest) = attr.split_at(open);
        let len_str = rest.strip_prefix('[')?.strip_suffix(']')?;
        let len: usize = len_str.parse().ok()?;
        let element = WireType::parse(base)?;
        Some(TypeShape::array(element, len))
    } else {
        WireType::parse(attr).map(TypeShape::scalar)
    }
}

/// Produces a deterministic, non-zero sample value's little-endian encoding
/// for a scalar wire type, used by round-trip tests and (optionally) by
/// default value generation for code that wants to exercise every field
/// without hand-writing each one.
pub fn sample_scalar_bytes(ty: WireType, seed: u64) -> Vec<u8> {
    match ty {
        WireType::UInt8 => vec![(seed % 251) as u8],
        WireType::Int8 => vec![(seed as i8).wrapping_sub(64) as u8],
        WireType::UInt16 => ((seed % 60000) as u16).to_le_bytes().to_vec(),
        WireType::Int16 => (((seed % 30000) as i16) - 15000).to_le_bytes().to_vec(),
        WireType::UInt32 => ((seed as u32).wrapping_mul(2654435761)).to_le_bytes().to_vec(),
        WireType::Int32 => ((seed as i32).wrapping_mul(40503)).to_le_bytes().to_vec(),
        WireType::UInt64 => (seed.wrapping_mul(0x9E3779B97F4A7C15)).to_le_bytes().to_vec(),
        WireType::Int64 => ((seed as i64).wrapping_mul(2685821657736338717)).to_le_bytes().to_vec(),
        WireType::Float => (1.0f32 + (seed % 1000) as f32 / 7.0).to_le_bytes().to_vec(),
        WireType::Double => (1.0f64 + (seed % 1000) as f64 / 11.0).to_le_bytes().to_vec(),
        WireType::Char => vec![b'a' + (seed % 26) as u8],
    }
}
