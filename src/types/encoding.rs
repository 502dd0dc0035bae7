//! Element encoding definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DecodeError;

/// Encoding of a single frame element on the wire.
///
/// The discriminant is the tag byte carried in the frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ElementEncoding {
    /// 8-bit unsigned integer
    UInt8 = 1,
    /// 16-bit unsigned integer (raw detector counts)
    UInt16 = 2,
    /// 32-bit unsigned integer
    UInt32 = 3,
    /// 32-bit IEEE float (reconstructed slices)
    Float32 = 4,
    /// 64-bit IEEE float
    Float64 = 5,
}

impl ElementEncoding {
    /// Returns the size in bytes of one element.
    pub const fn width(self) -> usize {
        match self {
            ElementEncoding::UInt8 => 1,
            ElementEncoding::UInt16 => 2,
            ElementEncoding::UInt32 | ElementEncoding::Float32 => 4,
            ElementEncoding::Float64 => 8,
        }
    }

    /// Returns the header tag byte for this encoding.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Resolve a header tag byte.
    pub fn from_tag(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(ElementEncoding::UInt8),
            2 => Ok(ElementEncoding::UInt16),
            3 => Ok(ElementEncoding::UInt32),
            4 => Ok(ElementEncoding::Float32),
            5 => Ok(ElementEncoding::Float64),
            other => Err(DecodeError::UnsupportedEncoding { tag: other }),
        }
    }

    /// Whether elements are floating point.
    pub const fn is_float(self) -> bool {
        matches!(self, ElementEncoding::Float32 | ElementEncoding::Float64)
    }
}

impl fmt::Display for ElementEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementEncoding::UInt8 => "uint8",
            ElementEncoding::UInt16 => "uint16",
            ElementEncoding::UInt32 => "uint32",
            ElementEncoding::Float32 => "float32",
            ElementEncoding::Float64 => "float64",
        };
        f.write_str(name)
    }
}
