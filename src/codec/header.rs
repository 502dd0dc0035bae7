//! Frame header parsing
//!
//! # Layout
//!
//! All integers are little-endian:
//!
//! ```text
//! +------+----------------------+----------+----------------+
//! | rank | extents (u32 × rank) | encoding | payload ...    |
//! | u8   | outermost first      | u8 tag   |                |
//! +------+----------------------+----------+----------------+
//! ```
//!
//! The header is variable length (`2 + 4 × rank` bytes) but fully determined
//! by its first byte, so truncation is detected before any extent is read.

use crate::DecodeError;
use crate::types::{ElementEncoding, Shape};

/// Size of the rank prefix.
pub const RANK_LEN: usize = 1;

/// Size of one encoded extent.
pub const EXTENT_LEN: usize = 4;

/// Size of the encoding tag.
pub const TAG_LEN: usize = 1;

/// Parsed frame header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub shape: Shape,
    pub encoding: ElementEncoding,
}

impl FrameHeader {
    /// Encoded length of a header for a shape of `rank` extents.
    pub const fn encoded_len(rank: usize) -> usize {
        RANK_LEN + rank * EXTENT_LEN + TAG_LEN
    }

    /// Parse a header from the start of `bytes`.
    ///
    /// Returns the header and the number of bytes it occupied.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize), DecodeError> {
        let Some(&rank) = bytes.first() else {
            return Err(DecodeError::Truncated { needed: RANK_LEN, available: 0 });
        };
        let rank = rank as usize;
        if !(Shape::MIN_RANK..=Shape::MAX_RANK).contains(&rank) {
            return Err(DecodeError::InvalidRank { rank });
        }

        let header_len = Self::encoded_len(rank);
        if bytes.len() < header_len {
            return Err(DecodeError::Truncated { needed: header_len, available: bytes.len() });
        }

        let extents = bytes[RANK_LEN..RANK_LEN + rank * EXTENT_LEN]
            .chunks_exact(EXTENT_LEN)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect::<Vec<_>>();
        let shape = Shape::new(extents)?;
        let encoding = ElementEncoding::from_tag(bytes[header_len - TAG_LEN])?;

        Ok((Self { shape, encoding }, header_len))
    }

    /// Append the encoded header to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.shape.rank() as u8);
        for dim in self.shape.dims() {
            out.extend_from_slice(&dim.to_le_bytes());
        }
        out.push(self.encoding.tag());
    }
}
