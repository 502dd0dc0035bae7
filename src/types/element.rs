//! Typed element access for frame payloads

use super::ElementEncoding;

/// Trait for numeric types that can be read from a frame payload.
///
/// Each implementation is tied to exactly one [`ElementEncoding`]; reading a
/// payload with a mismatched type is rejected by [`Frame::elements`].
///
/// [`Frame::elements`]: super::Frame::elements
pub trait Element: Copy + Sized {
    /// Encoding this type reads and writes.
    const ENCODING: ElementEncoding;

    /// Size in bytes of one element.
    const WIDTH: usize = Self::ENCODING.width();

    /// Decode one element from the first [`Self::WIDTH`] little-endian bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than [`Self::WIDTH`].
    fn read_le(bytes: &[u8]) -> Self;

    /// Append the little-endian representation of this element.
    fn write_le(self, out: &mut Vec<u8>);

    /// Widen to `f64` for statistics and color scaling.
    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($ty:ty, $encoding:expr, $width:literal) => {
        impl Element for $ty {
            const ENCODING: ElementEncoding = $encoding;

            fn read_le(bytes: &[u8]) -> Self {
                let mut raw = [0u8; $width];
                raw.copy_from_slice(&bytes[..$width]);
                <$ty>::from_le_bytes(raw)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element!(u8, ElementEncoding::UInt8, 1);
impl_element!(u16, ElementEncoding::UInt16, 2);
impl_element!(u32, ElementEncoding::UInt32, 4);
impl_element!(f32, ElementEncoding::Float32, 4);
impl_element!(f64, ElementEncoding::Float64, 8);

/// Fold every non-NaN element of `payload` into its `(min, max)` range.
pub(crate) fn value_range<T: Element>(payload: &[u8]) -> Option<(f64, f64)> {
    payload
        .chunks_exact(T::WIDTH)
        .map(|chunk| T::read_le(chunk).to_f64())
        .filter(|value| !value.is_nan())
        .fold(None, |range, value| match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((lo.min(value), hi.max(value))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_u16_le_roundtrip(value in any::<u16>()) {
            let mut out = Vec::new();
            value.write_le(&mut out);
            prop_assert_eq!(out.len(), u16::WIDTH);
            prop_assert_eq!(u16::read_le(&out), value);
        }

        #[test]
        fn prop_f32_le_roundtrip(value in any::<f32>().prop_filter("finite", |v| v.is_finite())) {
            let mut out = Vec::new();
            value.write_le(&mut out);
            prop_assert_eq!(f32::read_le(&out), value);
        }
    }

    #[test]
    fn widths_follow_encoding() {
        assert_eq!(u8::WIDTH, 1);
        assert_eq!(u16::WIDTH, 2);
        assert_eq!(u32::WIDTH, 4);
        assert_eq!(f32::WIDTH, 4);
        assert_eq!(f64::WIDTH, 8);
    }

    #[test]
    fn value_range_skips_nan() {
        let mut payload = Vec::new();
        for value in [2.5f32, f32::NAN, -1.0, 7.0] {
            value.write_le(&mut payload);
        }
        assert_eq!(value_range::<f32>(&payload), Some((-1.0, 7.0)));
        assert_eq!(value_range::<f32>(&[]), None);
    }

    #[test]
    fn read_le_ignores_trailing_bytes() {
        assert_eq!(u16::read_le(&[0x34, 0x12, 0xff]), 0x1234);
    }

    #[test]
    #[should_panic]
    fn read_le_panics_on_short_input() {
        let _ = u32::read_le(&[1, 2]);
    }
}
