//! Decoded image frames

use bytes::Bytes;

use super::element::{self, Element};
use super::{ElementEncoding, Shape};
use crate::{DecodeError, Result, ViewerError};

/// One decoded image-shaped message.
///
/// The payload length always equals `shape.element_count() × encoding.width()`;
/// constructors reject anything else. Payload bytes are shared, so cloning a
/// frame or taking one of its slices does not copy pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    shape: Shape,
    encoding: ElementEncoding,
    payload: Bytes,
}

impl Frame {
    /// Create a frame, validating the payload length against the shape.
    pub fn new(
        shape: Shape,
        encoding: ElementEncoding,
        payload: impl Into<Bytes>,
    ) -> Result<Self, DecodeError> {
        let payload = payload.into();
        let expected = shape.byte_len(encoding.width()).unwrap_or(u128::MAX);
        if expected != payload.len() as u128 {
            return Err(DecodeError::SizeMismatch { expected, actual: payload.len() });
        }
        Ok(Self { shape, encoding, payload })
    }

    /// Create a frame from typed elements.
    pub fn from_elements<T: Element>(shape: Shape, values: &[T]) -> Result<Self, DecodeError> {
        let mut payload = Vec::with_capacity(values.len() * T::WIDTH);
        for &value in values {
            value.write_le(&mut payload);
        }
        Self::new(shape, T::ENCODING, payload)
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn encoding(&self) -> ElementEncoding {
        self.encoding
    }

    /// Raw little-endian element bytes.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Read every element as `T`.
    ///
    /// Fails with [`ViewerError::TypeConversion`] if `T` does not match the
    /// frame's encoding.
    pub fn elements<T: Element>(&self) -> Result<Vec<T>> {
        if T::ENCODING != self.encoding {
            return Err(ViewerError::TypeConversion {
                details: format!("Expected {}, frame holds {}", T::ENCODING, self.encoding),
            });
        }
        Ok(self.payload.chunks_exact(T::WIDTH).map(T::read_le).collect())
    }

    /// Minimum and maximum element value, ignoring NaN.
    ///
    /// Returns `None` for empty frames or frames holding only NaN.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let payload = self.payload.as_ref();
        match self.encoding {
            ElementEncoding::UInt8 => element::value_range::<u8>(payload),
            ElementEncoding::UInt16 => element::value_range::<u16>(payload),
            ElementEncoding::UInt32 => element::value_range::<u32>(payload),
            ElementEncoding::Float32 => element::value_range::<f32>(payload),
            ElementEncoding::Float64 => element::value_range::<f64>(payload),
        }
    }

    /// Extract slice `index` of a stacked frame as a single image.
    ///
    /// Returns `None` for single-image frames or an out-of-range index.
    pub fn slice(&self, index: usize) -> Option<Frame> {
        let slices = self.shape.slices()? as usize;
        if index >= slices {
            return None;
        }
        let plane = self.shape.plane();
        let plane_len = self.payload.len() / slices;
        let start = index * plane_len;
        Some(Frame {
            shape: plane,
            encoding: self.encoding,
            payload: self.payload.slice(start..start + plane_len),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_payload() {
        let result = Frame::new(Shape::image(10, 10), ElementEncoding::UInt16, vec![0u8; 8]);
        assert_eq!(result, Err(DecodeError::SizeMismatch { expected: 200, actual: 8 }));
    }

    #[test]
    fn rejects_padded_payload() {
        let result = Frame::new(Shape::image(2, 2), ElementEncoding::UInt8, vec![0u8; 5]);
        assert!(matches!(result, Err(DecodeError::SizeMismatch { expected: 4, actual: 5 })));
    }

    #[test]
    fn typed_elements_roundtrip() {
        let values: Vec<u16> = (0..12).map(|v| v * 300).collect();
        let frame = Frame::from_elements(Shape::image(3, 4), &values).unwrap();

        assert_eq!(frame.encoding(), ElementEncoding::UInt16);
        assert_eq!(frame.payload().len(), 24);
        assert_eq!(frame.elements::<u16>().unwrap(), values);
        assert_eq!(frame.value_range(), Some((0.0, 3300.0)));
    }

    #[test]
    fn elements_with_wrong_type_fail() {
        let frame = Frame::from_elements(Shape::image(1, 2), &[1.0f32, 2.0]).unwrap();
        let err = frame.elements::<u16>().unwrap_err();
        assert!(matches!(err, ViewerError::TypeConversion { .. }));
    }

    #[test]
    fn slice_extracts_single_plane() {
        let values: Vec<f32> = (0..18).map(|v| v as f32).collect();
        let frame = Frame::from_elements(Shape::stack(3, 2, 3), &values).unwrap();

        let middle = frame.slice(1).unwrap();
        assert_eq!(middle.shape(), &Shape::image(2, 3));
        assert_eq!(middle.elements::<f32>().unwrap(), vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);

        assert!(frame.slice(3).is_none());
    }

    #[test]
    fn slice_of_image_is_none() {
        let frame = Frame::from_elements(Shape::image(1, 1), &[7u8]).unwrap();
        assert!(frame.slice(0).is_none());
    }

    #[test]
    fn empty_frame_has_no_range() {
        let frame = Frame::new(Shape::image(0, 16), ElementEncoding::Float64, Vec::new()).unwrap();
        assert_eq!(frame.value_range(), None);
    }
}
