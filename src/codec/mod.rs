//! Binary frame codec.
//!
//! Every message on either stream is one header followed by the raw element
//! payload (see [`header`] for the byte layout). [`decode`] validates the
//! payload length against the declared shape and never truncates or pads;
//! [`encode`] is its left inverse and is used by tests and in-process
//! producers.
//!
//! ```rust
//! use tomoscope::codec;
//! use tomoscope::types::{Frame, Shape};
//!
//! let frame = Frame::from_elements(Shape::image(2, 2), &[1u16, 2, 3, 4]).unwrap();
//! let wire = codec::encode(&frame);
//! assert_eq!(codec::decode(&wire).unwrap(), frame);
//! ```

pub mod header;

use bytes::Bytes;
use tracing::trace;

pub use header::FrameHeader;

use crate::DecodeError;
use crate::types::Frame;

/// Decode one message into a [`Frame`].
///
/// The returned frame shares `raw`'s buffer.
pub fn decode(raw: &Bytes) -> Result<Frame, DecodeError> {
    let (header, header_len) = FrameHeader::parse(raw)?;

    trace!(
        shape = %header.shape,
        encoding = %header.encoding,
        payload_len = raw.len() - header_len,
        "Parsed frame header"
    );

    Frame::new(header.shape, header.encoding, raw.slice(header_len..))
}

/// Encode a frame into its wire representation.
pub fn encode(frame: &Frame) -> Bytes {
    let header = FrameHeader { shape: frame.shape().clone(), encoding: frame.encoding() };
    let mut out =
        Vec::with_capacity(FrameHeader::encoded_len(frame.shape().rank()) + frame.payload().len());
    header.write(&mut out);
    out.extend_from_slice(frame.payload());
    Bytes::from(out)
}
