//! Core types for frame data representation.
//!
//! - [`Frame`] is one decoded message: shape, element encoding and payload
//! - [`Shape`] describes `(rows, cols)` images and `(slices, rows, cols)` stacks
//! - [`ElementEncoding`] maps the header's encoding tag to an element width
//! - [`Element`] provides typed reads of a payload, checked against its encoding
//! - [`StreamTag`] names the logical feed a stream fills
//!
//! ## Usage Example
//!
//! ```rust
//! use tomoscope::types::{Frame, Shape};
//!
//! let counts: Vec<u16> = vec![2300, 2400, 3700, 3800];
//! let frame = Frame::from_elements(Shape::image(2, 2), &counts).unwrap();
//!
//! assert_eq!(frame.payload().len(), 8);
//! assert_eq!(frame.value_range(), Some((2300.0, 3800.0)));
//! ```

mod element;
mod encoding;
mod frame;
mod shape;
mod stream_tag;

pub use element::Element;
pub use encoding::ElementEncoding;
pub use frame::Frame;
pub use shape::Shape;
pub use stream_tag::StreamTag;
