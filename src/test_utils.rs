//! Test utilities: frame builders and a recording display surface.
//!
//! Compiled for unit tests and for the `benchmark` feature so benches can
//! build realistic frames the same way tests do.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::HashMap;

use bytes::Bytes;

use crate::RenderError;
use crate::codec;
use crate::render::{ColorRange, DisplaySurface, RenderHandle};
use crate::types::{Frame, Shape};

/// A `rows × cols` `uint16` frame with every element set to `fill`.
pub fn u16_frame(rows: u32, cols: u32, fill: u16) -> Frame {
    let values = vec![fill; rows as usize * cols as usize];
    Frame::from_elements(Shape::image(rows, cols), &values)
        .unwrap_or_else(|e| panic!("test frame {rows}x{cols} rejected: {e}"))
}

/// Wire encoding of [`u16_frame`].
pub fn encoded_u16(rows: u32, cols: u32, fill: u16) -> Bytes {
    codec::encode(&u16_frame(rows, cols, fill))
}

/// A detector-sized projection with a horizontal intensity ramp.
pub fn projection_frame(rows: u32, cols: u32) -> Frame {
    let values: Vec<u16> =
        (0..rows).flat_map(|_| (0..cols).map(|c| 2300 + (c % 1500) as u16)).collect();
    Frame::from_elements(Shape::image(rows, cols), &values)
        .unwrap_or_else(|e| panic!("projection {rows}x{cols} rejected: {e}"))
}

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Create {
        handle: RenderHandle,
        title: String,
        shape: Shape,
        color_range: Option<ColorRange>,
        payload: Vec<u8>,
    },
    Update {
        handle: RenderHandle,
        payload: Vec<u8>,
    },
    Release {
        handle: RenderHandle,
    },
    Repaint,
    ProcessEvents,
}

/// Display double that records every call in order.
///
/// Updates are checked like a real toolkit would: unknown handles and shape
/// changes are rejected.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
    shapes: HashMap<RenderHandle, Shape>,
    next_id: u64,
}

impl RecordingSurface {
    /// Every call, in order.
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Create, update and release calls only.
    pub fn surface_calls(&self) -> Vec<SurfaceCall> {
        self.calls
            .iter()
            .filter(|call| !matches!(call, SurfaceCall::Repaint | SurfaceCall::ProcessEvents))
            .cloned()
            .collect()
    }

    pub fn creates(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, SurfaceCall::Create { .. })).count()
    }

    pub fn updates(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, SurfaceCall::Update { .. })).count()
    }

    pub fn repaints(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, SurfaceCall::Repaint)).count()
    }
}

impl DisplaySurface for RecordingSurface {
    fn create_surface(
        &mut self,
        title: &str,
        frame: &Frame,
        color_range: Option<ColorRange>,
    ) -> Result<RenderHandle, RenderError> {
        self.next_id += 1;
        let handle = RenderHandle::new(self.next_id);
        self.shapes.insert(handle, frame.shape().clone());
        self.calls.push(SurfaceCall::Create {
            handle,
            title: title.to_string(),
            shape: frame.shape().clone(),
            color_range,
            payload: frame.payload().to_vec(),
        });
        Ok(handle)
    }

    fn update_surface(&mut self, handle: RenderHandle, frame: &Frame) -> Result<(), RenderError> {
        let shape = self.shapes.get(&handle).ok_or(RenderError::UnknownHandle(handle))?;
        if shape != frame.shape() {
            return Err(RenderError::ShapeChanged {
                expected: shape.clone(),
                actual: frame.shape().clone(),
            });
        }
        self.calls.push(SurfaceCall::Update { handle, payload: frame.payload().to_vec() });
        Ok(())
    }

    fn request_repaint(&mut self) {
        self.calls.push(SurfaceCall::Repaint);
    }

    fn process_events(&mut self) {
        self.calls.push(SurfaceCall::ProcessEvents);
    }

    fn release_surface(&mut self, handle: RenderHandle) {
        self.shapes.remove(&handle);
        self.calls.push(SurfaceCall::Release { handle });
    }
}
