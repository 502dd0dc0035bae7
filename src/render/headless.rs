//! Display surface without a window.
//!
//! Keeps the bookkeeping a real toolkit would (one record per surface, shape
//! checks on update, coalesced repaints) and reports what would be drawn
//! through `tracing`. Useful for running the viewer on a machine without a
//! display and for watching stream health from the logs.

use std::collections::HashMap;

use tracing::{debug, info};

use super::{ColorRange, DisplaySurface, RenderHandle};
use crate::RenderError;
use crate::types::{Frame, Shape};

/// State of one headless surface.
#[derive(Debug, Clone)]
pub struct SurfaceRecord {
    pub title: String,
    pub shape: Shape,
    pub color_range: Option<ColorRange>,
    /// Frames shown, including the one the surface was created with.
    pub frames: u64,
    /// Value range of the most recent frame.
    pub last_range: Option<(f64, f64)>,
}

/// [`DisplaySurface`] that logs instead of drawing.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    surfaces: HashMap<RenderHandle, SurfaceRecord>,
    next_id: u64,
    repaint_pending: bool,
    repaints: u64,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn surface(&self, handle: RenderHandle) -> Option<&SurfaceRecord> {
        self.surfaces.get(&handle)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Number of coalesced repaints performed so far.
    pub fn repaints(&self) -> u64 {
        self.repaints
    }
}

impl DisplaySurface for HeadlessSurface {
    fn create_surface(
        &mut self,
        title: &str,
        frame: &Frame,
        color_range: Option<ColorRange>,
    ) -> Result<RenderHandle, RenderError> {
        if frame.shape().slices().is_some() {
            return Err(RenderError::Rejected {
                reason: format!("surface must be two-dimensional, got {}", frame.shape()),
            });
        }

        self.next_id += 1;
        let handle = RenderHandle::new(self.next_id);

        info!(
            title,
            handle = handle.id(),
            shape = %frame.shape(),
            encoding = %frame.encoding(),
            "Headless surface created"
        );

        self.surfaces.insert(
            handle,
            SurfaceRecord {
                title: title.to_string(),
                shape: frame.shape().clone(),
                color_range,
                frames: 1,
                last_range: frame.value_range(),
            },
        );
        Ok(handle)
    }

    fn update_surface(&mut self, handle: RenderHandle, frame: &Frame) -> Result<(), RenderError> {
        let record = self.surfaces.get_mut(&handle).ok_or(RenderError::UnknownHandle(handle))?;

        if record.shape != *frame.shape() {
            return Err(RenderError::ShapeChanged {
                expected: record.shape.clone(),
                actual: frame.shape().clone(),
            });
        }

        record.frames += 1;
        record.last_range = frame.value_range();
        Ok(())
    }

    fn request_repaint(&mut self) {
        self.repaint_pending = true;
    }

    fn process_events(&mut self) {
        if !self.repaint_pending {
            return;
        }
        self.repaint_pending = false;
        self.repaints += 1;

        for record in self.surfaces.values() {
            let Some((lo, hi)) = record.last_range else {
                continue;
            };
            match record.color_range {
                Some(range) => debug!(
                    title = %record.title,
                    frames = record.frames,
                    min = lo,
                    max = hi,
                    scaled_min = range.normalize(lo),
                    scaled_max = range.normalize(hi),
                    "Repaint"
                ),
                None => debug!(
                    title = %record.title,
                    frames = record.frames,
                    min = lo,
                    max = hi,
                    "Repaint"
                ),
            }
        }
    }

    fn release_surface(&mut self, handle: RenderHandle) {
        if let Some(record) = self.surfaces.remove(&handle) {
            debug!(title = %record.title, handle = handle.id(), "Headless surface released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::u16_frame;

    #[test]
    fn tracks_frames_per_surface() {
        let mut display = HeadlessSurface::new();
        let handle = display.create_surface("proj", &u16_frame(4, 4, 10), None).unwrap();
        display.update_surface(handle, &u16_frame(4, 4, 20)).unwrap();

        let record = display.surface(handle).unwrap();
        assert_eq!(record.frames, 2);
        assert_eq!(record.last_range, Some((20.0, 20.0)));
        assert_eq!(record.title, "proj");
    }

    #[test]
    fn rejects_shape_change_and_unknown_handle() {
        let mut display = HeadlessSurface::new();
        let handle = display.create_surface("proj", &u16_frame(4, 4, 0), None).unwrap();

        let err = display.update_surface(handle, &u16_frame(2, 2, 0)).unwrap_err();
        assert!(matches!(err, RenderError::ShapeChanged { .. }));

        let unknown = RenderHandle::new(99);
        assert_eq!(
            display.update_surface(unknown, &u16_frame(4, 4, 0)),
            Err(RenderError::UnknownHandle(unknown))
        );
    }

    #[test]
    fn repaints_coalesce_until_events_processed() {
        let mut display = HeadlessSurface::new();
        display.request_repaint();
        display.request_repaint();
        display.process_events();
        display.process_events();
        assert_eq!(display.repaints(), 1);
    }

    #[test]
    fn release_forgets_surface() {
        let mut display = HeadlessSurface::new();
        let handle = display.create_surface("recon", &u16_frame(1, 1, 0), None).unwrap();
        display.release_surface(handle);
        assert_eq!(display.surface_count(), 0);
    }
}
