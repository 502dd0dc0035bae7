//! Render sink: the boundary to the external display surface.
//!
//! The display toolkit is a collaborator behind the [`DisplaySurface`] trait.
//! It owns every display element; the viewer only keeps a [`RenderHandle`]
//! per stream so that, after the first accepted frame creates a surface,
//! later frames replace its contents in place.
//!
//! [`RenderSink::present`] never waits for pixels to reach the screen: it
//! issues the create or update, then asks for a repaint. The display does the
//! actual drawing when the event loop yields to it through
//! [`RenderSink::yield_to_display`].

pub mod headless;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::StreamConfig;
use crate::registry::StreamState;
use crate::types::Frame;
use crate::{RenderError, Result, ViewerError};

pub use headless::HeadlessSurface;

/// Identity of a display element owned by the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(u64);

impl RenderHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Fixed color scale for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorRange {
    pub min: f64,
    pub max: f64,
}

impl ColorRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both bounds finite and `min < max`.
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min >= self.max {
            return Err(ViewerError::config_error(format!(
                "color range [{}, {}] must be finite with min < max",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Map `value` onto `0.0..=1.0`, clamping outside the range.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Contract the viewer needs from a display toolkit.
///
/// None of these calls may block on screen refresh.
pub trait DisplaySurface {
    /// Create a display element sized to `frame` and showing it.
    fn create_surface(
        &mut self,
        title: &str,
        frame: &Frame,
        color_range: Option<ColorRange>,
    ) -> Result<RenderHandle, RenderError>;

    /// Replace the contents of an existing element.
    fn update_surface(&mut self, handle: RenderHandle, frame: &Frame) -> Result<(), RenderError>;

    /// Mark the display as needing a redraw.
    fn request_repaint(&mut self);

    /// Run the display's own pending event processing (redraw, resize, input).
    fn process_events(&mut self);

    /// Retire an element the viewer will no longer update.
    fn release_surface(&mut self, _handle: RenderHandle) {}
}

/// What [`RenderSink::present`] did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented {
    Created(RenderHandle),
    Updated(RenderHandle),
}

/// Adapter from accepted frames to a [`DisplaySurface`].
pub struct RenderSink<D> {
    display: D,
}

impl<D: DisplaySurface> RenderSink<D> {
    pub fn new(display: D) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn into_display(self) -> D {
        self.display
    }

    /// Show `frame` on the stream's surface, creating it on first use.
    ///
    /// On error the stream's handle is released so the next accepted frame
    /// creates a fresh surface.
    pub fn present(
        &mut self,
        config: &StreamConfig,
        state: &mut StreamState,
        frame: &Frame,
    ) -> Result<Presented, RenderError> {
        match self.try_present(config, state, frame) {
            Ok(presented) => {
                self.display.request_repaint();
                Ok(presented)
            }
            Err(e) => {
                if let Some(handle) = state.detach_surface() {
                    debug!(stream = %config.tag, handle = handle.id(), "Releasing surface after render error");
                    self.display.release_surface(handle);
                }
                Err(e)
            }
        }
    }

    /// Give the display a chance to process its own events.
    pub fn yield_to_display(&mut self) {
        self.display.process_events();
    }

    fn try_present(
        &mut self,
        config: &StreamConfig,
        state: &mut StreamState,
        frame: &Frame,
    ) -> Result<Presented, RenderError> {
        let view = select_view(config, frame)?;

        match state.render_handle() {
            Some(handle) => {
                self.display.update_surface(handle, &view)?;
                trace!(stream = %config.tag, handle = handle.id(), "Updated surface");
                Ok(Presented::Updated(handle))
            }
            None => {
                let handle =
                    self.display.create_surface(config.title(), &view, config.color_range)?;
                state.attach_surface(handle);
                debug!(
                    stream = %config.tag,
                    handle = handle.id(),
                    shape = %view.shape(),
                    "Created surface"
                );
                Ok(Presented::Created(handle))
            }
        }
    }
}

/// The single image of `frame` this stream displays.
fn select_view(config: &StreamConfig, frame: &Frame) -> Result<Frame, RenderError> {
    match frame.shape().slices() {
        None => Ok(frame.clone()),
        Some(slices) => frame.slice(config.slice).ok_or(RenderError::SliceOutOfRange {
            stream: config.tag,
            index: config.slice,
            slices: slices as usize,
        }),
    }
}
