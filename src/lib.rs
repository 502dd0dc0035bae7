//! Real-time viewer for tomography acquisition and reconstruction feeds.
//!
//! Tomoscope subscribes to two ZeroMQ publishers, one streaming raw detector
//! projections and one streaming reconstructed slices, decodes each binary
//! frame, thins the feed to a configured rate and hands the result to a
//! display surface that keeps one live image per stream.
//!
//! # Features
//!
//! - **One task**: a single event loop multiplexes every source with a
//!   bounded wait and yields to the display between ticks
//! - **Zero-copy decode**: frame payloads share the received message buffer
//! - **Per-stream decimation**: render the first of every N frames
//! - **Pluggable display**: any toolkit behind [`DisplaySurface`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tomoscope::{HeadlessSurface, Tomoscope, ViewerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> tomoscope::Result<()> {
//!     let config = ViewerConfig::from_file("viewer.yaml")?;
//!     let mut viewer = Tomoscope::connect(&config, HeadlessSurface::new()).await?;
//!
//!     let stop = viewer.stop_token();
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         stop.cancel();
//!     });
//!
//!     viewer.run().await;
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire format and configuration
pub mod codec;
pub mod config;

// Viewer pipeline
pub mod event_loop;
pub mod multiplexer;
pub mod registry;
pub mod render;
pub mod stream;
pub mod transport;

// Core exports
pub use error::*;
pub use types::*;

// Main API exports
pub use config::{ConnectionRole, StreamConfig, ViewerConfig};
pub use event_loop::{EventLoop, ExitReason, LoopState, TickReport};
pub use registry::{StreamId, StreamStats};
pub use render::{ColorRange, DisplaySurface, HeadlessSurface, RenderHandle};
pub use stream::Decimator;

use tracing::info;

/// Entry point for building a connected viewer.
///
/// # Examples
///
/// ```rust,no_run
/// use tomoscope::{HeadlessSurface, Tomoscope, ViewerConfig};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> tomoscope::Result<()> {
/// let viewer = Tomoscope::connect(&ViewerConfig::default(), HeadlessSurface::new()).await?;
/// assert_eq!(viewer.registry().len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct Tomoscope;

impl Tomoscope {
    /// Validate `config`, open every stream's transport and register it with
    /// a new event loop rendering into `display`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - Any endpoint is malformed or cannot be bound
    ///
    /// Connecting streams do not wait for their publisher, so this returns
    /// promptly even when a publisher is down.
    ///
    /// Nothing is left running on error: sockets opened before the failing
    /// one are dropped.
    pub async fn connect<D: DisplaySurface>(
        config: &ViewerConfig,
        display: D,
    ) -> Result<EventLoop<D>> {
        config.validate()?;

        let mut event_loop = EventLoop::new(display, config.poll_timeout());
        for stream in &config.streams {
            let source = transport::open(stream).await?;
            event_loop.add_stream(stream.clone(), source)?;
        }

        info!(streams = config.streams.len(), "Viewer connected");
        Ok(event_loop)
    }
}
