//! Stream registry.
//!
//! Holds the immutable [`StreamConfig`] and mutable [`StreamState`] of every
//! configured stream. Streams are registered once at startup and live for the
//! whole process; registration order is the order the event loop drains
//! ready sources in.

use std::fmt;
use std::num::NonZeroU32;

use crate::config::StreamConfig;
use crate::render::RenderHandle;
use crate::stream::Decimator;
use crate::types::StreamTag;
use crate::{Result, ViewerError};

/// Source handle: position of a stream in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(usize);

impl StreamId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Counters kept per stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Messages taken from the transport.
    pub received: u64,
    /// Messages that decoded into a frame (the decimation arrivals).
    pub decoded: u64,
    /// Frames handed to the display.
    pub rendered: u64,
    /// Frames dropped by decimation.
    pub decimated: u64,
    pub decode_errors: u64,
    pub render_errors: u64,
    pub transport_errors: u64,
}

/// Mutable runtime state of one stream.
#[derive(Debug, Clone)]
pub struct StreamState {
    decimator: Decimator,
    surface: Option<RenderHandle>,
    stats: StreamStats,
}

impl StreamState {
    pub fn new(stride: NonZeroU32) -> Self {
        Self { decimator: Decimator::new(stride), surface: None, stats: StreamStats::default() }
    }

    /// Count one decoded frame and decide whether it should be rendered.
    pub fn accept_arrival(&mut self) -> bool {
        self.stats.decoded += 1;
        let accepted = self.decimator.accept();
        if !accepted {
            self.stats.decimated += 1;
        }
        accepted
    }

    /// Handle of the stream's surface, once one exists.
    pub fn render_handle(&self) -> Option<RenderHandle> {
        self.surface
    }

    pub fn attach_surface(&mut self, handle: RenderHandle) {
        self.surface = Some(handle);
    }

    pub fn detach_surface(&mut self) -> Option<RenderHandle> {
        self.surface.take()
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StreamStats {
        &mut self.stats
    }
}

#[derive(Debug)]
struct Entry {
    config: StreamConfig,
    state: StreamState,
}

/// Ordered set of configured streams.
#[derive(Debug, Default)]
pub struct StreamRegistry {
    entries: Vec<Entry>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stream and create its state.
    ///
    /// Each tag may be registered once.
    pub fn register(&mut self, config: StreamConfig) -> Result<StreamId> {
        if self.entries.iter().any(|e| e.config.tag == config.tag) {
            return Err(ViewerError::config_error(format!(
                "stream '{}' is already registered",
                config.tag
            )));
        }

        let id = StreamId(self.entries.len());
        let state = StreamState::new(config.stride);
        self.entries.push(Entry { config, state });
        Ok(id)
    }

    /// All streams in registration order.
    pub fn all(&self) -> impl Iterator<Item = (StreamId, &StreamConfig, &StreamState)> {
        self.entries.iter().enumerate().map(|(i, e)| (StreamId(i), &e.config, &e.state))
    }

    pub fn lookup(&self, id: StreamId) -> Option<&StreamState> {
        self.entries.get(id.0).map(|e| &e.state)
    }

    /// Configuration and mutable state of one stream.
    pub fn lookup_mut(&mut self, id: StreamId) -> Option<(&StreamConfig, &mut StreamState)> {
        self.entries.get_mut(id.0).map(|e| (&e.config, &mut e.state))
    }

    pub fn config(&self, id: StreamId) -> Option<&StreamConfig> {
        self.entries.get(id.0).map(|e| &e.config)
    }

    pub fn find(&self, tag: StreamTag) -> Option<StreamId> {
        self.entries.iter().position(|e| e.config.tag == tag).map(StreamId)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
