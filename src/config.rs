//! Viewer configuration.
//!
//! Configuration is supplied once at startup, either built in code or loaded
//! from YAML:
//!
//! ```yaml
//! poll_timeout_ms: 50
//! streams:
//!   - tag: acquisition
//!     endpoint: tcp://127.0.0.1:5560
//!     role: connect
//!     stride: 5
//!     color_range: { min: 2300.0, max: 3800.0 }
//!   - tag: reconstruction
//!     endpoint: tcp://*:9999
//!     role: bind
//! ```

use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::render::ColorRange;
use crate::types::StreamTag;
use crate::{Result, ViewerError};

/// Endpoint schemes the transport can open.
pub const SUPPORTED_SCHEMES: [&str; 2] = ["tcp://", "ipc://"];

const DEFAULT_POLL_TIMEOUT_MS: u64 = 50;
const MAX_POLL_TIMEOUT_MS: u64 = 1000;

/// How a stream's socket attaches to its endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionRole {
    /// Dial out to an external publisher.
    Connect,
    /// Listen and let the publisher connect to us.
    Bind,
}

/// Configuration of one stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Logical feed this stream fills.
    pub tag: StreamTag,

    /// Transport address, e.g. `tcp://127.0.0.1:5560`.
    pub endpoint: String,

    pub role: ConnectionRole,

    /// Subscription prefix; empty accepts every message.
    #[serde(default)]
    pub topic: String,

    /// Render one of every `stride` decoded frames.
    #[serde(default = "default_stride")]
    pub stride: NonZeroU32,

    /// Fixed color scale for the stream's surface; `None` lets the display
    /// choose.
    #[serde(default)]
    pub color_range: Option<ColorRange>,

    /// Slice presented for multi-slice frames.
    #[serde(default)]
    pub slice: usize,

    /// Optional display title.
    #[serde(default)]
    pub name: Option<String>,
}

fn default_stride() -> NonZeroU32 {
    NonZeroU32::MIN
}

impl StreamConfig {
    /// Create a stream config with an accept-all topic and stride 1.
    pub fn new(tag: StreamTag, endpoint: impl Into<String>, role: ConnectionRole) -> Self {
        Self {
            tag,
            endpoint: endpoint.into(),
            role,
            topic: String::new(),
            stride: default_stride(),
            color_range: None,
            slice: 0,
            name: None,
        }
    }

    /// Set the decimation stride. A stride of 0 is treated as 1.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = NonZeroU32::new(stride).unwrap_or(NonZeroU32::MIN);
        self
    }

    pub fn with_color_range(mut self, range: ColorRange) -> Self {
        self.color_range = Some(range);
        self
    }

    pub fn with_slice(mut self, slice: usize) -> Self {
        self.slice = slice;
        self
    }

    /// Title shown for this stream: the configured name or the tag.
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(self.tag.as_str())
    }

    /// Validate this stream in isolation.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ViewerError::config_error(format!("{} stream has no endpoint", self.tag)));
        }

        if !SUPPORTED_SCHEMES.iter().any(|scheme| self.endpoint.starts_with(scheme)) {
            return Err(ViewerError::config_error(format!(
                "{} endpoint '{}' must start with one of {:?}",
                self.tag, self.endpoint, SUPPORTED_SCHEMES
            )));
        }

        if let Some(range) = self.color_range {
            range.validate()?;
        }

        Ok(())
    }
}

/// Complete viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Streams in polling order.
    pub streams: Vec<StreamConfig>,

    /// Upper bound on one multiplexer wait, in milliseconds.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
}

fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT_MS
}

impl Default for ViewerConfig {
    /// Acquisition projections every fifth frame, reconstruction every frame.
    fn default() -> Self {
        Self {
            streams: vec![
                StreamConfig::new(
                    StreamTag::Acquisition,
                    "tcp://127.0.0.1:5560",
                    ConnectionRole::Connect,
                )
                .with_stride(5),
                StreamConfig::new(StreamTag::Reconstruction, "tcp://*:9999", ConnectionRole::Bind),
            ],
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: ViewerConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        debug!(streams = config.streams.len(), "Loaded viewer configuration");
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ViewerError::config_file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Check the whole configuration before any transport is opened.
    pub fn validate(&self) -> Result<()> {
        if self.streams.is_empty() {
            return Err(ViewerError::config_error("at least one stream must be configured"));
        }

        if self.poll_timeout_ms == 0 || self.poll_timeout_ms > MAX_POLL_TIMEOUT_MS {
            return Err(ViewerError::config_error(format!(
                "poll_timeout_ms must be within 1..={}, got {}",
                MAX_POLL_TIMEOUT_MS, self.poll_timeout_ms
            )));
        }

        let mut seen = HashSet::new();
        for stream in &self.streams {
            stream.validate()?;
            if !seen.insert(stream.tag) {
                return Err(ViewerError::config_error(format!(
                    "stream tag '{}' is configured more than once",
                    stream.tag
                )));
            }
        }

        Ok(())
    }
}
