//! Error types for the viewer.
//!
//! Every fallible operation in the crate returns [`ViewerError`]. The two
//! per-message failure families have their own enums so the event loop can
//! count and drop them without stopping:
//!
//! - [`DecodeError`]: a received message is not a well-formed frame
//! - [`RenderError`]: the display surface rejected a create or update
//!
//! Only transport failures at startup are fatal; see
//! [`ViewerError::is_recoverable`].
//!
//! ```rust
//! use tomoscope::ViewerError;
//!
//! let error = ViewerError::transport_failed("tcp://127.0.0.1:5560", "connection refused");
//! assert!(!error.is_recoverable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::render::RenderHandle;
use crate::types::{Shape, StreamTag};

/// Result type alias for viewer operations.
pub type Result<T, E = ViewerError> = std::result::Result<T, E>;

/// Main error type for viewer operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ViewerError {
    #[error("Transport error on {endpoint}: {reason}")]
    Transport {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Frame decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration parse error")]
    ConfigParse {
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },
}

impl ViewerError {
    /// Returns whether the event loop can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ViewerError::Transport { .. } => false,
            ViewerError::Decode(_) => true,
            ViewerError::Render(_) => true,
            ViewerError::Config { .. } => false,
            ViewerError::ConfigFile { .. } => false,
            ViewerError::ConfigParse { .. } => false,
            ViewerError::TypeConversion { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            ViewerError::Transport { .. } => vec![
                "Check the endpoint address and port",
                "Ensure no other process is bound to a bind endpoint",
                "Verify the publisher is reachable from this host",
            ],
            ViewerError::Decode(_) => vec![
                "Check that the producer uses the same frame wire format",
                "Verify the element encoding tag sent by the producer",
            ],
            ViewerError::Render(_) => vec![
                "The surface is recreated on the next accepted frame",
                "Check the configured slice index for multi-slice streams",
            ],
            ViewerError::Config { .. } | ViewerError::ConfigParse { .. } => vec![
                "Check the configuration against the documented fields",
                "Give every stream a distinct tag",
            ],
            ViewerError::ConfigFile { .. } => {
                vec!["Check the configuration file exists and is readable"]
            }
            ViewerError::TypeConversion { .. } => {
                vec!["Read frame elements with the type matching their encoding"]
            }
        }
    }

    /// Helper constructor for transport errors.
    pub fn transport_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        ViewerError::Transport { endpoint: endpoint.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with source.
    pub fn transport_failed_with_source(
        endpoint: impl Into<String>,
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        ViewerError::Transport {
            endpoint: endpoint.into(),
            reason: reason.into(),
            source: Some(source),
        }
    }

    /// Helper constructor for configuration errors.
    pub fn config_error(reason: impl Into<String>) -> Self {
        ViewerError::Config { reason: reason.into() }
    }

    /// Helper constructor for configuration file errors.
    pub fn config_file_error(path: PathBuf, source: std::io::Error) -> Self {
        ViewerError::ConfigFile { path, source }
    }
}

impl From<serde_yaml_ng::Error> for ViewerError {
    fn from(source: serde_yaml_ng::Error) -> Self {
        ViewerError::ConfigParse { source }
    }
}

/// Failure to turn a received message into a [`Frame`](crate::Frame).
///
/// Always recoverable: the message is dropped and its stream continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("truncated header: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("payload size mismatch: shape requires {expected} bytes, payload has {actual}")]
    SizeMismatch { expected: u128, actual: usize },

    #[error("unsupported element encoding tag {tag:#04x}")]
    UnsupportedEncoding { tag: u8 },

    #[error("unsupported shape rank {rank} (expected 2 or 3)")]
    InvalidRank { rank: usize },
}

/// Rejection of a surface create or update by the display.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RenderError {
    #[error("surface shape {expected} cannot show a frame of shape {actual}")]
    ShapeChanged { expected: Shape, actual: Shape },

    #[error("display has no surface for {0:?}")]
    UnknownHandle(RenderHandle),

    #[error("slice {index} out of range for {stream} frame with {slices} slices")]
    SliceOutOfRange { stream: StreamTag, index: usize, slices: usize },

    #[error("display rejected frame: {reason}")]
    Rejected { reason: String },
}
