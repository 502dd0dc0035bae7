//! Logical role of a configured stream

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which of the two logical feeds a stream fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamTag {
    /// Raw projections from the detector
    Acquisition,
    /// Slices produced by the reconstruction process
    Reconstruction,
}

impl StreamTag {
    pub fn as_str(self) -> &'static str {
        match self {
            StreamTag::Acquisition => "acquisition",
            StreamTag::Reconstruction => "reconstruction",
        }
    }
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
