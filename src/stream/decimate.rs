//! Per-stream decimation

use std::num::NonZeroU32;

/// Count-based decimation filter.
///
/// Accepts the first arrival and every `stride`-th arrival after it, so with
/// a stride of 3 arrivals 1, 4, 7, … are accepted. Intermediate frames are
/// dropped rather than queued: the most recent accepted frame is the one on
/// screen until the next window closes.
///
/// Only the phase within the current window is kept, so the filter never
/// overflows however long a stream runs.
#[derive(Debug, Clone)]
pub struct Decimator {
    stride: NonZeroU32,
    phase: u32,
}

impl Decimator {
    /// Create a filter rendering one of every `stride` arrivals.
    pub fn new(stride: NonZeroU32) -> Self {
        Self { stride, phase: 0 }
    }

    /// Register one arrival and decide whether it is forwarded.
    pub fn accept(&mut self) -> bool {
        let accepted = self.phase == 0;
        self.phase = (self.phase + 1) % self.stride.get();
        accepted
    }

    pub fn stride(&self) -> NonZeroU32 {
        self.stride
    }
}

impl Default for Decimator {
    fn default() -> Self {
        Self::new(NonZeroU32::MIN)
    }
}
