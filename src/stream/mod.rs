//! Stream rate control

mod decimate;

pub use decimate::Decimator;
