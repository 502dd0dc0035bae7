//! Transport endpoints for configured streams.
//!
//! Opening a stream's transport happens once, at startup. A malformed endpoint
//! or a failed bind there is fatal. An absent publisher is not: connecting
//! streams dial from inside their source. After that a source only ever
//! yields messages or per-message transport errors, and ends if its socket is
//! unusable.

pub mod zmq;

use tracing::error;

use crate::Result;
use crate::config::StreamConfig;
use crate::multiplexer::MessageStream;

/// Open the transport for one stream.
pub async fn open(config: &StreamConfig) -> Result<MessageStream> {
    zmq::open_subscriber(config).await.inspect_err(|e| {
        error!(stream = %config.tag, endpoint = %config.endpoint, "Failed to open stream: {}", e);
    })
}
