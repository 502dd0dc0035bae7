//! Readiness multiplexing over message sources.
//!
//! Each source is a stream of raw messages. [`Multiplexer::poll`] waits on
//! all of them at once, from a single task, and reports which ones have a
//! message available. Readiness is backed by a one-message look-ahead per
//! source, so [`Multiplexer::take`] never waits: the message a ready source
//! reported is already in hand.
//!
//! ```rust
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use std::time::Duration;
//! use bytes::Bytes;
//! use tomoscope::multiplexer::{Multiplexer, channel_source};
//! use tomoscope::registry::StreamRegistry;
//! use tomoscope::config::{ConnectionRole, StreamConfig};
//! use tomoscope::types::StreamTag;
//!
//! let mut registry = StreamRegistry::new();
//! let id = registry
//!     .register(StreamConfig::new(StreamTag::Acquisition, "tcp://127.0.0.1:5560", ConnectionRole::Connect))
//!     .unwrap();
//!
//! let (tx, source) = channel_source(8);
//! let mut mux = Multiplexer::new();
//! mux.add(id, source);
//!
//! assert!(mux.poll(Duration::from_millis(5)).await.is_empty());
//!
//! tx.send(Bytes::from_static(b"frame")).await.unwrap();
//! assert_eq!(mux.poll(Duration::from_millis(5)).await, vec![id]);
//! assert!(mux.take(id).is_some());
//! # }
//! ```

use std::future::poll_fn;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, trace};

use crate::Result;
use crate::registry::StreamId;

/// A source of raw messages.
///
/// Yields `Err` for receive failures that do not end the source; ends when
/// the source is gone for good.
pub type MessageStream = BoxStream<'static, Result<Bytes>>;

/// In-process source fed through a bounded channel.
///
/// The source ends once every sender is dropped.
pub fn channel_source(capacity: usize) -> (mpsc::Sender<Bytes>, MessageStream) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, ReceiverStream::new(rx).map(Ok).boxed())
}

struct Slot {
    id: StreamId,
    stream: MessageStream,
    pending: Option<Result<Bytes>>,
    closed: bool,
}

/// Waits on many sources from one task.
#[derive(Default)]
pub struct Multiplexer {
    slots: Vec<Slot>,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source. Sources are reported in the order they were added.
    pub fn add(&mut self, id: StreamId, stream: MessageStream) {
        debug!(stream = %id, "Source added to multiplexer");
        self.slots.push(Slot { id, stream, pending: None, closed: false });
    }

    /// Wait up to `timeout` for at least one source to become ready.
    ///
    /// Returns the ready sources in insertion order; empty if none became
    /// ready in time. Sources that are already ready are reported without
    /// waiting.
    pub async fn poll(&mut self, timeout: Duration) -> Vec<StreamId> {
        let wait = poll_fn(|cx| self.poll_ready(cx));
        match tokio::time::timeout(timeout, wait).await {
            Ok(ready) => ready,
            Err(_) => {
                trace!(?timeout, "No source ready within poll window");
                Vec::new()
            }
        }
    }

    /// Take the message a ready source reported.
    ///
    /// Returns `None` if the source is unknown or not ready.
    pub fn take(&mut self, id: StreamId) -> Option<Result<Bytes>> {
        self.slots.iter_mut().find(|slot| slot.id == id)?.pending.take()
    }

    pub fn is_closed(&self, id: StreamId) -> bool {
        self.slots.iter().any(|slot| slot.id == id && slot.closed)
    }

    /// Every source has ended and nothing is left to take.
    pub fn is_exhausted(&self) -> bool {
        self.slots.iter().all(|slot| slot.closed && slot.pending.is_none())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Vec<StreamId>> {
        for slot in &mut self.slots {
            if slot.closed || slot.pending.is_some() {
                continue;
            }
            match slot.stream.poll_next_unpin(cx) {
                Poll::Ready(Some(item)) => slot.pending = Some(item),
                Poll::Ready(None) => {
                    info!(stream = %slot.id, "Source ended");
                    slot.closed = true;
                }
                Poll::Pending => {}
            }
        }

        let ready: Vec<StreamId> =
            self.slots.iter().filter(|slot| slot.pending.is_some()).map(|slot| slot.id).collect();

        if !ready.is_empty() || self.is_exhausted() {
            Poll::Ready(ready)
        } else {
            Poll::Pending
        }
    }
}
