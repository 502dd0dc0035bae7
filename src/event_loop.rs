//! The viewer's event loop.
//!
//! One task owns everything: it polls the multiplexer, drains every ready
//! source once in registration order, decodes, decimates and renders, then
//! yields to the display so it can repaint. The bounded poll wait is the only
//! place the loop suspends.
//!
//! ```text
//!            poll (≤ timeout)            one message per ready source
//!   Idle ─────────────────────▶ Draining ─────────────────────────────┐
//!    ▲                                                                 │
//!    └──────────────── yield to display ◀──────────────────────────────┘
//!
//!   stop token cancelled / every source ended  ──▶  Stopped
//! ```
//!
//! Malformed messages, render rejections and receive errors are counted per
//! stream and logged; none of them end the loop.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::Result;
use crate::codec;
use crate::config::StreamConfig;
use crate::multiplexer::{MessageStream, Multiplexer};
use crate::registry::{StreamId, StreamRegistry, StreamStats};
use crate::render::{DisplaySurface, RenderSink};
use crate::types::StreamTag;

/// Where the loop is in its tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for any source to become ready.
    Idle,
    /// Processing the ready set of one poll.
    Draining,
    /// Terminal; [`EventLoop::run`] has returned.
    Stopped,
}

/// Why [`EventLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The stop token was cancelled.
    StopRequested,
    /// Every source ended.
    SourcesEnded,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ready: usize,
    pub rendered: usize,
    pub decimated: usize,
    pub decode_errors: usize,
    pub render_errors: usize,
    pub transport_errors: usize,
}

/// Single-task loop driving every stream into one display.
pub struct EventLoop<D> {
    registry: StreamRegistry,
    mux: Multiplexer,
    sink: RenderSink<D>,
    poll_timeout: Duration,
    state: LoopState,
    cancel: CancellationToken,
    ticks: u64,
}

impl<D: DisplaySurface> EventLoop<D> {
    /// Create a loop with no streams.
    pub fn new(display: D, poll_timeout: Duration) -> Self {
        Self {
            registry: StreamRegistry::new(),
            mux: Multiplexer::new(),
            sink: RenderSink::new(display),
            poll_timeout,
            state: LoopState::Idle,
            cancel: CancellationToken::new(),
            ticks: 0,
        }
    }

    /// Register a stream together with its message source.
    pub fn add_stream(&mut self, config: StreamConfig, source: MessageStream) -> Result<StreamId> {
        let tag = config.tag;
        let stride = config.stride;
        let id = self.registry.register(config)?;
        self.mux.add(id, source);
        info!(stream = %tag, id = %id, stride = stride.get(), "Stream registered");
        Ok(id)
    }

    /// Token that stops [`run`](Self::run) at the next tick boundary.
    pub fn stop_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// Counters of the stream with `tag`.
    pub fn stats(&self, tag: StreamTag) -> Option<StreamStats> {
        let id = self.registry.find(tag)?;
        self.registry.lookup(id).map(|state| *state.stats())
    }

    pub fn display(&self) -> &D {
        self.sink.display()
    }

    pub fn display_mut(&mut self) -> &mut D {
        self.sink.display_mut()
    }

    pub fn into_display(self) -> D {
        self.sink.into_display()
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one poll → drain → yield cycle.
    pub async fn tick(&mut self) -> TickReport {
        let ready = self.mux.poll(self.poll_timeout).await;
        let mut report = TickReport { ready: ready.len(), ..TickReport::default() };

        if !ready.is_empty() {
            self.state = LoopState::Draining;
            for id in ready {
                self.drain(id, &mut report);
            }
        }

        self.sink.yield_to_display();
        self.state = LoopState::Idle;
        self.ticks += 1;
        report
    }

    /// Tick until stopped or until every source has ended.
    pub async fn run(&mut self) -> ExitReason {
        info!(streams = self.registry.len(), poll_timeout = ?self.poll_timeout, "Event loop started");

        let reason = loop {
            if self.cancel.is_cancelled() {
                info!("Stop requested");
                break ExitReason::StopRequested;
            }
            if self.mux.is_exhausted() {
                info!("All sources ended");
                break ExitReason::SourcesEnded;
            }
            self.tick().await;
        };

        self.state = LoopState::Stopped;
        for (id, config, state) in self.registry.all() {
            let stats = state.stats();
            info!(
                stream = %config.tag,
                id = %id,
                received = stats.received,
                rendered = stats.rendered,
                decimated = stats.decimated,
                decode_errors = stats.decode_errors,
                render_errors = stats.render_errors,
                transport_errors = stats.transport_errors,
                "Stream summary"
            );
        }
        info!("Event loop ended after {} ticks", self.ticks);
        reason
    }

    /// Take, decode, decimate and render one message of a ready source.
    fn drain(&mut self, id: StreamId, report: &mut TickReport) {
        let Some(message) = self.mux.take(id) else {
            return;
        };
        let Some((config, state)) = self.registry.lookup_mut(id) else {
            warn!(id = %id, "Message from unregistered source dropped");
            return;
        };

        let raw = match message {
            Ok(raw) => raw,
            Err(e) => {
                state.stats_mut().transport_errors += 1;
                report.transport_errors += 1;
                warn!(stream = %config.tag, "Receive failed: {}", e);
                return;
            }
        };
        state.stats_mut().received += 1;

        let frame = match codec::decode(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                state.stats_mut().decode_errors += 1;
                report.decode_errors += 1;
                warn!(stream = %config.tag, bytes = raw.len(), "Dropping malformed frame: {}", e);
                return;
            }
        };

        if !state.accept_arrival() {
            report.decimated += 1;
            trace!(stream = %config.tag, arrival = state.stats().decoded, "Frame decimated");
            return;
        }

        match self.sink.present(config, state, &frame) {
            Ok(presented) => {
                state.stats_mut().rendered += 1;
                report.rendered += 1;
                trace!(stream = %config.tag, ?presented, shape = %frame.shape(), "Frame rendered");
            }
            Err(e) => {
                state.stats_mut().render_errors += 1;
                report.render_errors += 1;
                warn!(stream = %config.tag, "Render failed, surface will be recreated: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionRole;
    use crate::multiplexer::channel_source;
    use crate::test_utils::{RecordingSurface, SurfaceCall, encoded_u16, u16_frame};
    use crate::types::Shape;
    use bytes::Bytes;

    const POLL: Duration = Duration::from_millis(20);

    fn acquisition(stride: u32) -> StreamConfig {
        StreamConfig::new(StreamTag::Acquisition, "tcp://127.0.0.1:5560", ConnectionRole::Connect)
            .with_stride(stride)
    }

    fn reconstruction() -> StreamConfig {
        StreamConfig::new(StreamTag::Reconstruction, "tcp://*:9999", ConnectionRole::Bind)
    }

    #[tokio::test]
    async fn three_frames_create_once_then_update_in_order() {
        let _ = tracing_subscriber::fmt::try_init();

        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (tx, source) = channel_source(8);
        event_loop.add_stream(acquisition(1), source).unwrap();

        for fill in 1..=3 {
            tx.send(encoded_u16(4, 4, fill)).await.unwrap();
        }
        for _ in 0..3 {
            let report = event_loop.tick().await;
            assert_eq!(report.rendered, 1);
        }

        let display = event_loop.display();
        let calls = display.surface_calls();
        assert_eq!(calls.len(), 3);

        let SurfaceCall::Create { handle, shape, payload, .. } = &calls[0] else {
            panic!("first call must create the surface, got {:?}", calls[0]);
        };
        assert_eq!(shape, &Shape::image(4, 4));
        assert_eq!(payload, &u16_frame(4, 4, 1).payload().to_vec());
        assert_eq!(
            calls[1],
            SurfaceCall::Update { handle: *handle, payload: u16_frame(4, 4, 2).payload().to_vec() }
        );
        assert_eq!(
            calls[2],
            SurfaceCall::Update { handle: *handle, payload: u16_frame(4, 4, 3).payload().to_vec() }
        );
    }

    #[tokio::test]
    async fn malformed_frame_on_one_stream_does_not_block_the_other() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (tx_a, source_a) = channel_source(4);
        let (tx_b, source_b) = channel_source(4);
        event_loop.add_stream(acquisition(1), source_a).unwrap();
        event_loop.add_stream(reconstruction(), source_b).unwrap();

        tx_a.send(Bytes::from_static(&[2, 10, 0])).await.unwrap();
        tx_b.send(encoded_u16(2, 2, 9)).await.unwrap();

        let report = event_loop.tick().await;
        assert_eq!(report.ready, 2);
        assert_eq!(report.decode_errors, 1);
        assert_eq!(report.rendered, 1);

        let a = event_loop.stats(StreamTag::Acquisition).unwrap();
        let b = event_loop.stats(StreamTag::Reconstruction).unwrap();
        assert_eq!((a.decode_errors, a.rendered), (1, 0));
        assert_eq!((b.decode_errors, b.rendered), (0, 1));
        assert_eq!(event_loop.display().creates(), 1);
        assert_eq!(event_loop.state(), LoopState::Idle);
    }

    #[tokio::test]
    async fn decimation_renders_first_and_every_nth() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (tx, source) = channel_source(16);
        event_loop.add_stream(acquisition(3), source).unwrap();

        for fill in 1..=9 {
            tx.send(encoded_u16(2, 2, fill)).await.unwrap();
        }
        let mut rendered = Vec::new();
        for arrival in 1..=9 {
            if event_loop.tick().await.rendered == 1 {
                rendered.push(arrival);
            }
        }

        assert_eq!(rendered, vec![1, 4, 7]);
        let stats = event_loop.stats(StreamTag::Acquisition).unwrap();
        assert_eq!(stats.decimated, 6);
        assert_eq!(event_loop.display().creates(), 1);
        assert_eq!(event_loop.display().updates(), 2);
    }

    #[tokio::test]
    async fn no_surface_before_first_accepted_frame() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (tx, source) = channel_source(4);
        event_loop.add_stream(acquisition(1), source).unwrap();

        tx.send(Bytes::from_static(&[9])).await.unwrap();
        event_loop.tick().await;
        event_loop.tick().await;
        assert_eq!(event_loop.display().creates(), 0);

        tx.send(encoded_u16(2, 2, 1)).await.unwrap();
        event_loop.tick().await;
        assert_eq!(event_loop.display().creates(), 1);
    }

    #[tokio::test]
    async fn idle_tick_still_yields_to_display() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (_tx, source) = channel_source(4);
        event_loop.add_stream(acquisition(1), source).unwrap();

        let report = event_loop.tick().await;
        assert_eq!(report, TickReport::default());
        assert_eq!(event_loop.display().calls(), &[SurfaceCall::ProcessEvents]);
    }

    #[tokio::test]
    async fn render_failure_recreates_surface_on_next_frame() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (tx, source) = channel_source(4);
        event_loop.add_stream(acquisition(1), source).unwrap();

        tx.send(encoded_u16(4, 4, 1)).await.unwrap();
        tx.send(encoded_u16(8, 8, 2)).await.unwrap();
        tx.send(encoded_u16(8, 8, 3)).await.unwrap();

        assert_eq!(event_loop.tick().await.rendered, 1);
        assert_eq!(event_loop.tick().await.render_errors, 1);
        assert_eq!(event_loop.tick().await.rendered, 1);

        assert_eq!(event_loop.display().creates(), 2);
        assert_eq!(event_loop.stats(StreamTag::Acquisition).unwrap().render_errors, 1);
    }

    #[tokio::test]
    async fn run_stops_on_token() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (_tx, source) = channel_source(4);
        event_loop.add_stream(acquisition(1), source).unwrap();

        let token = event_loop.stop_token();
        token.cancel();

        assert_eq!(event_loop.run().await, ExitReason::StopRequested);
        assert_eq!(event_loop.state(), LoopState::Stopped);
        assert_eq!(event_loop.ticks(), 0);
    }

    #[tokio::test]
    async fn run_ends_when_sources_end() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (tx, source) = channel_source(4);
        event_loop.add_stream(acquisition(1), source).unwrap();

        tx.send(encoded_u16(2, 2, 5)).await.unwrap();
        drop(tx);

        let reason = tokio::time::timeout(Duration::from_secs(2), event_loop.run())
            .await
            .expect("loop should end once its only source ends");
        assert_eq!(reason, ExitReason::SourcesEnded);
        assert_eq!(event_loop.stats(StreamTag::Acquisition).unwrap().rendered, 1);
    }

    #[tokio::test]
    async fn receive_errors_are_counted() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let source = futures::stream::iter(vec![
            Err(crate::ViewerError::transport_failed("tcp://127.0.0.1:5560", "reset")),
            Ok(encoded_u16(2, 2, 1)),
        ]);
        event_loop.add_stream(acquisition(1), futures::StreamExt::boxed(source)).unwrap();

        assert_eq!(event_loop.tick().await.transport_errors, 1);
        assert_eq!(event_loop.tick().await.rendered, 1);
        assert_eq!(event_loop.stats(StreamTag::Acquisition).unwrap().transport_errors, 1);
    }

    #[tokio::test]
    async fn duplicate_stream_rejected() {
        let mut event_loop = EventLoop::new(RecordingSurface::default(), POLL);
        let (_tx1, first) = channel_source(1);
        let (_tx2, second) = channel_source(1);
        event_loop.add_stream(acquisition(1), first).unwrap();
        assert!(event_loop.add_stream(acquisition(2), second).is_err());
    }
}
