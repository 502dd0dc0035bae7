//! Benchmarks for the per-message hot path
//!
//! Measures, for detector-sized projections:
//! - Header parse plus zero-copy payload slicing
//! - Full decode → decimate → present into a headless display
//!
//! Platform: Cross-platform (synthetic frames, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::num::NonZeroU32;
use tomoscope::codec;
use tomoscope::render::RenderSink;
use tomoscope::registry::StreamState;
use tomoscope::test_utils::projection_frame;
use tomoscope::{ConnectionRole, HeadlessSurface, StreamConfig, StreamTag};

const SIZES: [(u32, u32); 3] = [(256, 256), (1024, 1024), (2048, 2048)];

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for (rows, cols) in SIZES {
        let raw = codec::encode(&projection_frame(rows, cols));
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(format!("{rows}x{cols}")), &raw, |b, raw| {
            b.iter(|| black_box(codec::decode(black_box(raw))))
        });
    }

    group.finish();
}

fn bench_decode_and_present(c: &mut Criterion) {
    let config =
        StreamConfig::new(StreamTag::Acquisition, "tcp://127.0.0.1:5560", ConnectionRole::Connect);
    let raw = codec::encode(&projection_frame(1024, 1024));

    let mut group = c.benchmark_group("decode_and_present");
    group.throughput(Throughput::Bytes(raw.len() as u64));

    for stride in [1u32, 5] {
        let mut sink = RenderSink::new(HeadlessSurface::new());
        let mut state = StreamState::new(NonZeroU32::new(stride).unwrap_or(NonZeroU32::MIN));

        group.bench_function(BenchmarkId::new("stride", stride), |b| {
            b.iter(|| {
                let Ok(frame) = codec::decode(black_box(&raw)) else {
                    return;
                };
                if state.accept_arrival() {
                    let _ = black_box(sink.present(&config, &mut state, &frame));
                }
                sink.yield_to_display();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode, bench_decode_and_present);
criterion_main!(benches);
