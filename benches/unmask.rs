//! Benchmarks the WebSocket frame-masking XOR loop across a range of
//! payload sizes, the same kind of microbenchmark RFC 6455 crates
//! typically run over their own masking hot path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wen::websocket::unmask;

fn bench_unmask(c: &mut Criterion) {
  let mask = [0x12, 0x34, 0x56, 0x78];
  let mut group = c.benchmark_group("unmask");

  for size in [64usize, 1024, 16 * 1024, 256 * 1024] {
    group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
      let mut data = vec![0xAAu8; size];
      b.iter(|| unmask(black_box(&mut data), black_box(mask)));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_unmask);
criterion_main!(benches);
