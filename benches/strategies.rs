/*!
 * Strategy Churn Benchmarks
 *
 * Compare mmap and malloc under serial and concurrent churn
 */

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mapchurn::{BUFFER_LEN, Churn, Heap, Mmap, Strategy, WorkerPool};

fn bench_strategy<S: Strategy>(
  c: &mut Criterion,
  group_name: &str,
  strategy: &S,
) {
  let mut group = c.benchmark_group(group_name);
  group.sample_size(10);

  for count in [16usize, 64, 256] {
    let churn = Churn::new(strategy, BUFFER_LEN);
    group.bench_with_input(BenchmarkId::new("serial", count), &count, |b, &count| {
      b.iter(|| churn.drive(black_box(count)).unwrap());
    });

    let touched = Churn::new(strategy, BUFFER_LEN).with_touch(true);
    group.bench_with_input(BenchmarkId::new("serial_touched", count), &count, |b, &count| {
      b.iter(|| touched.drive(black_box(count)).unwrap());
    });

    let pool = WorkerPool::new(4, 4);
    group.bench_with_input(BenchmarkId::new("pool_4x4", count), &count, |b, &count| {
      b.iter(|| pool.run(&churn, black_box(count)).unwrap());
    });
  }

  group.finish();
}

fn bench_mmap(c: &mut Criterion) {
  bench_strategy(c, "mmap", &Mmap);
}

fn bench_heap(c: &mut Criterion) {
  bench_strategy(c, "malloc", &Heap);
}

criterion_group!(benches, bench_mmap, bench_heap);
criterion_main!(benches);
