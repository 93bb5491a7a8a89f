//! Benchmarks for the base-level activation math
//!
//! Tests performance of:
//! - Exact base-level activation across history lengths
//! - The count-only and bounded-window approximations
//! - The approximation crossover (where window beats exact on cost)

#![allow(clippy::expect_used)] // Fine in benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use recollect_core::{base_level_count_only, base_level_exact, base_level_window};

/// Generate a plausible reinforcement history ending just before `now`.
fn generate_references(count: usize, now: f64) -> Vec<f64> {
	let mut rng = rand::thread_rng();
	let mut times: Vec<f64> = (0..count).map(|_| rng.gen::<f64>() * (now - 1.0)).collect();
	times.sort_by(f64::total_cmp);
	times
}

fn bench_exact_base_level(c: &mut Criterion) {
	let mut group = c.benchmark_group("exact_base_level");
	let now = 10_000.0;

	for reference_count in &[5usize, 20, 100, 1000, 10_000] {
		let references = generate_references(*reference_count, now);

		let _ = group.throughput(Throughput::Elements(*reference_count as u64));
		let _ = group.bench_with_input(
			BenchmarkId::new("references", reference_count),
			reference_count,
			|bench, _| {
				bench.iter(|| {
					base_level_exact(black_box(&references), black_box(now), black_box(0.5))
				});
			},
		);
	}

	group.finish();
}

fn bench_count_only_base_level(c: &mut Criterion) {
	let mut group = c.benchmark_group("count_only_base_level");
	let now = 10_000.0;

	// constant-time regardless of the count
	for count in &[5u64, 100, 10_000, 1_000_000] {
		let _ = group.bench_with_input(BenchmarkId::new("count", count), count, |bench, &n| {
			bench.iter(|| {
				base_level_count_only(black_box(n), black_box(0.0), black_box(now), black_box(0.5))
			});
		});
	}

	group.finish();
}

fn bench_window_base_level(c: &mut Criterion) {
	let mut group = c.benchmark_group("window_base_level");
	let now = 10_000.0;
	let total = 10_000u64;

	for window in &[1usize, 4, 16, 64, 256] {
		let retained = generate_references(*window, now);

		let _ = group.throughput(Throughput::Elements(*window as u64));
		let _ = group.bench_with_input(BenchmarkId::new("window", window), window, |bench, _| {
			bench.iter(|| {
				base_level_window(
					black_box(&retained),
					black_box(total),
					black_box(0.0),
					black_box(now),
					black_box(0.5),
				)
			});
		});
	}

	group.finish();
}

criterion_group!(
	benches,
	bench_exact_base_level,
	bench_count_only_base_level,
	bench_window_base_level,
);

criterion_main!(benches);
