//! Benchmarks for end-to-end retrieval and blending
//!
//! Tests performance of:
//! - Exact retrieval over growing stores, indexed vs scanned
//! - Partial (similarity-based) retrieval
//! - Blending across match-set sizes

#![allow(clippy::expect_used)] // Fine in benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recollect_core::{slots, Memory, SimilarityFn, Slots};

/// A deterministic store of `count` chunks spread over `groups` colors.
fn populated(count: usize, groups: usize, indexed: bool) -> Memory {
	let mut memory = Memory::with_seed(1);
	memory.set_noise(0.0).expect("noise");
	memory.set_temperature(Some(1.0)).expect("temperature");
	if indexed {
		memory.set_index(&["color"]).expect("index");
	}
	for i in 0..count {
		memory
			.learn(slots! {
				"color" => format!("c{}", i % groups),
				"size" => i as i64,
				"payoff" => (i % 7) as i64,
			})
			.expect("learn");
		let _ = memory.advance(1.0).expect("advance");
	}
	memory
}

fn query() -> Slots {
	slots! { "color" => "c3" }
}

fn bench_exact_retrieval_scanned(c: &mut Criterion) {
	let mut group = c.benchmark_group("exact_retrieval_scanned");

	for count in &[100usize, 1000, 10_000] {
		let mut memory = populated(*count, 10, false);

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("chunks", count), count, |bench, _| {
			bench.iter(|| memory.retrieve(black_box(&query()), false));
		});
	}

	group.finish();
}

fn bench_exact_retrieval_indexed(c: &mut Criterion) {
	let mut group = c.benchmark_group("exact_retrieval_indexed");

	for count in &[100usize, 1000, 10_000] {
		let mut memory = populated(*count, 10, true);

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("chunks", count), count, |bench, _| {
			bench.iter(|| memory.retrieve(black_box(&query()), false));
		});
	}

	group.finish();
}

fn bench_partial_retrieval(c: &mut Criterion) {
	let mut group = c.benchmark_group("partial_retrieval");

	for count in &[100usize, 1000, 10_000] {
		let mut memory = populated(*count, 10, false);
		memory.set_mismatch(Some(1.0)).expect("mismatch");
		memory
			.set_similarity(
				&["size"],
				Some(SimilarityFn::custom(|x, y| {
					let (a, b) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
					1.0 / (1.0 + (a - b).abs())
				})),
				None,
			)
			.expect("similarity");
		let conditions = slots! { "size" => 50 };

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("chunks", count), count, |bench, _| {
			bench.iter(|| memory.retrieve_partial(black_box(&conditions), false));
		});
	}

	group.finish();
}

fn bench_blend(c: &mut Criterion) {
	let mut group = c.benchmark_group("blend");

	for count in &[100usize, 1000, 10_000] {
		let mut memory = populated(*count, 10, false);
		let conditions = query();

		let _ = group.throughput(Throughput::Elements(*count as u64));
		let _ = group.bench_with_input(BenchmarkId::new("chunks", count), count, |bench, _| {
			bench.iter(|| memory.blend(black_box("payoff"), black_box(&conditions)));
		});
	}

	group.finish();
}

criterion_group!(
	benches,
	bench_exact_retrieval_scanned,
	bench_exact_retrieval_indexed,
	bench_partial_retrieval,
	bench_blend,
);

criterion_main!(benches);
