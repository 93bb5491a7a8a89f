//! Activation noise and tie-breaking randomness.
//!
//! Each memory owns its own generator, seeded independently at
//! construction, so determinism is achieved by controlling construction
//! (or by [`Memory::with_seed`](crate::Memory::with_seed)), never by a
//! shared global generator.
//!
//! Noise draws follow a logistic distribution with scale `s`, sampled by
//! inverse CDF: `s · ln(u / (1 − u))` for uniform `u ∈ (0, 1)`. Within a
//! fixed-noise scope, a chunk's draw at a given instant is memoized by
//! chunk name and reused until the clock moves or the scope closes.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Private randomness for one memory: noise draws and tie-breaking.
#[derive(Debug)]
pub(crate) struct NoiseSource {
	rng: StdRng,
	fixed: Option<HashMap<String, f64>>,
}

impl NoiseSource {
	pub(crate) fn from_entropy() -> Self {
		Self {
			rng: StdRng::from_entropy(),
			fixed: None,
		}
	}

	pub(crate) fn from_seed(seed: u64) -> Self {
		Self {
			rng: StdRng::seed_from_u64(seed),
			fixed: None,
		}
	}

	/// One logistic draw with the given scale; exactly zero when the scale
	/// is zero.
	fn logistic(&mut self, scale: f64) -> f64 {
		if scale == 0.0 {
			return 0.0;
		}
		let u = loop {
			let u: f64 = self.rng.gen();
			if u > 0.0 {
				break u;
			}
		};
		scale * (u / (1.0 - u)).ln()
	}

	/// The noise term for the named chunk, honoring any fixed-noise scope.
	pub(crate) fn draw(&mut self, chunk_name: &str, scale: f64) -> f64 {
		if let Some(cache) = &self.fixed {
			if let Some(&cached) = cache.get(chunk_name) {
				return cached;
			}
		}
		let value = self.logistic(scale);
		if let Some(cache) = &mut self.fixed {
			let _ = cache.insert(chunk_name.to_owned(), value);
		}
		value
	}

	/// Uniform index into `0..n` for tie-breaking. `n` must be positive.
	pub(crate) fn pick(&mut self, n: usize) -> usize {
		if n <= 1 {
			0
		} else {
			self.rng.gen_range(0..n)
		}
	}

	/// Opens a fixed-noise scope; answers whether one was already open, so
	/// nested scopes only close at the outermost exit.
	pub(crate) fn begin_fixed(&mut self) -> bool {
		if self.fixed.is_none() {
			self.fixed = Some(HashMap::new());
			false
		} else {
			true
		}
	}

	pub(crate) fn end_fixed(&mut self) {
		self.fixed = None;
	}

	/// Drops memoized draws without leaving the fixed-noise scope; called
	/// whenever the clock moves.
	pub(crate) fn invalidate_fixed(&mut self) {
		if let Some(cache) = &mut self.fixed {
			cache.clear();
		}
	}

	#[cfg(test)]
	pub(crate) fn is_fixed(&self) -> bool {
		self.fixed.is_some()
	}
}
