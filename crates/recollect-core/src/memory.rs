//! The memory store and its orchestration.
//!
//! A [`Memory`] owns everything: the chunk store, the candidate indexes,
//! the similarity registry, the clock, and a private noise generator.
//! Instances are fully independent; nothing is shared through globals, so
//! two memories with different parameters can coexist in one simulation.
//!
//! Time is a dimensionless monotone-free real. The caller decides what a
//! unit means and moves the clock explicitly with [`Memory::advance`];
//! nothing here touches wall-clock time. Retrieval at time `t` requires
//! the relevant references to be strictly before `t` whenever decay is
//! positive.

use std::collections::{BTreeMap, HashMap, VecDeque};

use smallvec::SmallVec;

use crate::activation::{
	base_level_count_only, base_level_exact, base_level_window, ActivationTrace,
};
use crate::chunk::{Chunk, References};
use crate::error::{MemoryError, Result};
use crate::index::StoreIndex;
use crate::noise::NoiseSource;
use crate::similarity::{SimilarityFn, SimilarityRegistry};
use crate::value::{Signature, Slots, Value};

/// How much reference history each learned chunk retains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OptimizedLearning {
	/// Every reinforcement timestamp; exact base-level activation.
	#[default]
	Off,
	/// Only a count; fully approximated base-level activation.
	CountOnly,
	/// The given number of most recent timestamps plus a count; the
	/// discarded remainder is approximated.
	Window(usize),
}

/// How far to move the clock after a [`Memory::learn_and_advance`].
#[derive(Clone, Copy, Debug, Default)]
pub enum Advance {
	/// One time unit.
	#[default]
	Unit,
	/// An explicit amount, which may be fractional or negative.
	By(f64),
}

impl Advance {
	const fn amount(self) -> f64 {
		match self {
			Self::Unit => 1.0,
			Self::By(amount) => amount,
		}
	}
}

/// One scored candidate, before selection or aggregation.
#[derive(Clone, Debug)]
pub(crate) struct Scored {
	pub(crate) signature: Signature,
	pub(crate) base_level: f64,
	pub(crate) noise: f64,
	pub(crate) mismatch: Option<f64>,
	pub(crate) activation: f64,
	/// Natural similarities per partially matched attribute, for salience.
	pub(crate) similarities: Vec<(String, f64)>,
}

/// An ACT-R style declarative memory: a store of chunks with activation
/// based retrieval and blending.
///
/// ```
/// use recollect_core::{slots, Memory};
///
/// # fn main() -> recollect_core::Result<()> {
/// let mut memory = Memory::with_seed(17);
/// memory.learn(slots! { "kind" => "dog", "legs" => 4 })?;
/// memory.advance(1.0)?;
/// let found = memory.retrieve(&slots! { "kind" => "dog" }, false)?;
/// assert_eq!(found.and_then(|c| c.get("legs")).and_then(|v| v.as_f64()), Some(4.0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Memory {
	noise: f64,
	decay: Option<f64>,
	temperature: Option<f64>,
	threshold: Option<f64>,
	mismatch: Option<f64>,
	optimized_learning: OptimizedLearning,
	time: f64,
	store: HashMap<Signature, Chunk>,
	index: StoreIndex,
	similarity: SimilarityRegistry,
	noise_source: NoiseSource,
	next_name: u64,
	trace: Option<Vec<ActivationTrace>>,
}

impl Default for Memory {
	fn default() -> Self {
		Self::new()
	}
}

impl Memory {
	/// A memory with the standard parameters: noise 0.25, decay 0.5,
	/// threshold −10, no mismatch penalty, exact reference histories, and
	/// an entropy-seeded generator.
	#[must_use]
	pub fn new() -> Self {
		Self::with_source(NoiseSource::from_entropy())
	}

	/// As [`Memory::new`], but with a reproducible generator.
	#[must_use]
	pub fn with_seed(seed: u64) -> Self {
		Self::with_source(NoiseSource::from_seed(seed))
	}

	fn with_source(noise_source: NoiseSource) -> Self {
		Self {
			noise: crate::DEFAULT_NOISE,
			decay: Some(crate::DEFAULT_DECAY),
			temperature: None,
			threshold: Some(crate::DEFAULT_THRESHOLD),
			mismatch: None,
			optimized_learning: OptimizedLearning::Off,
			time: 0.0,
			store: HashMap::new(),
			index: StoreIndex::default(),
			similarity: SimilarityRegistry::default(),
			noise_source,
			next_name: 0,
			trace: None,
		}
	}

	// ---- parameters ------------------------------------------------------

	/// The activation noise scale.
	#[must_use]
	pub const fn noise(&self) -> f64 {
		self.noise
	}

	/// Sets the activation noise scale.
	///
	/// # Errors
	///
	/// [`MemoryError::InvalidNoise`] for a negative or non-finite value;
	/// [`MemoryError::TemperatureTooLow`] when no explicit temperature is
	/// set and the derived `√2·noise` would fall below the floor (a noise
	/// of exactly zero is permitted, but blending then needs an explicit
	/// temperature).
	pub fn set_noise(&mut self, noise: f64) -> Result<()> {
		if !noise.is_finite() || noise < 0.0 {
			return Err(MemoryError::InvalidNoise(noise));
		}
		let derived = std::f64::consts::SQRT_2 * noise;
		if self.temperature.is_none() && noise > 0.0 && derived < crate::MINIMUM_TEMPERATURE {
			return Err(MemoryError::TemperatureTooLow(derived));
		}
		self.noise = noise;
		Ok(())
	}

	/// The base-level decay exponent, or `None` when decay is disabled.
	#[must_use]
	pub const fn decay(&self) -> Option<f64> {
		self.decay
	}

	/// Sets the decay exponent; `None` disables the base-level term.
	///
	/// # Errors
	///
	/// [`MemoryError::InvalidDecay`] for a negative or non-finite value;
	/// [`MemoryError::OptimizedLearningDecay`] for a decay of one or more
	/// while any optimized-learning mode is active.
	pub fn set_decay(&mut self, decay: Option<f64>) -> Result<()> {
		if let Some(d) = decay {
			if !d.is_finite() || d < 0.0 {
				return Err(MemoryError::InvalidDecay(d));
			}
			if d >= 1.0 && self.optimized_learning != OptimizedLearning::Off {
				return Err(MemoryError::OptimizedLearningDecay(d));
			}
		}
		self.decay = decay;
		Ok(())
	}

	/// The explicit blending temperature, or `None` for the derived one.
	#[must_use]
	pub const fn temperature(&self) -> Option<f64> {
		self.temperature
	}

	/// Sets the blending temperature; `None` derives it as `√2·noise`.
	///
	/// # Errors
	///
	/// [`MemoryError::TemperatureTooLow`] for a non-finite value or one
	/// below [`MINIMUM_TEMPERATURE`](crate::MINIMUM_TEMPERATURE).
	pub fn set_temperature(&mut self, temperature: Option<f64>) -> Result<()> {
		if let Some(t) = temperature {
			if !t.is_finite() || t < crate::MINIMUM_TEMPERATURE {
				return Err(MemoryError::TemperatureTooLow(t));
			}
		}
		self.temperature = temperature;
		Ok(())
	}

	/// The retrieval threshold, or `None` for no filtering.
	#[must_use]
	pub const fn threshold(&self) -> Option<f64> {
		self.threshold
	}

	/// Sets the retrieval threshold; chunks whose activation falls below
	/// it never surface from retrieval or blending. `None` disables the
	/// filter.
	///
	/// # Errors
	///
	/// [`MemoryError::InvalidThreshold`] for a non-finite value.
	pub fn set_threshold(&mut self, threshold: Option<f64>) -> Result<()> {
		if let Some(t) = threshold {
			if !t.is_finite() {
				return Err(MemoryError::InvalidThreshold(t));
			}
		}
		self.threshold = threshold;
		Ok(())
	}

	/// The mismatch penalty coefficient, or `None` when partial matching
	/// is disabled.
	#[must_use]
	pub const fn mismatch(&self) -> Option<f64> {
		self.mismatch
	}

	/// Sets the mismatch penalty coefficient; `None` disables partial
	/// matching entirely.
	///
	/// # Errors
	///
	/// [`MemoryError::InvalidMismatch`] for a negative or non-finite value.
	pub fn set_mismatch(&mut self, mismatch: Option<f64>) -> Result<()> {
		if let Some(m) = mismatch {
			if !m.is_finite() || m < 0.0 {
				return Err(MemoryError::InvalidMismatch(m));
			}
		}
		self.mismatch = mismatch;
		Ok(())
	}

	/// The active optimized-learning mode.
	#[must_use]
	pub const fn optimized_learning(&self) -> OptimizedLearning {
		self.optimized_learning
	}

	/// Sets the optimized-learning mode, which fixes how much reference
	/// history each subsequently learned chunk retains.
	///
	/// # Errors
	///
	/// [`MemoryError::StoreNotEmpty`] when chunks already exist (their
	/// histories were shaped by the old mode);
	/// [`MemoryError::OptimizedLearningDecay`] when the current decay is
	/// one or more and the requested mode approximates.
	pub fn set_optimized_learning(&mut self, mode: OptimizedLearning) -> Result<()> {
		if !self.store.is_empty() {
			return Err(MemoryError::StoreNotEmpty("optimized_learning"));
		}
		if mode != OptimizedLearning::Off {
			if let Some(d) = self.decay {
				if d >= 1.0 {
					return Err(MemoryError::OptimizedLearningDecay(d));
				}
			}
		}
		self.optimized_learning = mode;
		Ok(())
	}

	/// The declared index attributes, sorted; empty when no index is set.
	#[must_use]
	pub fn index(&self) -> &[String] {
		self.index.fast_attributes()
	}

	/// Declares the index attributes. Chunks learned from then on are
	/// bucketed by their values for these attributes, and any of them
	/// missing from a learned chunk is back-filled with [`Value::Nil`].
	///
	/// # Errors
	///
	/// [`MemoryError::StoreNotEmpty`] when chunks already exist;
	/// [`MemoryError::EmptyAttributeName`] and
	/// [`MemoryError::DuplicateIndexAttribute`] for malformed declarations.
	pub fn set_index(&mut self, attributes: &[&str]) -> Result<()> {
		if !self.store.is_empty() {
			return Err(MemoryError::StoreNotEmpty("index"));
		}
		let mut sorted: Vec<String> = Vec::with_capacity(attributes.len());
		for attribute in attributes {
			if attribute.is_empty() {
				return Err(MemoryError::EmptyAttributeName);
			}
			sorted.push((*attribute).to_owned());
		}
		sorted.sort();
		for pair in sorted.windows(2) {
			if pair[0] == pair[1] {
				return Err(MemoryError::DuplicateIndexAttribute(pair[0].clone()));
			}
		}
		self.index.set_fast_attributes(sorted);
		Ok(())
	}

	/// Registers, updates, or removes similarity functions; see
	/// [`SimilarityRegistry::set`].
	///
	/// # Errors
	///
	/// [`MemoryError::EmptyAttributeName`] for an empty attribute name;
	/// [`MemoryError::InvalidSimilarityWeight`] for a bad weight.
	pub fn set_similarity(
		&mut self,
		attributes: &[&str],
		function: Option<SimilarityFn>,
		weight: Option<f64>,
	) -> Result<()> {
		for attribute in attributes {
			if attribute.is_empty() {
				return Err(MemoryError::EmptyAttributeName);
			}
		}
		self.similarity.set(attributes, function, weight)
	}

	/// Whether the traditional ACT-R similarity range is in effect.
	#[must_use]
	pub const fn uses_actr_similarity(&self) -> bool {
		self.similarity.uses_actr_convention()
	}

	/// Switches between the natural `[0, 1]` and traditional ACT-R
	/// `[-1, 0]` similarity range conventions.
	pub fn set_use_actr_similarity(&mut self, value: bool) {
		self.similarity.set_actr_convention(value);
	}

	pub(crate) fn similarity_weight(&self, attribute: &str) -> f64 {
		self.similarity.weight(attribute)
	}

	/// The effective blending temperature: the explicit one, or `√2·noise`.
	pub(crate) fn effective_temperature(&self) -> Result<f64> {
		let t = self
			.temperature
			.unwrap_or(std::f64::consts::SQRT_2 * self.noise);
		if t < crate::MINIMUM_TEMPERATURE {
			Err(MemoryError::TemperatureTooLow(t))
		} else {
			Ok(t)
		}
	}

	// ---- clock -----------------------------------------------------------

	/// The current clock value.
	#[must_use]
	pub const fn time(&self) -> f64 {
		self.time
	}

	/// Moves the clock by `amount`, which may be fractional or negative,
	/// and returns the new time. Any movement invalidates fixed-noise
	/// memoization.
	///
	/// # Errors
	///
	/// [`MemoryError::NonFiniteTime`] for a non-finite amount.
	pub fn advance(&mut self, amount: f64) -> Result<f64> {
		if !amount.is_finite() {
			return Err(MemoryError::NonFiniteTime(amount));
		}
		self.time += amount;
		self.noise_source.invalidate_fixed();
		Ok(self.time)
	}

	/// Runs `f` with the clock temporarily set to `time`, restoring the
	/// prior clock on every exit path, panics included.
	///
	/// # Errors
	///
	/// [`MemoryError::NonFiniteTime`] for a non-finite time.
	pub fn with_time<R>(&mut self, time: f64, f: impl FnOnce(&mut Self) -> R) -> Result<R> {
		if !time.is_finite() {
			return Err(MemoryError::NonFiniteTime(time));
		}
		struct Restore<'a> {
			memory: &'a mut Memory,
			saved: f64,
		}
		impl Drop for Restore<'_> {
			fn drop(&mut self) {
				self.memory.time = self.saved;
				self.memory.noise_source.invalidate_fixed();
			}
		}
		let saved = self.time;
		self.time = time;
		self.noise_source.invalidate_fixed();
		let mut guard = Restore { memory: self, saved };
		Ok(f(guard.memory))
	}

	/// Runs `f` inside a fixed-noise scope: each chunk's noise draw at a
	/// given instant is made once and reused until the clock moves or the
	/// outermost scope closes (on every exit path, panics included).
	pub fn with_fixed_noise<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
		struct Restore<'a> {
			memory: &'a mut Memory,
			nested: bool,
		}
		impl Drop for Restore<'_> {
			fn drop(&mut self) {
				if !self.nested {
					self.memory.noise_source.end_fixed();
				}
			}
		}
		let nested = self.noise_source.begin_fixed();
		let mut guard = Restore {
			memory: self,
			nested,
		};
		f(guard.memory)
	}

	// ---- store access ----------------------------------------------------

	/// Number of chunks in the store.
	#[must_use]
	pub fn len(&self) -> usize {
		self.store.len()
	}

	/// Whether the store holds no chunks.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.store.is_empty()
	}

	/// Iterates over every chunk, in no particular order.
	pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
		self.store.values()
	}

	/// The chunk with exactly these attributes, if one has been learned.
	/// Index back-fill applies, so omitted index attributes read as nil.
	#[must_use]
	pub fn chunk(&self, slots: &Slots) -> Option<&Chunk> {
		let slots = self.backfilled(slots.clone());
		self.store.get(&Signature::from(&slots))
	}

	// ---- trace instrumentation -------------------------------------------

	/// Turns activation trace collection on or off. Turning it off
	/// discards any collected records.
	pub fn trace_activations(&mut self, enabled: bool) {
		self.trace = if enabled { Some(Vec::new()) } else { None };
	}

	/// Whether activation traces are being collected.
	#[must_use]
	pub const fn trace_enabled(&self) -> bool {
		self.trace.is_some()
	}

	/// Removes and returns the collected trace records; collection stays
	/// enabled if it was.
	pub fn take_trace(&mut self) -> Vec<ActivationTrace> {
		self.trace.as_mut().map(std::mem::take).unwrap_or_default()
	}

	pub(crate) fn record_trace(&mut self, scored: &Scored, probability: Option<f64>) {
		let Some(trace) = &mut self.trace else { return };
		let Some(chunk) = self.store.get(&scored.signature) else {
			return;
		};
		trace.push(ActivationTrace {
			name: chunk.name().to_owned(),
			creation_time: chunk.creation_time(),
			attributes: scored.signature.pairs().to_vec(),
			references: chunk.reference_trace(),
			base_level: scored.base_level,
			noise: scored.noise,
			mismatch: scored.mismatch,
			activation: scored.activation,
			retrieval_probability: probability,
		});
	}

	// ---- mutation --------------------------------------------------------

	/// Learns (or reinforces) the chunk with exactly these attributes at
	/// the current time. Returns whether a new chunk was created, as
	/// opposed to an existing one being reinforced.
	///
	/// # Errors
	///
	/// [`MemoryError::NoAttributes`] for an empty slot collection;
	/// [`MemoryError::EmptyAttributeName`] for an empty attribute name.
	pub fn learn(&mut self, slots: Slots) -> Result<bool> {
		if slots.is_empty() {
			return Err(MemoryError::NoAttributes);
		}
		for name in slots.names() {
			if name.is_empty() {
				return Err(MemoryError::EmptyAttributeName);
			}
		}
		let slots = self.backfilled(slots);
		let signature = Signature::from(&slots);
		let time = self.time;
		if let Some(chunk) = self.store.get_mut(&signature) {
			chunk.references_mut().cite(time);
			return Ok(false);
		}
		let name = format!("{:04}", self.next_name);
		self.next_name += 1;
		let mut references = self.new_references();
		references.cite(time);
		let attributes: BTreeMap<String, Value> = slots
			.iter()
			.map(|(n, v)| (n.clone(), v.clone()))
			.collect();
		self.index.insert(&signature);
		let _ = self
			.store
			.insert(signature, Chunk::new(name, attributes, time, references));
		Ok(true)
	}

	/// [`learn`](Memory::learn) followed by an [`advance`](Memory::advance).
	///
	/// # Errors
	///
	/// As for the two underlying operations.
	pub fn learn_and_advance(&mut self, slots: Slots, advance: Advance) -> Result<bool> {
		let created = self.learn(slots)?;
		let _ = self.advance(advance.amount())?;
		Ok(created)
	}

	/// Removes the single reference recorded at exactly `when` from the
	/// chunk with these attributes; the chunk itself disappears when its
	/// last reference goes. Returns whether a reference was removed.
	///
	/// # Errors
	///
	/// [`MemoryError::ForgetOptimized`] under any optimized-learning mode
	/// (discarded histories cannot be unwound);
	/// [`MemoryError::NoAttributes`] for an empty slot collection.
	pub fn forget(&mut self, slots: &Slots, when: f64) -> Result<bool> {
		if self.optimized_learning != OptimizedLearning::Off {
			return Err(MemoryError::ForgetOptimized);
		}
		if slots.is_empty() {
			return Err(MemoryError::NoAttributes);
		}
		let slots = self.backfilled(slots.clone());
		let signature = Signature::from(&slots);
		let Some(chunk) = self.store.get_mut(&signature) else {
			return Ok(false);
		};
		if !chunk.references_mut().uncite(when) {
			return Ok(false);
		}
		if chunk.reference_count() == 0 {
			let _ = self.store.remove(&signature);
			self.index.remove(&signature);
		}
		Ok(true)
	}

	/// Empties the store and rewinds the clock to zero. With
	/// `preserve_prepopulated`, chunks created at exactly time zero
	/// survive, each collapsed to a single reference at time zero.
	pub fn reset(&mut self, preserve_prepopulated: bool) {
		self.time = 0.0;
		self.noise_source.invalidate_fixed();
		self.index.clear();
		if preserve_prepopulated {
			self.store.retain(|_, chunk| chunk.creation_time() == 0.0);
			let signatures: Vec<Signature> = self.store.keys().cloned().collect();
			for signature in &signatures {
				self.index.insert(signature);
			}
			for chunk in self.store.values_mut() {
				chunk.collapse_to_origin();
			}
		} else {
			self.store.clear();
		}
	}

	// ---- retrieval -------------------------------------------------------

	/// The chunk matching every condition exactly with the highest noisy
	/// activation at or above the threshold, or `None` when nothing
	/// qualifies. Ties break uniformly at random. With `rehearse`, the
	/// returned chunk is reinforced at the current time.
	///
	/// # Errors
	///
	/// [`MemoryError::ChunkNotInPast`] when decay is positive and a
	/// candidate was referenced at or after the current time, plus any
	/// activation or similarity failure.
	pub fn retrieve(&mut self, conditions: &Slots, rehearse: bool) -> Result<Option<&Chunk>> {
		self.retrieve_inner(conditions, false, rehearse)
	}

	/// As [`retrieve`](Memory::retrieve), but attributes carrying
	/// similarity functions match partially, contributing a mismatch
	/// penalty instead of excluding the chunk. Falls back to exact
	/// matching while no mismatch penalty is configured.
	///
	/// # Errors
	///
	/// As for [`retrieve`](Memory::retrieve).
	pub fn retrieve_partial(
		&mut self,
		conditions: &Slots,
		rehearse: bool,
	) -> Result<Option<&Chunk>> {
		self.retrieve_inner(conditions, true, rehearse)
	}

	fn retrieve_inner(
		&mut self,
		conditions: &Slots,
		partial: bool,
		rehearse: bool,
	) -> Result<Option<&Chunk>> {
		let scored = self.score(conditions, partial)?;
		if self.trace_enabled() {
			for s in &scored {
				self.record_trace(s, None);
			}
		}
		let threshold = self.threshold;
		let survivors: Vec<&Scored> = scored
			.iter()
			.filter(|s| threshold.map_or(true, |t| s.activation >= t))
			.collect();
		if survivors.is_empty() {
			return Ok(None);
		}
		let top = survivors
			.iter()
			.map(|s| s.activation)
			.fold(f64::NEG_INFINITY, f64::max);
		#[allow(clippy::float_cmp)]
		let ties: Vec<&Scored> = survivors
			.into_iter()
			.filter(|s| s.activation == top)
			.collect();
		let pick = self.noise_source.pick(ties.len());
		let signature = ties[pick].signature.clone();
		if rehearse {
			let time = self.time;
			if let Some(chunk) = self.store.get_mut(&signature) {
				chunk.references_mut().cite(time);
			}
		}
		Ok(self.store.get(&signature))
	}

	pub(crate) fn tie_break(&mut self, n: usize) -> usize {
		self.noise_source.pick(n)
	}

	pub(crate) fn stored_name(&self, signature: &Signature) -> Option<&str> {
		self.store.get(signature).map(Chunk::name)
	}

	// ---- scoring ---------------------------------------------------------

	/// Scores every candidate matching the conditions. With `partial`,
	/// attributes carrying similarity functions contribute penalties
	/// instead of filtering; partial matching degrades to exact while no
	/// mismatch penalty is set.
	pub(crate) fn score(&mut self, conditions: &Slots, partial: bool) -> Result<Vec<Scored>> {
		for name in conditions.names() {
			if name.is_empty() {
				return Err(MemoryError::EmptyAttributeName);
			}
		}
		let partial = partial && self.mismatch.is_some();
		let candidates = self.candidates(conditions, partial);
		let mut out = Vec::new();
		'candidate: for signature in candidates {
			let mut similarities: Vec<(String, f64)> = Vec::new();
			for (name, wanted) in conditions {
				let Some(actual) = signature.value(name) else {
					continue 'candidate;
				};
				if partial {
					match self.similarity.similarity(name, wanted, actual)? {
						Some(s) => similarities.push((name.clone(), s)),
						None => {
							if actual != wanted {
								continue 'candidate;
							}
						}
					}
				} else if actual != wanted {
					continue 'candidate;
				}
			}
			let Some(chunk) = self.store.get(&signature) else {
				continue;
			};
			let base_level = match self.decay {
				None => 0.0,
				Some(d) => match chunk.references() {
					References::Exact(times) => base_level_exact(times, self.time, d)?,
					References::Window { recent, count, .. } => {
						let retained: Vec<f64> = recent.iter().copied().collect();
						base_level_window(&retained, *count, chunk.creation_time(), self.time, d)?
					}
					References::Count(count) => {
						base_level_count_only(*count, chunk.creation_time(), self.time, d)?
					}
				},
			};
			let noise = self.noise_source.draw(chunk.name(), self.noise);
			let mismatch = if partial {
				let mu = self.mismatch.unwrap_or(0.0);
				let mut penalty = 0.0;
				for (name, s) in &similarities {
					penalty += self.similarity.weight(name) * (s - 1.0);
				}
				Some(mu * penalty)
			} else {
				None
			};
			let activation = base_level + noise + mismatch.unwrap_or(0.0);
			out.push(Scored {
				signature,
				base_level,
				noise,
				mismatch,
				activation,
				similarities,
			});
		}
		Ok(out)
	}

	fn candidates(&self, conditions: &Slots, partial: bool) -> Vec<Signature> {
		// the fast index demands exact equality on its attributes, so it
		// only applies when none of them can match partially
		let fast_safe = !partial
			|| self
				.index
				.fast_attributes()
				.iter()
				.all(|a| !self.similarity.has_function(a));
		if fast_safe {
			if let Some(bucket) = self.index.fast_lookup(conditions) {
				return bucket;
			}
		}
		let names: Vec<&str> = conditions.names().collect();
		self.index.scan(&names)
	}

	fn backfilled(&self, mut slots: Slots) -> Slots {
		for attribute in self.index.fast_attributes() {
			if !slots.contains(attribute) {
				slots.set(attribute.clone(), Value::Nil);
			}
		}
		slots
	}

	fn new_references(&self) -> References {
		match self.optimized_learning {
			OptimizedLearning::Off => References::Exact(SmallVec::new()),
			OptimizedLearning::CountOnly | OptimizedLearning::Window(0) => References::Count(0),
			OptimizedLearning::Window(cap) => References::Window {
				recent: VecDeque::with_capacity(cap),
				cap,
				count: 0,
			},
		}
	}
}
