//! Blended retrieval: consensus answers weighted by retrieval probability.
//!
//! Where plain retrieval surfaces a single winning chunk, blending asks
//! every matching chunk for its value of an *outcome* attribute and
//! aggregates. Each chunk above the retrieval threshold receives the
//! softmax weight
//!
//! ```text
//! pᵢ = exp(aᵢ/τ) / Σⱼ exp(aⱼ/τ)
//! ```
//!
//! with temperature `τ` (explicit, or `√2·noise`). Numeric outcomes blend
//! to the expectation `Σ pᵢ·oᵢ`; arbitrary outcomes blend discretely to
//! the value carrying the most probability mass. Salience reports how
//! sensitive the blended value is to each participating chunk and to each
//! partially matched query attribute.
//!
//! Chunks that match the conditions but lack the outcome attribute sit out
//! the blend entirely, contributing neither weight nor value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MemoryError, Result};
use crate::memory::{Memory, Scored};
use crate::value::{Slots, Value};

/// Which salience vectors [`Memory::blend_salient`] should compute.
#[derive(Clone, Copy, Debug)]
pub struct SalienceOptions {
	/// Compute per-chunk (instance) salience.
	pub instances: bool,
	/// Compute per-attribute (feature) salience.
	pub features: bool,
}

impl Default for SalienceOptions {
	fn default() -> Self {
		Self {
			instances: true,
			features: true,
		}
	}
}

/// One chunk's share of a blended value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceSalience {
	/// The chunk's name.
	pub name: String,
	/// The chunk's outcome value.
	pub outcome: f64,
	/// The chunk's softmax weight in the blend.
	pub retrieval_probability: f64,
	/// Unit-normalized sensitivity of the blended value to this chunk's
	/// activation.
	pub salience: f64,
}

/// One query attribute's influence on a blended value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureSalience {
	/// The partially matched attribute.
	pub attribute: String,
	/// Unit-normalized sensitivity of the blended value to scaling this
	/// attribute's mismatch penalty.
	pub salience: f64,
}

/// A blended value together with its salience decomposition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlendResult {
	/// The probability-weighted outcome.
	pub value: f64,
	/// Per-chunk salience, empty unless requested.
	pub instances: Vec<InstanceSalience>,
	/// Per-attribute salience, empty unless requested or when partial
	/// matching is disabled.
	pub features: Vec<FeatureSalience>,
}

struct Item {
	scored: Scored,
	name: String,
	outcome: f64,
	probability: f64,
}

struct Components {
	value: f64,
	temperature: f64,
	items: Vec<Item>,
}

impl Memory {
	/// The probability-weighted mean of `outcome` over every chunk
	/// matching the conditions (partially, when a mismatch penalty is
	/// configured) at or above the threshold. `None` when nothing matches.
	///
	/// # Errors
	///
	/// [`MemoryError::NonNumericOutcome`] when a participating chunk holds
	/// a non-numeric outcome value;
	/// [`MemoryError::TemperatureTooLow`] when the effective temperature
	/// is unusable; plus any activation or similarity failure.
	pub fn blend(&mut self, outcome: &str, conditions: &Slots) -> Result<Option<f64>> {
		Ok(self.blend_components(outcome, conditions)?.map(|c| c.value))
	}

	/// Blends `outcome` under each candidate condition set and returns the
	/// index and value of the best (highest, or lowest with `minimize`)
	/// result. Candidates matching nothing are skipped; ties break
	/// uniformly at random.
	///
	/// # Errors
	///
	/// As for [`blend`](Memory::blend).
	pub fn best_blend(
		&mut self,
		outcome: &str,
		candidates: &[Slots],
		minimize: bool,
	) -> Result<Option<(usize, f64)>> {
		let mut results: Vec<(usize, f64)> = Vec::new();
		for (i, conditions) in candidates.iter().enumerate() {
			if let Some(value) = self.blend(outcome, conditions)? {
				results.push((i, value));
			}
		}
		if results.is_empty() {
			return Ok(None);
		}
		let best = results
			.iter()
			.map(|(_, v)| *v)
			.fold(if minimize { f64::INFINITY } else { f64::NEG_INFINITY }, |acc, v| {
				if minimize {
					acc.min(v)
				} else {
					acc.max(v)
				}
			});
		#[allow(clippy::float_cmp)]
		let ties: Vec<(usize, f64)> = results.into_iter().filter(|(_, v)| *v == best).collect();
		let pick = self.tie_break(ties.len());
		Ok(Some(ties[pick]))
	}

	/// As [`best_blend`](Memory::best_blend), but the candidates are bare
	/// values of one attribute; returns the winning value and its blend.
	///
	/// # Errors
	///
	/// As for [`blend`](Memory::blend).
	pub fn best_blend_values(
		&mut self,
		outcome: &str,
		select_attribute: &str,
		values: &[Value],
		minimize: bool,
	) -> Result<Option<(Value, f64)>> {
		let candidates: Vec<Slots> = values
			.iter()
			.map(|v| Slots::new().with(select_attribute, v.clone()))
			.collect();
		Ok(self
			.best_blend(outcome, &candidates, minimize)?
			.map(|(i, value)| (values[i].clone(), value)))
	}

	/// Blends an outcome that need not be numeric: each distinct outcome
	/// value accumulates the probability mass of the chunks carrying it,
	/// and the heaviest value wins (ties break uniformly at random).
	/// Returns the winner plus the full value → mass mapping, sorted by
	/// value.
	///
	/// # Errors
	///
	/// As for [`blend`](Memory::blend), minus the numeric requirement.
	pub fn discrete_blend(
		&mut self,
		outcome: &str,
		conditions: &Slots,
	) -> Result<Option<(Value, Vec<(Value, f64)>)>> {
		let Some(parts) = self.participants(outcome, conditions)? else {
			return Ok(None);
		};
		let mut mass: BTreeMap<Value, f64> = BTreeMap::new();
		for (_, value, probability) in parts {
			*mass.entry(value).or_insert(0.0) += probability;
		}
		let masses: Vec<(Value, f64)> = mass.into_iter().collect();
		let top = masses
			.iter()
			.map(|(_, m)| *m)
			.fold(f64::NEG_INFINITY, f64::max);
		#[allow(clippy::float_cmp)]
		let ties: Vec<usize> = masses
			.iter()
			.enumerate()
			.filter(|(_, (_, m))| *m == top)
			.map(|(i, _)| i)
			.collect();
		let pick = self.tie_break(ties.len());
		let winner = masses[ties[pick]].0.clone();
		Ok(Some((winner, masses)))
	}

	/// [`blend`](Memory::blend) plus salience: how much each chunk and
	/// each partially matched attribute pulled the blended value.
	///
	/// Instance salience is `pᵢ(oᵢ − B)/τ` per chunk; feature salience is
	/// `(μ·w_f/τ) Σᵢ pᵢ(oᵢ − B)(s_f − 1)` per similarity-matched query
	/// attribute. Each vector is normalized to unit length (a zero vector
	/// stays zero).
	///
	/// # Errors
	///
	/// As for [`blend`](Memory::blend).
	pub fn blend_salient(
		&mut self,
		outcome: &str,
		conditions: &Slots,
		options: SalienceOptions,
	) -> Result<Option<BlendResult>> {
		let Some(c) = self.blend_components(outcome, conditions)? else {
			return Ok(None);
		};
		let mut instances = Vec::new();
		if options.instances {
			let mut raw: Vec<f64> = c
				.items
				.iter()
				.map(|i| i.probability * (i.outcome - c.value) / c.temperature)
				.collect();
			unit_normalize(&mut raw);
			instances = c
				.items
				.iter()
				.zip(raw)
				.map(|(i, salience)| InstanceSalience {
					name: i.name.clone(),
					outcome: i.outcome,
					retrieval_probability: i.probability,
					salience,
				})
				.collect();
		}
		let mut features = Vec::new();
		if options.features {
			if let Some(mu) = self.mismatch() {
				let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
				for item in &c.items {
					for (attribute, s) in &item.scored.similarities {
						*sums.entry(attribute.as_str()).or_insert(0.0) +=
							item.probability * (item.outcome - c.value) * (s - 1.0);
					}
				}
				let mut raw: Vec<f64> = sums
					.iter()
					.map(|(attribute, sum)| {
						mu * self.similarity_weight(attribute) * sum / c.temperature
					})
					.collect();
				unit_normalize(&mut raw);
				features = sums
					.keys()
					.zip(raw)
					.map(|(attribute, salience)| FeatureSalience {
						attribute: (*attribute).to_owned(),
						salience,
					})
					.collect();
			}
		}
		Ok(Some(BlendResult {
			value: c.value,
			instances,
			features,
		}))
	}

	fn blend_components(&mut self, outcome: &str, conditions: &Slots) -> Result<Option<Components>> {
		let temperature = self.effective_temperature()?;
		let Some(parts) = self.participants(outcome, conditions)? else {
			return Ok(None);
		};
		let mut items = Vec::with_capacity(parts.len());
		let mut value = 0.0;
		for (scored, outcome_value, probability) in parts {
			let Some(o) = outcome_value.as_f64() else {
				return Err(MemoryError::NonNumericOutcome {
					attribute: outcome.to_owned(),
					value: outcome_value,
				});
			};
			let name = self
				.stored_name(&scored.signature)
				.map(str::to_owned)
				.unwrap_or_default();
			value += probability * o;
			items.push(Item {
				scored,
				name,
				outcome: o,
				probability,
			});
		}
		Ok(Some(Components {
			value,
			temperature,
			items,
		}))
	}

	/// Scores, filters by threshold and outcome presence, and softmaxes.
	/// Trace records carry the retrieval probability for participants and
	/// `None` for the excluded.
	fn participants(
		&mut self,
		outcome: &str,
		conditions: &Slots,
	) -> Result<Option<Vec<(Scored, Value, f64)>>> {
		let temperature = self.effective_temperature()?;
		let scored = self.score(conditions, true)?;
		let threshold = self.threshold();
		let mut kept: Vec<(Scored, Value)> = Vec::new();
		let mut excluded: Vec<Scored> = Vec::new();
		for s in scored {
			let above = threshold.map_or(true, |t| s.activation >= t);
			match (above, s.signature.value(outcome).cloned()) {
				(true, Some(value)) => kept.push((s, value)),
				_ => excluded.push(s),
			}
		}
		if self.trace_enabled() {
			for s in &excluded {
				self.record_trace(s, None);
			}
		}
		if kept.is_empty() {
			return Ok(None);
		}
		// shift by the maximum before exponentiating
		let top = kept
			.iter()
			.map(|(s, _)| s.activation)
			.fold(f64::NEG_INFINITY, f64::max);
		let weights: Vec<f64> = kept
			.iter()
			.map(|(s, _)| ((s.activation - top) / temperature).exp())
			.collect();
		let total: f64 = weights.iter().sum();
		let out: Vec<(Scored, Value, f64)> = kept
			.into_iter()
			.zip(weights)
			.map(|((s, v), w)| (s, v, w / total))
			.collect();
		if self.trace_enabled() {
			for (s, _, p) in &out {
				self.record_trace(s, Some(*p));
			}
		}
		Ok(Some(out))
	}
}

fn unit_normalize(values: &mut [f64]) {
	let norm = values.iter().map(|v| v * v).sum::<f64>().sqrt();
	if norm > 0.0 {
		for v in values.iter_mut() {
			*v /= norm;
		}
	}
}
