//! Base-level activation: the decay, frequency, and recency component.
//!
//! A chunk reinforced at times `r₁ … rₙ` and examined at time `t` has the
//! base-level activation
//!
//! ```text
//! B = ln Σₖ (t − rₖ)^(−d)
//! ```
//!
//! with decay exponent `d`. Under optimized learning most (or all) of the
//! `rₖ` are not retained, and the discarded portion is approximated by
//! assuming the reinforcements were spread uniformly over the chunk's
//! lifetime, replacing their sum by the integral of the decay curve:
//!
//! ```text
//! ∫ₐᵇ (t − x)^(−d) dx = ((t − a)^(1−d) − (t − b)^(1−d)) / (1 − d)
//! ```
//!
//! - **count-only** (nothing retained): `B = ln(n / (1 − d)) − d·ln(t − t₀)`
//!   where `t₀` is the creation time;
//! - **window(k)** (`k` most recent retained): the exact sum over the
//!   retained references, plus `(n − k)` times the mean of the integral
//!   between `t₀` and the oldest retained reference.
//!
//! The window form reduces to the exact sum as `k → n` and to the
//! count-only form as `k → 0`. With `d = 0` every form collapses to
//! `ln n`, independent of the timestamps. A decay of `None` at the store
//! level omits the term entirely; that is handled by the caller.
//!
//! Ages must be strictly positive when `d > 0`: a reference at or after
//! `t` would contribute an infinite term, so it raises instead of
//! polluting downstream aggregation with `inf`/`NaN`.

use serde::{Deserialize, Serialize};

use crate::chunk::ReferenceTrace;
use crate::error::{MemoryError, Result};
use crate::value::Value;

/// Base-level activation from an exact reference history.
///
/// # Errors
///
/// [`MemoryError::ChunkNotInPast`] when `decay > 0` and any reference is
/// not strictly before `time`; [`MemoryError::NonFiniteActivation`] when
/// the sum degenerates (for instance, an empty history).
pub fn base_level_exact(references: &[f64], time: f64, decay: f64) -> Result<f64> {
	if decay == 0.0 {
		return finite_ln(references.len() as f64);
	}
	let mut sum = 0.0;
	for &reference in references {
		let age = time - reference;
		if age <= 0.0 {
			return Err(MemoryError::ChunkNotInPast(time));
		}
		sum += age.powf(-decay);
	}
	finite_ln(sum)
}

/// Base-level activation when only a reference count survives.
///
/// Approximates `count` reinforcements spread uniformly between `creation`
/// and `time`. Requires `decay < 1` (enforced at configuration time).
///
/// # Errors
///
/// [`MemoryError::ChunkNotInPast`] when `decay > 0` and the chunk was not
/// created strictly before `time`.
pub fn base_level_count_only(count: u64, creation: f64, time: f64, decay: f64) -> Result<f64> {
	#[allow(clippy::cast_precision_loss)]
	let n = count as f64;
	if decay == 0.0 {
		return finite_ln(n);
	}
	let lifetime = time - creation;
	if lifetime <= 0.0 {
		return Err(MemoryError::ChunkNotInPast(time));
	}
	let value = (n / (1.0 - decay)).ln() - decay * lifetime.ln();
	if value.is_finite() {
		Ok(value)
	} else {
		Err(MemoryError::NonFiniteActivation(value))
	}
}

/// Base-level activation from a bounded window of recent references.
///
/// The retained references contribute exactly; the `count − retained`
/// discarded ones contribute the uniform-spread integral between the
/// creation time and the oldest retained reference. Requires `decay < 1`
/// when any references have been discarded.
///
/// # Errors
///
/// As for [`base_level_exact`], plus [`MemoryError::ChunkNotInPast`] when
/// the approximated span is empty because the chunk is not strictly in the
/// past.
pub fn base_level_window(
	retained: &[f64],
	count: u64,
	creation: f64,
	time: f64,
	decay: f64,
) -> Result<f64> {
	if retained.is_empty() {
		return base_level_count_only(count, creation, time, decay);
	}
	#[allow(clippy::cast_precision_loss)]
	let n = count as f64;
	if decay == 0.0 {
		return finite_ln(n);
	}
	let mut sum = 0.0;
	let mut oldest = f64::INFINITY;
	for &reference in retained {
		let age = time - reference;
		if age <= 0.0 {
			return Err(MemoryError::ChunkNotInPast(time));
		}
		sum += age.powf(-decay);
		oldest = oldest.min(reference);
	}
	let discarded = n - retained.len() as f64;
	if discarded > 0.0 {
		let lifetime = time - creation;
		if lifetime <= 0.0 {
			return Err(MemoryError::ChunkNotInPast(time));
		}
		let span = oldest - creation;
		sum += if span > 0.0 {
			let tail = (time - creation).powf(1.0 - decay) - (time - oldest).powf(1.0 - decay);
			discarded * tail / ((1.0 - decay) * span)
		} else {
			// every retained reference sits at the creation time
			discarded * lifetime.powf(-decay)
		};
	}
	finite_ln(sum)
}

fn finite_ln(x: f64) -> Result<f64> {
	let value = x.ln();
	if value.is_finite() {
		Ok(value)
	} else {
		Err(MemoryError::NonFiniteActivation(value))
	}
}

/// One scored chunk, as recorded when trace collection is enabled.
///
/// The three components always satisfy
/// `activation = base_level + noise + mismatch.unwrap_or(0)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivationTrace {
	/// The chunk's name within its memory.
	pub name: String,
	/// When the chunk was first learned.
	pub creation_time: f64,
	/// The chunk's attributes, sorted by name.
	pub attributes: Vec<(String, Value)>,
	/// Reinforcement timestamps, or just a count under optimized learning.
	pub references: ReferenceTrace,
	/// The decay/frequency/recency term (0 when decay is disabled).
	pub base_level: f64,
	/// The logistic noise term.
	pub noise: f64,
	/// The similarity mismatch penalty, when partial matching applied.
	pub mismatch: Option<f64>,
	/// The summed activation.
	pub activation: f64,
	/// For blending operations, this chunk's softmax weight share.
	pub retrieval_probability: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
	use super::*;

	fn isclose(a: f64, b: f64) -> bool {
		(a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
	}

	#[test]
	fn test_zero_decay_is_scale_free() {
		// ln(n) no matter where the references sit
		assert!(isclose(
			base_level_exact(&[1.0, 4.0], 11.0, 0.0).unwrap(),
			2.0_f64.ln()
		));
		assert!(isclose(
			base_level_exact(&[10.0, 10.0], 10.0, 0.0).unwrap(),
			2.0_f64.ln()
		));
		assert!(isclose(
			base_level_count_only(5, 0.0, 0.0, 0.0).unwrap(),
			5.0_f64.ln()
		));
		assert!(isclose(
			base_level_window(&[3.0], 4, 0.0, 3.0, 0.0).unwrap(),
			4.0_f64.ln()
		));
	}

	#[test]
	fn test_exact_reference_values() {
		// references at 1 and 4, examined at 11, decay 0.8
		assert!(isclose(
			base_level_exact(&[1.0, 4.0], 11.0, 0.8).unwrap(),
			-1.0281200094565899
		));
		// single reference of age 1 contributes ln(1) = 0
		assert!(isclose(base_level_exact(&[0.0], 1.0, 0.5).unwrap(), 0.0));
	}

	#[test]
	fn test_exact_requires_strictly_past_references() {
		assert!(matches!(
			base_level_exact(&[2.0], 2.0, 0.5),
			Err(MemoryError::ChunkNotInPast(_))
		));
		assert!(matches!(
			base_level_exact(&[3.0], 2.0, 0.5),
			Err(MemoryError::ChunkNotInPast(_))
		));
	}

	#[test]
	fn test_count_only_matches_closed_form() {
		let b = base_level_count_only(2, 0.0, 11.0, 0.5).unwrap();
		assert!(isclose(b, (2.0 / 0.5_f64).ln() - 0.5 * 11.0_f64.ln()));
	}

	#[test]
	fn test_count_only_requires_past_creation() {
		assert!(matches!(
			base_level_count_only(1, 5.0, 5.0, 0.5),
			Err(MemoryError::ChunkNotInPast(_))
		));
	}

	#[test]
	fn test_window_with_all_references_retained_is_exact() {
		let refs = [1.0, 2.5, 4.0, 7.0];
		let exact = base_level_exact(&refs, 10.0, 0.5).unwrap();
		let windowed = base_level_window(&refs, 4, 1.0, 10.0, 0.5).unwrap();
		assert!(isclose(exact, windowed));
	}

	#[test]
	fn test_window_with_nothing_retained_is_count_only() {
		let windowed = base_level_window(&[], 6, 2.0, 10.0, 0.5).unwrap();
		let counted = base_level_count_only(6, 2.0, 10.0, 0.5).unwrap();
		assert!(isclose(windowed, counted));
	}

	#[test]
	fn test_window_interpolates_between_exact_and_count_only() {
		// uniformly spread rehearsals, so all three regimes should agree
		// within the approximation's coarse tolerance
		let refs: Vec<f64> = (0..20).map(|i| f64::from(i) + 0.5).collect();
		let time = 20.5;
		let creation = refs[0];
		let exact = base_level_exact(&refs, time, 0.5).unwrap();
		let counted = base_level_count_only(20, creation, time, 0.5).unwrap();
		let windowed = base_level_window(&refs[15..], 20, creation, time, 0.5).unwrap();
		assert!(
			(exact - counted).abs() < 0.2,
			"count-only drifted: {exact} vs {counted}"
		);
		assert!(
			(exact - windowed).abs() < 0.05,
			"window drifted: {exact} vs {windowed}"
		);
		// the bounded form should sit closer to the truth than the full
		// approximation, having kept the recent (dominant) references
		assert!((exact - windowed).abs() <= (exact - counted).abs());
	}

	#[test]
	fn test_window_degenerate_span_falls_back_to_point_mass() {
		// every retained reference at the creation time
		let b = base_level_window(&[0.0, 0.0], 5, 0.0, 8.0, 0.5).unwrap();
		// 2 exact terms of age 8 plus 3 approximated at age 8
		let expected = (5.0 * 8.0_f64.powf(-0.5)).ln();
		assert!(isclose(b, expected));
	}

	#[test]
	fn test_more_recent_references_activate_higher() {
		let recent = base_level_exact(&[9.0], 10.0, 0.5).unwrap();
		let old = base_level_exact(&[1.0], 10.0, 0.5).unwrap();
		assert!(recent > old);
	}

	#[test]
	fn test_empty_history_is_not_silently_zero() {
		assert!(matches!(
			base_level_exact(&[], 10.0, 0.5),
			Err(MemoryError::NonFiniteActivation(_))
		));
	}
}
