//! Per-attribute similarity functions for partial matching.
//!
//! An attribute with a registered similarity function participates in
//! partial matching: instead of excluding a chunk whose value differs from
//! the query, the difference contributes a non-positive penalty
//! `weight × (similarity − 1)`, later scaled by the store's mismatch
//! coefficient.
//!
//! Two range conventions exist. The "natural" convention maps identical
//! values to 1 and completely dissimilar values to 0. The traditional ACT-R
//! convention instead uses 0 for identical and −1 for completely dissimilar;
//! internally ACT-R results are shifted by +1 so the penalty arithmetic is
//! shared.
//!
//! Registered functions must be deterministic and symmetric; each
//! attribute's pairwise results are memoized under the unordered value pair.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MemoryError, Result};
use crate::value::Value;

/// A similarity comparator for one attribute.
#[derive(Clone)]
pub enum SimilarityFn {
	/// 1 if the two values are equal, 0 otherwise. With a weight `w` this
	/// amounts to a fixed penalty of `w` for any differing value.
	Identity,
	/// A custom comparator. Must be deterministic and symmetric, and must
	/// return values within the active convention's range.
	Custom(Arc<dyn Fn(&Value, &Value) -> f64 + Send + Sync>),
}

impl SimilarityFn {
	/// Wraps a closure as a custom comparator.
	pub fn custom(f: impl Fn(&Value, &Value) -> f64 + Send + Sync + 'static) -> Self {
		Self::Custom(Arc::new(f))
	}
}

impl std::fmt::Debug for SimilarityFn {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Identity => write!(f, "SimilarityFn::Identity"),
			Self::Custom(_) => write!(f, "SimilarityFn::Custom(..)"),
		}
	}
}

#[derive(Debug)]
struct Entry {
	function: SimilarityFn,
	weight: f64,
	cache: HashMap<(Value, Value), f64>,
}

/// Registry of similarity functions, weights, and memoized results.
///
/// Owned by a single [`Memory`](crate::Memory); registrations never leak
/// across instances.
#[derive(Debug, Default)]
pub struct SimilarityRegistry {
	entries: HashMap<String, Entry>,
	actr_convention: bool,
}

impl SimilarityRegistry {
	/// Whether the traditional ACT-R similarity range is in effect.
	#[must_use]
	pub const fn uses_actr_convention(&self) -> bool {
		self.actr_convention
	}

	/// Switches between the natural `[0, 1]` and ACT-R `[-1, 0]` range
	/// conventions, invalidating all memoized results.
	pub fn set_actr_convention(&mut self, value: bool) {
		if value != self.actr_convention {
			self.actr_convention = value;
			for entry in self.entries.values_mut() {
				entry.cache.clear();
			}
		}
	}

	/// Registers, updates, or removes the similarity entry for each named
	/// attribute.
	///
	/// Supplying neither a function nor a weight removes the entries,
	/// reverting those attributes to exact-match-only. Otherwise the given
	/// parts replace the corresponding parts of any existing entry; an
	/// absent part defaults to [`SimilarityFn::Identity`] or weight 1.
	///
	/// # Errors
	///
	/// Returns [`MemoryError::InvalidSimilarityWeight`] for a negative or
	/// non-finite weight.
	pub fn set(
		&mut self,
		attributes: &[&str],
		function: Option<SimilarityFn>,
		weight: Option<f64>,
	) -> Result<()> {
		if let Some(w) = weight {
			if !w.is_finite() || w < 0.0 {
				return Err(MemoryError::InvalidSimilarityWeight(w));
			}
		}
		if function.is_none() && weight.is_none() {
			for attribute in attributes {
				let _ = self.entries.remove(*attribute);
			}
			return Ok(());
		}
		for attribute in attributes {
			let entry = self.entries.entry((*attribute).to_owned());
			match entry {
				std::collections::hash_map::Entry::Occupied(mut o) => {
					let e = o.get_mut();
					if let Some(f) = &function {
						e.function = f.clone();
					}
					if let Some(w) = weight {
						e.weight = w;
					}
					e.cache.clear();
				}
				std::collections::hash_map::Entry::Vacant(v) => {
					let _ = v.insert(Entry {
						function: function.clone().unwrap_or(SimilarityFn::Identity),
						weight: weight.unwrap_or(1.0),
						cache: HashMap::new(),
					});
				}
			}
		}
		Ok(())
	}

	/// Whether the named attribute has a similarity function and thus
	/// participates in partial matching.
	#[must_use]
	pub fn has_function(&self, attribute: &str) -> bool {
		self.entries.contains_key(attribute)
	}

	/// The penalty weight for the named attribute (1 when unregistered).
	#[must_use]
	pub fn weight(&self, attribute: &str) -> f64 {
		self.entries.get(attribute).map_or(1.0, |e| e.weight)
	}

	/// The natural similarity of two values under the named attribute.
	///
	/// Returns `Ok(None)` when the attribute has no similarity function
	/// (such attributes must match exactly). Identical values are always
	/// completely similar without consulting the function.
	///
	/// # Errors
	///
	/// Returns [`MemoryError::SimilarityOutOfRange`] when a custom function
	/// returns a value outside the active convention's range.
	pub fn similarity(&mut self, attribute: &str, x: &Value, y: &Value) -> Result<Option<f64>> {
		let actr = self.actr_convention;
		let Some(entry) = self.entries.get_mut(attribute) else {
			return Ok(None);
		};
		if x == y {
			return Ok(Some(1.0));
		}
		let function = match &entry.function {
			SimilarityFn::Identity => return Ok(Some(0.0)),
			SimilarityFn::Custom(f) => f,
		};
		let key = if x <= y {
			(x.clone(), y.clone())
		} else {
			(y.clone(), x.clone())
		};
		if let Some(&cached) = entry.cache.get(&key) {
			return Ok(Some(cached));
		}
		let raw = function(x, y);
		let (minimum, maximum) = if actr { (-1.0, 0.0) } else { (0.0, 1.0) };
		if !raw.is_finite() || raw < minimum || raw > maximum {
			return Err(MemoryError::SimilarityOutOfRange {
				attribute: attribute.to_owned(),
				value: raw,
				minimum,
				maximum,
			});
		}
		let natural = if actr { raw + 1.0 } else { raw };
		let _ = entry.cache.insert(key, natural);
		Ok(Some(natural))
	}

	#[cfg(test)]
	fn cached_pairs(&self, attribute: &str) -> usize {
		self.entries.get(attribute).map_or(0, |e| e.cache.len())
	}
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::unwrap_used)]
mod tests {
	use super::*;

	fn ratio() -> SimilarityFn {
		// 1 - |x - y| / max(x, y), the classic magnitude similarity.
		SimilarityFn::custom(|x, y| {
			let (a, b) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
			let (lo, hi) = if a < b { (a, b) } else { (b, a) };
			1.0 - (hi - lo) / hi
		})
	}

	#[test]
	fn test_unregistered_attribute_has_no_similarity() {
		let mut r = SimilarityRegistry::default();
		assert!(r
			.similarity("b", &Value::Int(4), &Value::Int(3))
			.unwrap()
			.is_none());
		assert!(!r.has_function("b"));
	}

	#[test]
	fn test_identical_values_are_completely_similar() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(ratio()), None).unwrap();
		assert_eq!(
			r.similarity("a", &Value::Int(3), &Value::Int(3)).unwrap(),
			Some(1.0)
		);
		// no cache entry for the trivial case
		assert_eq!(r.cached_pairs("a"), 0);
	}

	#[test]
	fn test_identity_function_is_all_or_nothing() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(SimilarityFn::Identity), Some(2.0)).unwrap();
		assert_eq!(
			r.similarity("a", &Value::Int(1), &Value::Int(2)).unwrap(),
			Some(0.0)
		);
		assert_eq!(r.weight("a"), 2.0);
	}

	#[test]
	fn test_results_are_memoized_unordered() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(ratio()), None).unwrap();
		let s1 = r.similarity("a", &Value::Num(3.0), &Value::Num(4.0)).unwrap();
		assert_eq!(s1, Some(0.75));
		assert_eq!(r.cached_pairs("a"), 1);
		let s2 = r.similarity("a", &Value::Num(4.0), &Value::Num(3.0)).unwrap();
		assert_eq!(s2, Some(0.75));
		assert_eq!(r.cached_pairs("a"), 1);
	}

	#[test]
	fn test_redefinition_invalidates_cache() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(ratio()), None).unwrap();
		let _ = r.similarity("a", &Value::Num(3.0), &Value::Num(4.0)).unwrap();
		assert_eq!(r.cached_pairs("a"), 1);
		r.set(
			&["a"],
			Some(SimilarityFn::custom(|_, _| 0.5)),
			None,
		)
		.unwrap();
		assert_eq!(r.cached_pairs("a"), 0);
		assert_eq!(
			r.similarity("a", &Value::Num(3.0), &Value::Num(4.0)).unwrap(),
			Some(0.5)
		);
	}

	#[test]
	fn test_weight_update_keeps_function_but_drops_cache() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(ratio()), None).unwrap();
		let _ = r.similarity("a", &Value::Num(3.0), &Value::Num(4.0)).unwrap();
		r.set(&["a"], None, Some(0.5)).unwrap();
		assert_eq!(r.weight("a"), 0.5);
		assert_eq!(r.cached_pairs("a"), 0);
		assert_eq!(
			r.similarity("a", &Value::Num(3.0), &Value::Num(4.0)).unwrap(),
			Some(0.75)
		);
	}

	#[test]
	fn test_removal_reverts_to_exact_matching() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a", "b"], Some(SimilarityFn::Identity), None).unwrap();
		assert!(r.has_function("a") && r.has_function("b"));
		r.set(&["a"], None, None).unwrap();
		assert!(!r.has_function("a"));
		assert!(r.has_function("b"));
	}

	#[test]
	fn test_out_of_range_similarity_is_an_error() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(SimilarityFn::custom(|_, _| 1.5)), None)
			.unwrap();
		let err = r.similarity("a", &Value::Int(1), &Value::Int(2)).unwrap_err();
		assert!(matches!(
			err,
			MemoryError::SimilarityOutOfRange { value, .. } if value == 1.5
		));
	}

	#[test]
	fn test_actr_convention_shifts_range() {
		let mut r = SimilarityRegistry::default();
		r.set_actr_convention(true);
		r.set(
			&["a"],
			Some(SimilarityFn::custom(|_, _| -0.25)),
			None,
		)
		.unwrap();
		// -0.25 in ACT-R terms is 0.75 naturally
		assert_eq!(
			r.similarity("a", &Value::Int(1), &Value::Int(2)).unwrap(),
			Some(0.75)
		);
		// a natural-range function is now out of range
		r.set(&["b"], Some(SimilarityFn::custom(|_, _| 0.5)), None)
			.unwrap();
		assert!(r.similarity("b", &Value::Int(1), &Value::Int(2)).is_err());
	}

	#[test]
	fn test_convention_change_invalidates_cache() {
		let mut r = SimilarityRegistry::default();
		r.set(&["a"], Some(ratio()), None).unwrap();
		let _ = r.similarity("a", &Value::Num(3.0), &Value::Num(4.0)).unwrap();
		assert_eq!(r.cached_pairs("a"), 1);
		r.set_actr_convention(true);
		assert_eq!(r.cached_pairs("a"), 0);
	}

	#[test]
	fn test_negative_weight_rejected() {
		let mut r = SimilarityRegistry::default();
		assert!(matches!(
			r.set(&["a"], Some(SimilarityFn::Identity), Some(-1.0)),
			Err(MemoryError::InvalidSimilarityWeight(_))
		));
		assert!(!r.has_function("a"));
	}
}
