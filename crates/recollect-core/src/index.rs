//! Candidate selection indexes.
//!
//! Two structures drive matching:
//!
//! - the **slot-name index** maps each exact set of attribute names to the
//!   chunks carrying exactly those names; a query walks the name sets that
//!   are supersets of its condition names;
//! - the **fast index**, populated only when the store declares index
//!   attributes, buckets chunks by the tuple of their values for those
//!   attributes, giving O(1) lookup for the common always-exact-match case.
//!
//! Both must remain exactly consistent with the store under every
//! insert/delete sequence; the fast index is an accelerator, never a
//! different answer.

use std::collections::HashMap;

use crate::value::{Signature, Slots, Value};

/// Membership indexes over the chunk store, keyed by signature.
#[derive(Debug, Default)]
pub(crate) struct StoreIndex {
	by_names: HashMap<Vec<String>, Vec<Signature>>,
	fast_attributes: Vec<String>,
	fast: HashMap<Vec<Value>, Vec<Signature>>,
}

impl StoreIndex {
	/// The declared fast-index attributes, sorted; empty when disabled.
	pub(crate) fn fast_attributes(&self) -> &[String] {
		&self.fast_attributes
	}

	/// Declares the fast-index attributes. Callers guarantee the store is
	/// empty; `attributes` must be sorted and duplicate-free.
	pub(crate) fn set_fast_attributes(&mut self, attributes: Vec<String>) {
		debug_assert!(self.by_names.is_empty() && self.fast.is_empty());
		self.fast_attributes = attributes;
	}

	pub(crate) fn insert(&mut self, signature: &Signature) {
		let names: Vec<String> = signature.names().map(str::to_owned).collect();
		self.by_names
			.entry(names)
			.or_default()
			.push(signature.clone());
		if !self.fast_attributes.is_empty() {
			let key = self.fast_key_of(signature);
			self.fast.entry(key).or_default().push(signature.clone());
		}
	}

	pub(crate) fn remove(&mut self, signature: &Signature) {
		let names: Vec<String> = signature.names().map(str::to_owned).collect();
		if let Some(bucket) = self.by_names.get_mut(&names) {
			bucket.retain(|s| s != signature);
			if bucket.is_empty() {
				let _ = self.by_names.remove(&names);
			}
		}
		if !self.fast_attributes.is_empty() {
			let key = self.fast_key_of(signature);
			if let Some(bucket) = self.fast.get_mut(&key) {
				bucket.retain(|s| s != signature);
				if bucket.is_empty() {
					let _ = self.fast.remove(&key);
				}
			}
		}
	}

	pub(crate) fn clear(&mut self) {
		self.by_names.clear();
		self.fast.clear();
	}

	/// Signatures of every chunk whose attribute names are a superset of
	/// the given sorted condition names.
	pub(crate) fn scan(&self, condition_names: &[&str]) -> Vec<Signature> {
		let mut out = Vec::new();
		for (names, bucket) in &self.by_names {
			if is_sorted_subset(condition_names, names) {
				out.extend(bucket.iter().cloned());
			}
		}
		out
	}

	/// Fast-index bucket lookup, usable only when every declared attribute
	/// appears in the conditions; answers `None` otherwise.
	pub(crate) fn fast_lookup(&self, conditions: &Slots) -> Option<Vec<Signature>> {
		if self.fast_attributes.is_empty() {
			return None;
		}
		let mut key = Vec::with_capacity(self.fast_attributes.len());
		for attribute in &self.fast_attributes {
			key.push(conditions.get(attribute)?.clone());
		}
		Some(self.fast.get(&key).cloned().unwrap_or_default())
	}

	fn fast_key_of(&self, signature: &Signature) -> Vec<Value> {
		self.fast_attributes
			.iter()
			.map(|a| signature.value(a).cloned().unwrap_or(Value::Nil))
			.collect()
	}
}

/// Whether sorted `sub` is a subset of sorted `sup`.
fn is_sorted_subset(sub: &[&str], sup: &[String]) -> bool {
	let mut it = sup.iter();
	'outer: for needle in sub {
		for candidate in it.by_ref() {
			match candidate.as_str().cmp(needle) {
				std::cmp::Ordering::Less => {}
				std::cmp::Ordering::Equal => continue 'outer,
				std::cmp::Ordering::Greater => return false,
			}
		}
		return false;
	}
	true
}
