//! Attribute values and slot collections.
//!
//! Chunks and queries describe things with named attributes ("slots"). A
//! [`Value`] is anything a slot can hold. Unlike a dynamically typed host,
//! hashability is guaranteed by construction: floating point values compare
//! and hash by canonicalized bit pattern, so every `Value` can key the chunk
//! store and the similarity caches.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Canonical bit pattern used for every NaN so that NaN == NaN.
const CANONICAL_NAN: u64 = 0x7ff8_0000_0000_0000;

/// A single attribute value.
///
/// `Nil` is the null sentinel back-filled for declared index attributes that a
/// learned chunk omits; it is distinct from every other value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Value {
	/// The null sentinel.
	Nil,
	/// A boolean.
	Bool(bool),
	/// A signed integer.
	Int(i64),
	/// A floating point number. Distinct from `Int` even when numerically equal.
	Num(f64),
	/// A string.
	Str(String),
}

impl Value {
	/// The numeric reading of this value, if it has one.
	///
	/// Only `Int` and `Num` are numeric; blending an outcome attribute
	/// requires every matched value to answer `Some` here.
	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			Self::Int(i) => {
				#[allow(clippy::cast_precision_loss)]
				Some(*i as f64)
			}
			Self::Num(x) => Some(*x),
			_ => None,
		}
	}

	/// Whether this is the null sentinel.
	#[must_use]
	pub const fn is_nil(&self) -> bool {
		matches!(self, Self::Nil)
	}

	fn num_bits(x: f64) -> u64 {
		if x.is_nan() {
			CANONICAL_NAN
		} else if x == 0.0 {
			0 // collapse -0.0 and +0.0
		} else {
			x.to_bits()
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Nil, Self::Nil) => true,
			(Self::Bool(a), Self::Bool(b)) => a == b,
			(Self::Int(a), Self::Int(b)) => a == b,
			(Self::Num(a), Self::Num(b)) => Self::num_bits(*a) == Self::num_bits(*b),
			(Self::Str(a), Self::Str(b)) => a == b,
			_ => false,
		}
	}
}

impl Eq for Value {}

impl Hash for Value {
	fn hash<H: Hasher>(&self, state: &mut H) {
		core::mem::discriminant(self).hash(state);
		match self {
			Self::Nil => {}
			Self::Bool(b) => b.hash(state),
			Self::Int(i) => i.hash(state),
			Self::Num(x) => Self::num_bits(*x).hash(state),
			Self::Str(s) => s.hash(state),
		}
	}
}

impl PartialOrd for Value {
	fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for Value {
	fn cmp(&self, other: &Self) -> std::cmp::Ordering {
		fn rank(v: &Value) -> u8 {
			match v {
				Value::Nil => 0,
				Value::Bool(_) => 1,
				Value::Int(_) => 2,
				Value::Num(_) => 3,
				Value::Str(_) => 4,
			}
		}
		match (self, other) {
			(Self::Bool(a), Self::Bool(b)) => a.cmp(b),
			(Self::Int(a), Self::Int(b)) => a.cmp(b),
			(Self::Num(a), Self::Num(b)) => a.total_cmp(b),
			(Self::Str(a), Self::Str(b)) => a.cmp(b),
			_ => rank(self).cmp(&rank(other)),
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Nil => write!(f, "nil"),
			Self::Bool(b) => write!(f, "{b}"),
			Self::Int(i) => write!(f, "{i}"),
			Self::Num(x) => write!(f, "{x}"),
			Self::Str(s) => write!(f, "{s}"),
		}
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Self::Bool(b)
	}
}

impl From<i64> for Value {
	fn from(i: i64) -> Self {
		Self::Int(i)
	}
}

impl From<i32> for Value {
	fn from(i: i32) -> Self {
		Self::Int(i64::from(i))
	}
}

impl From<u32> for Value {
	fn from(i: u32) -> Self {
		Self::Int(i64::from(i))
	}
}

impl From<f64> for Value {
	fn from(x: f64) -> Self {
		Self::Num(x)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Self::Str(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Self::Str(s)
	}
}

impl<T: Into<Value>> From<Option<T>> for Value {
	fn from(v: Option<T>) -> Self {
		v.map_or(Self::Nil, Into::into)
	}
}

/// An unordered collection of named attribute values.
///
/// Iteration order is always sorted by attribute name, so a chunk's signature
/// falls directly out of iterating its slots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots(BTreeMap<String, Value>);

impl Slots {
	/// Creates an empty slot collection.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets an attribute, replacing any previous value, and returns `self`
	/// for chaining.
	#[must_use]
	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		let _ = self.0.insert(name.into(), value.into());
		self
	}

	/// Sets an attribute in place.
	pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
		let _ = self.0.insert(name.into(), value.into());
	}

	/// Looks up an attribute by name.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.0.get(name)
	}

	/// Whether the named attribute is present.
	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Number of attributes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether there are no attributes at all.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over `(name, value)` pairs in name order.
	pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
		self.0.iter()
	}

	/// Iterates over attribute names in order.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}
}

impl<'a> IntoIterator for &'a Slots {
	type Item = (&'a String, &'a Value);
	type IntoIter = btree_map::Iter<'a, String, Value>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Slots {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

/// The identity of a chunk: its sorted `(name, value)` pairs.
///
/// The store is a bijection between signatures and chunks; learning the same
/// signature twice reinforces rather than duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(Vec<(String, Value)>);

impl Signature {
	/// The sorted `(name, value)` pairs.
	#[must_use]
	pub fn pairs(&self) -> &[(String, Value)] {
		&self.0
	}

	/// The sorted attribute names.
	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|(n, _)| n.as_str())
	}

	/// The value stored for the named attribute, if any.
	#[must_use]
	pub fn value(&self, name: &str) -> Option<&Value> {
		self.0
			.binary_search_by(|(n, _)| n.as_str().cmp(name))
			.ok()
			.map(|i| &self.0[i].1)
	}
}

impl From<&Slots> for Signature {
	fn from(slots: &Slots) -> Self {
		Self(
			slots
				.iter()
				.map(|(n, v)| (n.clone(), v.clone()))
				.collect(),
		)
	}
}

/// Builds a [`Slots`] from `name => value` pairs.
///
/// ```
/// use recollect_core::{slots, Value};
///
/// let s = slots! { "color" => "red", "size" => 4 };
/// assert_eq!(s.get("size"), Some(&Value::Int(4)));
/// ```
#[macro_export]
macro_rules! slots {
	() => { $crate::Slots::new() };
	($($name:expr => $value:expr),+ $(,)?) => {{
		let mut s = $crate::Slots::new();
		$( s.set($name, $value); )+
		s
	}};
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
	use super::*;
	use std::collections::hash_map::DefaultHasher;

	fn hash_of(v: &Value) -> u64 {
		let mut h = DefaultHasher::new();
		v.hash(&mut h);
		h.finish()
	}

	#[test]
	fn test_zero_and_negative_zero_are_one_value() {
		assert_eq!(Value::Num(0.0), Value::Num(-0.0));
		assert_eq!(hash_of(&Value::Num(0.0)), hash_of(&Value::Num(-0.0)));
	}

	#[test]
	fn test_nan_equals_itself() {
		assert_eq!(Value::Num(f64::NAN), Value::Num(f64::NAN));
		assert_eq!(
			hash_of(&Value::Num(f64::NAN)),
			hash_of(&Value::Num(f64::NAN))
		);
	}

	#[test]
	fn test_int_and_num_are_distinct() {
		assert_ne!(Value::Int(1), Value::Num(1.0));
	}

	#[test]
	fn test_nil_sentinel() {
		assert!(Value::Nil.is_nil());
		assert_ne!(Value::Nil, Value::Bool(false));
		assert_ne!(Value::Nil, Value::Int(0));
		assert_eq!(Value::from(None::<i64>), Value::Nil);
	}

	#[test]
	fn test_numeric_reading() {
		assert_eq!(Value::Int(3).as_f64(), Some(3.0));
		assert_eq!(Value::Num(2.5).as_f64(), Some(2.5));
		assert_eq!(Value::from("x").as_f64(), None);
		assert_eq!(Value::Bool(true).as_f64(), None);
	}

	#[test]
	fn test_slots_sorted_iteration() {
		let s = slots! { "zebra" => 1, "apple" => 2, "mango" => 3 };
		let names: Vec<&str> = s.names().collect();
		assert_eq!(names, vec!["apple", "mango", "zebra"]);
	}

	#[test]
	fn test_signature_insensitive_to_insertion_order() {
		let a = slots! { "color" => "red", "size" => 4 };
		let b = slots! { "size" => 4, "color" => "red" };
		assert_eq!(Signature::from(&a), Signature::from(&b));
	}

	#[test]
	fn test_signature_value_lookup() {
		let sig = Signature::from(&slots! { "a" => 1, "b" => "x", "c" => 2.0 });
		assert_eq!(sig.value("b"), Some(&Value::from("x")));
		assert_eq!(sig.value("d"), None);
	}
}
