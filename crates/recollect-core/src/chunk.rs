//! Chunks: learned items and their reinforcement histories.
//!
//! A chunk's attributes are fixed at creation; only its reinforcement
//! history changes afterwards. How much of that history is retained depends
//! on the store's optimized-learning mode:
//!
//! - **Exact** — every reinforcement timestamp (unbounded).
//! - **Window** — the `k` most recent timestamps plus a total count.
//! - **Count** — only the total count.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::value::Value;

/// Reinforcement history of a single chunk.
#[derive(Clone, Debug)]
pub enum References {
	/// Every reinforcement timestamp, in the order recorded.
	Exact(SmallVec<[f64; 4]>),
	/// The most recent timestamps up to a fixed capacity, plus a total count.
	Window {
		/// Retained timestamps, oldest first.
		recent: VecDeque<f64>,
		/// Maximum number of retained timestamps.
		cap: usize,
		/// Total number of reinforcements, including discarded ones.
		count: u64,
	},
	/// Only the total number of reinforcements.
	Count(u64),
}

impl References {
	/// Records one reinforcement at `time`.
	pub fn cite(&mut self, time: f64) {
		match self {
			Self::Exact(times) => times.push(time),
			Self::Window { recent, cap, count } => {
				recent.push_back(time);
				while recent.len() > *cap {
					let _ = recent.pop_front();
				}
				*count += 1;
			}
			Self::Count(count) => *count += 1,
		}
	}

	/// Removes one reinforcement recorded at exactly `when`.
	///
	/// Only meaningful for exact histories; returns whether a matching
	/// reference was found and removed.
	pub fn uncite(&mut self, when: f64) -> bool {
		match self {
			Self::Exact(times) => {
				if let Some(i) = times.iter().position(|&t| t == when) {
					let _ = times.remove(i);
					true
				} else {
					false
				}
			}
			_ => false,
		}
	}

	/// Total number of reinforcements recorded.
	#[must_use]
	pub fn count(&self) -> u64 {
		match self {
			Self::Exact(times) => times.len() as u64,
			Self::Window { count, .. } | Self::Count(count) => *count,
		}
	}

	/// The most recent reinforcement timestamp still retained, if any.
	#[must_use]
	pub fn newest(&self) -> Option<f64> {
		match self {
			Self::Exact(times) => times.iter().copied().fold(None, |acc, t| {
				Some(acc.map_or(t, |a: f64| a.max(t)))
			}),
			Self::Window { recent, .. } => {
				recent.iter().copied().fold(None, |acc, t| {
					Some(acc.map_or(t, |a: f64| a.max(t)))
				})
			}
			Self::Count(_) => None,
		}
	}
}

/// How a chunk's history appears in an activation trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReferenceTrace {
	/// Retained reinforcement timestamps.
	Times(Vec<f64>),
	/// Only a count is retained (optimized learning).
	Counted(u64),
}

/// A learned item: immutable attributes plus a mutable reinforcement history.
///
/// Chunks are owned exclusively by the [`Memory`](crate::Memory) that created
/// them and are handed out to callers by reference only.
#[derive(Clone, Debug)]
pub struct Chunk {
	name: String,
	attributes: BTreeMap<String, Value>,
	creation: f64,
	references: References,
}

impl Chunk {
	pub(crate) fn new(
		name: String,
		attributes: BTreeMap<String, Value>,
		creation: f64,
		references: References,
	) -> Self {
		Self {
			name,
			attributes,
			creation,
			references,
		}
	}

	/// The chunk's name, unique within its memory (`"0000"`, `"0001"`, ...).
	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	/// The attribute value stored under `name`, if present.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.attributes.get(name)
	}

	/// All attributes, sorted by name.
	pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.attributes.iter().map(|(n, v)| (n.as_str(), v))
	}

	/// The clock value at which this chunk was first learned.
	#[must_use]
	pub const fn creation_time(&self) -> f64 {
		self.creation
	}

	/// How many times this chunk has been learned or rehearsed.
	#[must_use]
	pub fn reference_count(&self) -> u64 {
		self.references.count()
	}

	/// The reinforcement history.
	#[must_use]
	pub const fn references(&self) -> &References {
		&self.references
	}

	pub(crate) fn references_mut(&mut self) -> &mut References {
		&mut self.references
	}

	pub(crate) fn collapse_to_origin(&mut self) {
		self.references = match &self.references {
			References::Exact(_) => References::Exact(SmallVec::from_slice(&[0.0])),
			References::Window { cap, .. } => {
				let mut recent = VecDeque::with_capacity(*cap);
				recent.push_back(0.0);
				References::Window {
					recent,
					cap: *cap,
					count: 1,
				}
			}
			References::Count(_) => References::Count(1),
		};
	}

	/// A serializable summary of the history, as recorded in traces.
	#[must_use]
	pub fn reference_trace(&self) -> ReferenceTrace {
		match &self.references {
			References::Exact(times) => ReferenceTrace::Times(times.to_vec()),
			References::Window { count, .. } | References::Count(count) => {
				ReferenceTrace::Counted(*count)
			}
		}
	}
}
