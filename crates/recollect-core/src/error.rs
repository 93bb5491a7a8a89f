//! Error types for memory operations.

use crate::value::Value;

/// Errors that can occur while configuring or querying a [`Memory`](crate::Memory).
///
/// Every operation either fully succeeds or fails with one of these, leaving the
/// store's prior state intact.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
	/// Noise must be a non-negative, finite number.
	#[error("The noise, {0}, must be a non-negative finite number")]
	InvalidNoise(f64),

	/// Decay must be a non-negative, finite number.
	#[error("The decay, {0}, must be a non-negative finite number")]
	InvalidDecay(f64),

	/// The retrieval threshold must be a finite number.
	#[error("The threshold, {0}, must be a finite number")]
	InvalidThreshold(f64),

	/// The mismatch penalty must be a non-negative, finite number.
	#[error("The mismatch penalty, {0}, must be a non-negative finite number")]
	InvalidMismatch(f64),

	/// A similarity weight must be a non-negative, finite number.
	#[error("The similarity weight, {0}, must be a non-negative finite number")]
	InvalidSimilarityWeight(f64),

	/// The effective blending temperature fell below the minimum floor.
	#[error("The temperature, {0}, must not be less than {minimum}", minimum = crate::MINIMUM_TEMPERATURE)]
	TemperatureTooLow(f64),

	/// Optimized learning requires a decay strictly less than one.
	#[error("Optimized learning cannot be used with a decay of {0}; it must be less than 1")]
	OptimizedLearningDecay(f64),

	/// The named parameter may only be changed while the store holds no chunks.
	#[error("The {0} parameter cannot be changed while the store contains chunks")]
	StoreNotEmpty(&'static str),

	/// A learn, forget, or query was attempted with no attributes at all.
	#[error("At least one attribute must be supplied")]
	NoAttributes,

	/// Attribute names must be non-empty strings.
	#[error("Attribute names must be non-empty strings")]
	EmptyAttributeName,

	/// The same attribute was named more than once in an index declaration.
	#[error("The attribute {0:?} appears more than once in the index")]
	DuplicateIndexAttribute(String),

	/// Individual references cannot be forgotten under optimized learning.
	#[error("forget is not supported when optimized learning is enabled")]
	ForgetOptimized,

	/// Activation was requested for a chunk not strictly older than the current time.
	#[error("Cannot compute the activation of a chunk at or before the time of its most recent reference (time {0})")]
	ChunkNotInPast(f64),

	/// A base-level computation produced a non-finite value.
	#[error("Non-finite value {0} encountered while computing base-level activation")]
	NonFiniteActivation(f64),

	/// A chunk participating in a blend carried a non-numeric outcome value.
	#[error("The value {value} of attribute {attribute:?} is not numeric and cannot be blended")]
	NonNumericOutcome {
		/// The outcome attribute being blended.
		attribute: String,
		/// The offending value.
		value: Value,
	},

	/// A similarity function returned a value outside the permitted range.
	#[error("The similarity {value} for attribute {attribute:?} is outside the range [{minimum}, {maximum}]")]
	SimilarityOutOfRange {
		/// The attribute whose similarity function misbehaved.
		attribute: String,
		/// The returned value.
		value: f64,
		/// Lower bound of the active similarity convention.
		minimum: f64,
		/// Upper bound of the active similarity convention.
		maximum: f64,
	},

	/// Time values and advancement amounts must be finite.
	#[error("The time amount, {0}, must be a finite number")]
	NonFiniteTime(f64),
}

/// Result type alias for memory operations.
pub type Result<T> = std::result::Result<T, MemoryError>;
