//! # Recollect
//!
//! An embeddable ACT-R declarative memory: chunks with activation-based
//! retrieval, blending, and salience.
//!
//! ## Why Activation?
//!
//! A database answers "what did I store?"; a declarative memory answers
//! "what would I remember right now?". The difference is activation:
//!
//! - **Recency and frequency matter** - Often-rehearsed, recently-used
//!   items come back readily; stale ones fade below reach
//! - **Recall is stochastic** - The same query can return different
//!   answers at different moments
//! - **Near misses count** - A chunk that almost matches can still win
//!   when similarity is allowed to stand in for equality
//! - **Answers can be consensus** - Blending averages over everything
//!   relevant instead of picking one winner
//!
//! ## Core Concepts
//!
//! ### Activation
//!
//! A chunk reinforced at times `t_1 … t_n` and queried at time `t` has
//! the activation
//!
//! ```text
//! a = ln[Σ(t − t_k)^(-d)] + ε + μ·Σ w_f (s_f − 1)
//! ```
//!
//! the sum of a base level (decay exponent `d`), logistic noise `ε` with
//! scale `s`, and, under partial matching, a penalty per query attribute
//! `f` whose similarity `s_f` falls short of equality. Histories too long
//! to keep can be approximated from a count, or from a count plus a
//! bounded window of recent reinforcements.
//!
//! ### Retrieval and Blending
//!
//! Retrieval surfaces the chunk with the highest activation at or above
//! the retrieval threshold. Blending instead weights every matching chunk
//! by its retrieval probability
//!
//! ```text
//! p_i = exp(a_i/τ) / Σ exp(a_j/τ)
//! ```
//!
//! and returns the expectation of an outcome attribute (or, discretely,
//! the outcome value with the most probability mass). Salience reports
//! which chunks and which query attributes pulled the blend where it
//! landed.
//!
//! ## Example
//!
//! ```rust
//! use recollect_core::{slots, Advance, Memory};
//!
//! # fn main() -> recollect_core::Result<()> {
//! let mut memory = Memory::with_seed(42);
//!
//! // one simulated trial per time unit
//! memory.learn_and_advance(slots! { "door" => "left",  "payoff" => 0 }, Advance::Unit)?;
//! memory.learn_and_advance(slots! { "door" => "right", "payoff" => 5 }, Advance::Unit)?;
//! memory.learn_and_advance(slots! { "door" => "right", "payoff" => 0 }, Advance::Unit)?;
//!
//! // which door does experience favor?
//! let candidates = vec![slots! { "door" => "left" }, slots! { "door" => "right" }];
//! if let Some((best, value)) = memory.best_blend("payoff", &candidates, false)? {
//!     println!("door {best} blends to {value:.3}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Notes
//!
//! - Every `Memory` is self-contained: its own clock, parameters,
//!   similarity registry, and seeded random generator. No globals.
//! - Time is a dimensionless real moved explicitly by the caller; the
//!   library never reads a wall clock.
//! - All values are hashable by construction (floats compare by
//!   canonicalized bit pattern), so any value can key the store.
//!
//! ## References
//!
//! - Anderson, J. R. & Lebiere, C. (1998). *The Atomic Components of
//!   Thought* - ACT-R declarative memory
//! - Lebiere, C. (1999). *The dynamics of cognition: An ACT-R model of
//!   cognitive arithmetic* - blending
//! - Petrov, A. (2006). *Computationally efficient approximation of the
//!   base-level learning equation in ACT-R* - optimized learning

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activation;
pub mod blending;
pub mod chunk;
pub mod error;
mod index;
pub mod memory;
mod noise;
pub mod similarity;
pub mod value;

pub use activation::{
	base_level_count_only, base_level_exact, base_level_window, ActivationTrace,
};
pub use blending::{BlendResult, FeatureSalience, InstanceSalience, SalienceOptions};
pub use chunk::{Chunk, ReferenceTrace, References};
pub use error::{MemoryError, Result};
pub use memory::{Advance, Memory, OptimizedLearning};
pub use similarity::{SimilarityFn, SimilarityRegistry};
pub use value::{Signature, Slots, Value};

/// Default activation noise scale.
pub const DEFAULT_NOISE: f64 = 0.25;

/// Default base-level decay exponent.
pub const DEFAULT_DECAY: f64 = 0.5;

/// Default retrieval threshold.
pub const DEFAULT_THRESHOLD: f64 = -10.0;

/// Smallest usable blending temperature; softmax weights degenerate
/// numerically below this.
pub const MINIMUM_TEMPERATURE: f64 = 0.01;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
