//! Rayo: Portable Fixed-Width SIMD With Constrained Indexed Access
//!
//! **Rayo** (Spanish: "lightning") abstracts hardware vector registers
//! behind compile-time backend tags, so numeric code written once runs on
//! native SIMD where the target has it and on a portable software fallback
//! everywhere else. Its reason to exist is the part most SIMD wrappers skip:
//! *indexed* memory traffic. Gather, scatter and scatter-with-accumulation
//! are first-class operations, and a caller-supplied [`Constraint`] declares
//! what is known about an index vector's structure so duplicate-destination
//! hazards can be resolved by the cheapest strategy that is still correct.
//!
//! # Design Principles
//!
//! - **The type is the instruction selector**: every vector is
//!   `Vector<I>` for a zero-sized backend tag `I`; picking a tag picks the
//!   machine code at compile time, with no runtime dispatch anywhere.
//! - **Two hooks buy the whole engine**: a backend that can only move a
//!   register to and from memory inherits correct implementations of every
//!   other operation; it overrides exactly the ones its hardware does
//!   better.
//! - **Constraints are contracts**: the engine never inspects indices at
//!   operation time. An asserted pattern that is false corrupts results
//!   (never memory, through the safe surface) by explicit contract.
//!
//! # Quick Start
//!
//! ```
//! use rayo::{indirect, Constraint, Simd};
//!
//! // One register of four doubles: k*a + b in a single fused step.
//! let a = Simd::<f64, 4>::from_slice(&[1.0, 2.0, 3.0, 4.0]);
//! let b = Simd::<f64, 4>::broadcast(0.5);
//! let c = Simd::<f64, 4>::broadcast(3.0).mul_add(a, b);
//!
//! let mut out = [0.0; 4];
//! c.write_to_slice(&mut out);
//! assert_eq!(out, [3.5, 6.5, 9.5, 12.5]);
//!
//! // Indexed accumulation: lanes 0..3 all land in a histogram, duplicate
//! // destinations merged because the indices are asserted monotonic.
//! let mut hist = [0.0f64; 10];
//! let idx = Simd::<i32, 4>::from_slice(&[4, 4, 7, 7]);
//! indirect(&mut hist, idx, Constraint::Monotonic).accumulate(c);
//! assert_eq!(hist[4], 10.0);
//! assert_eq!(hist[7], 22.0);
//! ```
//!
//! # Picking Constraints
//!
//! Use [`classify::partition`] to bucket a batch of index groups offline,
//! then issue one pass per bucket. When nothing is known about a group,
//! [`Constraint::None`] is always correct.

pub mod backends;
pub mod classify;
pub mod element;
pub mod error;
pub mod vector;

pub use backends::{IndexedBackend, Lanes, Native, VectorBackend};
pub use element::{Element, IndexElement};
pub use error::{RayoError, Result};
pub use vector::{indirect, Indirect, Vector};

/// The registered vector type for a scalar and lane count.
///
/// `Simd<f64, 4>` is AVX2-backed on targets compiled with `avx2` and `fma`
/// and array-backed elsewhere, with identical observable behavior. A
/// scalar/width pair with no registration fails to compile rather than
/// degrading to anything at runtime:
///
/// ```compile_fail
/// use rayo::Simd;
///
/// // No backend is registered for three lanes of f64.
/// let v = Simd::<f64, 3>::broadcast(1.0);
/// ```
pub type Simd<T, const N: usize> = Vector<Native<T, N>>;

/// A caller-asserted structural property of one index vector.
///
/// The assertion applies to the `WIDTH` lane indices of a single indexed
/// operation and selects the execution strategy for gathers, scatters and
/// scatter-adds. It is a contract, not a hint: the engine never verifies
/// it, and asserting a pattern the indices do not have yields unspecified
/// results. [`Constraint::holds_for`] exists for debug assertions and
/// tests, and the safe [`Indirect`] surface applies it in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Constraint {
    /// No structural guarantee; any two lanes may target the same location.
    #[default]
    None,
    /// All lane indices are pairwise distinct.
    Independent,
    /// Indices are non-decreasing, so duplicates form adjacent runs.
    Monotonic,
    /// `idx[i] == idx[0] + i` for every lane: one dense run.
    Contiguous,
    /// Every lane carries the same index.
    Constant,
}

impl Constraint {
    /// Whether this assertion is actually true of `group`.
    ///
    /// Intended for debug-mode hardening and test oracles; production
    /// dispatch deliberately never calls it.
    pub fn holds_for<T: IndexElement>(self, group: &[T]) -> bool {
        match self {
            Constraint::None => true,
            Constraint::Independent => group
                .iter()
                .enumerate()
                .all(|(i, a)| group[i + 1..].iter().all(|b| a != b)),
            Constraint::Monotonic => group.windows(2).all(|w| w[0] <= w[1]),
            Constraint::Contiguous => group
                .iter()
                .enumerate()
                .all(|(i, a)| a.offset() == group[0].offset() + i),
            Constraint::Constant => group.iter().all(|a| *a == group[0]),
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Constraint::None => "none",
            Constraint::Independent => "independent",
            Constraint::Monotonic => "monotonic",
            Constraint::Contiguous => "contiguous",
            Constraint::Constant => "constant",
        };
        f.write_str(name)
    }
}
