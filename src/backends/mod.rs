//! Backend implementations for fixed-width vector registers.
//!
//! A *backend* is a zero-sized tag type describing one combination of
//! scalar type, lane count and instruction set. The [`VectorBackend`] trait
//! is both the compile-time registry (width, scalar type, storage type) and
//! the software fallback engine: every operation beyond the two memory hooks
//! `copy_from`/`copy_to` has a default body that round-trips the register
//! through a stack buffer of scalar lanes. A hardware backend overrides the
//! operations its instruction set accelerates and inherits the rest
//! unchanged, with no runtime dispatch anywhere.
//!
//! # Backends
//!
//! - [`generic`]: portable array-backed registers for any registered
//!   scalar/width pair. Uses only the default bodies; serves as the
//!   correctness reference for every override.
//! - [`avx2`]: x86_64 AVX2/FMA registers for `f64x4` and `i32x4`, compiled
//!   only when both features are enabled for the target.
//!
//! # Safety
//!
//! The traits here are `unsafe` to implement: the fallback bodies trust that
//! `Store` holds exactly `WIDTH` lanes and that the memory hooks move exactly
//! `WIDTH` scalars. An implementation that breaks either promise makes safe
//! callers unsound. Overrides must also be observationally identical to the
//! default bodies they replace; they may differ in instruction selection
//! only, never in result.

use num_traits::{MulAdd, Zero};

use crate::element::{Element, IndexElement};
use crate::Constraint;

pub mod generic;

#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    target_feature = "fma"
))]
pub mod avx2;

/// A fixed-size stack buffer of scalar lanes, always `[Scalar; WIDTH]`.
///
/// The fallback engine stages register contents here whenever it has to
/// compute in scalar arithmetic.
pub trait LaneArray<T>: AsRef<[T]> + AsMut<[T]> + Copy {
    /// A buffer with every lane set to zero.
    fn zeroed() -> Self;
}

impl<T: Element, const N: usize> LaneArray<T> for [T; N] {
    #[inline(always)]
    fn zeroed() -> Self {
        [T::zero(); N]
    }
}

/// Compile-time descriptor and software fallback for one register shape.
///
/// Implementations supply the associated metadata plus the two memory hooks;
/// everything else comes for free from the default bodies. A backend that
/// can do better natively overrides the corresponding method.
///
/// # Safety
///
/// Implementations must guarantee:
/// - `Store` is `[Scalar; WIDTH]` (exactly `WIDTH` lanes);
/// - `copy_from` reads exactly `WIDTH` scalars, `copy_to` writes exactly
///   `WIDTH` scalars, both tolerating unaligned pointers;
/// - every overridden method produces bit-identical results to the default
///   body it replaces, for all inputs within the documented contracts.
pub unsafe trait VectorBackend {
    /// Number of scalar lanes in one register.
    const WIDTH: usize;

    /// The lane scalar type.
    type Scalar: Element;

    /// The in-register representation (a native vector type, or a plain
    /// array for the generic backend).
    type Register: Copy;

    /// The staging buffer type, always `[Scalar; WIDTH]`.
    type Store: LaneArray<Self::Scalar>;

    /// Loads a register from `WIDTH` consecutive scalars at `p`.
    ///
    /// # Safety
    ///
    /// `p` must be valid for reads of `WIDTH` scalars. No alignment
    /// requirement.
    unsafe fn copy_from(p: *const Self::Scalar) -> Self::Register;

    /// Stores a register to `WIDTH` consecutive scalars at `p`.
    ///
    /// # Safety
    ///
    /// `p` must be valid for writes of `WIDTH` scalars. No alignment
    /// requirement.
    unsafe fn copy_to(v: Self::Register, p: *mut Self::Scalar);

    /// Spills a register into a lane buffer.
    #[inline(always)]
    fn to_lanes(v: Self::Register) -> Self::Store {
        let mut a: Self::Store = LaneArray::zeroed();
        // SAFETY: `Store` holds exactly WIDTH lanes by the trait contract.
        unsafe { Self::copy_to(v, a.as_mut().as_mut_ptr()) };
        a
    }

    /// Fills a register from a lane buffer.
    #[inline(always)]
    fn from_lanes(a: Self::Store) -> Self::Register {
        // SAFETY: `Store` holds exactly WIDTH lanes by the trait contract.
        unsafe { Self::copy_from(a.as_ref().as_ptr()) }
    }

    /// A register with every lane equal to `x`.
    #[inline]
    fn broadcast(x: Self::Scalar) -> Self::Register {
        let mut a: Self::Store = LaneArray::zeroed();
        for lane in a.as_mut() {
            *lane = x;
        }
        Self::from_lanes(a)
    }

    /// Elementwise addition.
    #[inline]
    fn add(u: Self::Register, v: Self::Register) -> Self::Register {
        let a = Self::to_lanes(u);
        let b = Self::to_lanes(v);
        let mut r: Self::Store = LaneArray::zeroed();
        for i in 0..Self::WIDTH {
            r.as_mut()[i] = a.as_ref()[i] + b.as_ref()[i];
        }
        Self::from_lanes(r)
    }

    /// Elementwise multiplication.
    #[inline]
    fn mul(u: Self::Register, v: Self::Register) -> Self::Register {
        let a = Self::to_lanes(u);
        let b = Self::to_lanes(v);
        let mut r: Self::Store = LaneArray::zeroed();
        for i in 0..Self::WIDTH {
            r.as_mut()[i] = a.as_ref()[i] * b.as_ref()[i];
        }
        Self::from_lanes(r)
    }

    /// Elementwise fused multiply-add, `u * v + w`.
    ///
    /// The default body uses the scalar fused primitive, so float lanes
    /// round once per lane exactly as hardware FMA does.
    #[inline]
    fn fma(u: Self::Register, v: Self::Register, w: Self::Register) -> Self::Register {
        let a = Self::to_lanes(u);
        let b = Self::to_lanes(v);
        let c = Self::to_lanes(w);
        let mut r: Self::Store = LaneArray::zeroed();
        for i in 0..Self::WIDTH {
            r.as_mut()[i] = a.as_ref()[i].mul_add(b.as_ref()[i], c.as_ref()[i]);
        }
        Self::from_lanes(r)
    }

    /// Reads lane `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= WIDTH`.
    #[inline]
    fn element(v: Self::Register, i: usize) -> Self::Scalar {
        Self::to_lanes(v).as_ref()[i]
    }

    /// Overwrites lane `i` with `x`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= WIDTH`.
    #[inline]
    fn set_element(v: &mut Self::Register, i: usize, x: Self::Scalar) {
        let mut a = Self::to_lanes(*v);
        a.as_mut()[i] = x;
        *v = Self::from_lanes(a);
    }

    /// Sum of all lanes, accumulated strictly left to right from zero.
    ///
    /// The accumulation order is part of the contract: float results are
    /// reproducible across backends because every backend inherits this
    /// body.
    #[inline]
    fn reduce_add(v: Self::Register) -> Self::Scalar {
        let a = Self::to_lanes(v);
        let mut sum: Self::Scalar = Zero::zero();
        for i in 0..Self::WIDTH {
            sum = sum + a.as_ref()[i];
        }
        sum
    }
}

/// Indexed memory access for one (value backend, index backend) pairing.
///
/// `J` is the backend whose registers carry the lane indices. Pairing by
/// type lets a hardware backend override `gather` for the one index register
/// shape its gather instruction accepts, while the constrained entry points
/// and every scatter inherit the default bodies. The compiler resolves the
/// pairing statically; there is no runtime branching between native and
/// fallback paths.
///
/// Lane indices are raw offsets into a flat scalar buffer. None of these
/// methods checks bounds or verifies a [`Constraint`]; both are caller
/// contracts. The checked surface lives in [`Indirect`](crate::Indirect).
///
/// # Safety
///
/// To implement: `J::WIDTH` must equal `Self::WIDTH`, and overrides must be
/// observationally identical to the default bodies (a native gather performs
/// the same per-lane reads as the fallback loop).
pub unsafe trait IndexedBackend<J>: VectorBackend
where
    J: VectorBackend,
    J::Scalar: IndexElement,
{
    /// Per-lane indexed read: lane `i` becomes `p[idx[i]]`.
    ///
    /// # Safety
    ///
    /// Every `p.add(idx[i])` must be valid for reads.
    #[inline]
    unsafe fn gather(p: *const Self::Scalar, idx: J::Register) -> Self::Register {
        debug_assert_eq!(Self::WIDTH, J::WIDTH);
        let j = J::to_lanes(idx);
        let mut a: Self::Store = LaneArray::zeroed();
        for i in 0..Self::WIDTH {
            a.as_mut()[i] = *p.add(j.as_ref()[i].offset());
        }
        Self::from_lanes(a)
    }

    /// Per-lane indexed write: `p[idx[i]] = v[i]`, in ascending lane order.
    ///
    /// When two lanes target the same address the higher lane wins, exactly
    /// as a sequential write loop would behave.
    ///
    /// # Safety
    ///
    /// Every `p.add(idx[i])` must be valid for writes.
    #[inline]
    unsafe fn scatter(v: Self::Register, p: *mut Self::Scalar, idx: J::Register) {
        debug_assert_eq!(Self::WIDTH, J::WIDTH);
        let a = Self::to_lanes(v);
        let j = J::to_lanes(idx);
        for i in 0..Self::WIDTH {
            *p.add(j.as_ref()[i].offset()) = a.as_ref()[i];
        }
    }

    /// Gather, specialized by the asserted index pattern.
    ///
    /// `Contiguous` collapses to one dense load at `p + idx[0]`, `Constant`
    /// to a single scalar read broadcast to all lanes. The remaining
    /// patterns take the plain per-lane gather; they change nothing for
    /// reads and exist so call sites can thread one constraint value through
    /// gathers and scatters alike.
    ///
    /// # Safety
    ///
    /// As [`gather`](Self::gather), and the asserted constraint must hold
    /// for the actual indices. Under `Contiguous` the dense range
    /// `p.add(idx[0])..p.add(idx[0] + WIDTH)` must be valid for reads.
    #[inline]
    unsafe fn gather_constrained(
        p: *const Self::Scalar,
        idx: J::Register,
        c: Constraint,
    ) -> Self::Register {
        match c {
            Constraint::None | Constraint::Independent | Constraint::Monotonic => {
                Self::gather(p, idx)
            }
            Constraint::Contiguous => Self::copy_from(p.add(J::element(idx, 0).offset())),
            Constraint::Constant => Self::broadcast(*p.add(J::element(idx, 0).offset())),
        }
    }

    /// Scatter, specialized by the asserted index pattern.
    ///
    /// `Contiguous` collapses to one dense store. `Constant` writes the
    /// value of the last lane (`WIDTH - 1`) once: all lanes share one
    /// address, and the last write of the sequential loop is the one that
    /// lands, so the collapsed form preserves that order-defined overwrite.
    ///
    /// # Safety
    ///
    /// As [`scatter`](Self::scatter), and the asserted constraint must hold.
    /// Under `Contiguous` the dense range must be valid for writes.
    #[inline]
    unsafe fn scatter_constrained(
        v: Self::Register,
        p: *mut Self::Scalar,
        idx: J::Register,
        c: Constraint,
    ) {
        match c {
            Constraint::None | Constraint::Independent | Constraint::Monotonic => {
                Self::scatter(v, p, idx);
            }
            Constraint::Contiguous => Self::copy_to(v, p.add(J::element(idx, 0).offset())),
            Constraint::Constant => {
                *p.add(J::element(idx, 0).offset()) = Self::element(v, Self::WIDTH - 1);
            }
        }
    }

    /// Indexed accumulation: adds each lane into `p[idx[i]]`, merging
    /// duplicate destinations within the operation.
    ///
    /// Strategy per asserted pattern:
    /// - `Constant`: one destination; reduce the register and add once.
    /// - `Contiguous`: dense load, elementwise add, dense store.
    /// - `Independent`: no duplicates, so gather, add and scatter back.
    /// - `Monotonic`: one left-to-right pass that folds runs of equal
    ///   indices into a running sum and flushes it into memory whenever the
    ///   index changes, plus once after the loop. Linear, no extra storage.
    /// - `None`: strictly sequential per-lane read-add-write, the only
    ///   order that is correct when any two lanes may alias.
    ///
    /// # Safety
    ///
    /// Every targeted address must be valid for reads and writes, and the
    /// asserted constraint must hold for the actual indices. A violated
    /// assertion silently corrupts the accumulation.
    #[inline]
    unsafe fn scatter_add(
        v: Self::Register,
        p: *mut Self::Scalar,
        idx: J::Register,
        c: Constraint,
    ) {
        debug_assert_eq!(Self::WIDTH, J::WIDTH);
        match c {
            Constraint::None => {
                let a = Self::to_lanes(v);
                let j = J::to_lanes(idx);
                for i in 0..Self::WIDTH {
                    let q = p.add(j.as_ref()[i].offset());
                    *q = *q + a.as_ref()[i];
                }
            }
            Constraint::Monotonic => {
                let a = Self::to_lanes(v);
                let j = J::to_lanes(idx);
                let (a, j) = (a.as_ref(), j.as_ref());
                let mut sum: Self::Scalar = Zero::zero();
                for i in 0..Self::WIDTH - 1 {
                    sum = sum + a[i];
                    if j[i] != j[i + 1] {
                        let q = p.add(j[i].offset());
                        *q = *q + sum;
                        sum = Zero::zero();
                    }
                }
                sum = sum + a[Self::WIDTH - 1];
                let q = p.add(j[Self::WIDTH - 1].offset());
                *q = *q + sum;
            }
            Constraint::Independent => {
                Self::scatter(Self::add(v, Self::gather(p, idx)), p, idx);
            }
            Constraint::Contiguous => {
                let q = p.add(J::element(idx, 0).offset());
                Self::copy_to(Self::add(v, Self::copy_from(q)), q);
            }
            Constraint::Constant => {
                let q = p.add(J::element(idx, 0).offset());
                *q = *q + Self::reduce_add(v);
            }
        }
    }
}

/// Maps a scalar type and lane count to the preferred backend for the
/// compilation target.
///
/// `(f64, 4)` and `(i32, 4)` resolve to the AVX2 tags when the target
/// enables `avx2` and `fma`, and to [`generic::Generic`] otherwise.
/// Combinations without an implementation do not exist as vector types and
/// fail to compile, never degrading to a silent scalar stand-in.
pub trait Lanes<const N: usize>: Element {
    /// The backend tag registered for this scalar/width pair.
    type Backend: VectorBackend<Scalar = Self>;
}

/// The registered backend for a scalar/width pair.
pub type Native<T, const N: usize> = <T as Lanes<N>>::Backend;

macro_rules! register {
    ($($t:ty => [$($n:literal),+]),* $(,)?) => {
        $($(
            impl Lanes<$n> for $t {
                type Backend = generic::Generic<$t, $n>;
            }
        )+)*
    };
}

register! {
    f32 => [4, 8],
    f64 => [2, 8],
    i32 => [8],
    i64 => [2, 4],
    u32 => [4, 8],
    u64 => [2, 4],
}

#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    target_feature = "fma"
))]
impl Lanes<4> for f64 {
    type Backend = avx2::F64x4;
}

#[cfg(not(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    target_feature = "fma"
)))]
impl Lanes<4> for f64 {
    type Backend = generic::Generic<f64, 4>;
}

#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    target_feature = "fma"
))]
impl Lanes<4> for i32 {
    type Backend = avx2::I32x4;
}

#[cfg(not(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    target_feature = "fma"
)))]
impl Lanes<4> for i32 {
    type Backend = generic::Generic<i32, 4>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_array_zeroed() {
        let a = <[f64; 4] as LaneArray<f64>>::zeroed();
        assert_eq!(a, [0.0; 4]);
    }

    #[test]
    fn test_registry_widths() {
        assert_eq!(<Native<f64, 4>>::WIDTH, 4);
        assert_eq!(<Native<f64, 8>>::WIDTH, 8);
        assert_eq!(<Native<i32, 4>>::WIDTH, 4);
        assert_eq!(<Native<u64, 2>>::WIDTH, 2);
    }
}
