//! Register-wide vector values and indexed views of flat buffers.
//!
//! [`Vector`] wraps one backend register behind a safe, operator-friendly
//! surface. [`Indirect`] pairs a mutable target buffer with an index
//! register and an asserted [`Constraint`], validating lane bounds once at
//! construction so the unchecked engine underneath can run safely.

use std::fmt;
use std::ops::{Add, AddAssign, Mul};

use crate::backends::{IndexedBackend, VectorBackend};
use crate::element::IndexElement;
use crate::error::{RayoError, Result};
use crate::Constraint;

/// One register of `I::WIDTH` scalar lanes.
///
/// Copied by value, never aliased; all arithmetic is elementwise and routes
/// through the backend, so the same expression compiles to native vector
/// instructions or the software fallback depending on the target.
///
/// # Examples
///
/// ```
/// use rayo::Simd;
///
/// let a = Simd::<f64, 4>::from_slice(&[1.0, 2.0, 3.0, 4.0]);
/// let b = Simd::<f64, 4>::broadcast(10.0);
/// let c = 2.0 * a + b;
///
/// let mut out = [0.0; 4];
/// c.write_to_slice(&mut out);
/// assert_eq!(out, [12.0, 14.0, 16.0, 18.0]);
/// ```
pub struct Vector<I: VectorBackend>(pub(crate) I::Register);

impl<I: VectorBackend> Clone for Vector<I> {
    #[inline(always)]
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: VectorBackend> Copy for Vector<I> {}

impl<I: VectorBackend> fmt::Debug for Vector<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(I::to_lanes(self.0).as_ref().iter())
            .finish()
    }
}

impl<I: VectorBackend> PartialEq for Vector<I> {
    fn eq(&self, other: &Self) -> bool {
        I::to_lanes(self.0).as_ref() == I::to_lanes(other.0).as_ref()
    }
}

impl<I: VectorBackend> Vector<I> {
    /// Number of scalar lanes.
    pub const WIDTH: usize = I::WIDTH;

    /// A vector with every lane equal to `x`.
    #[inline(always)]
    pub fn broadcast(x: I::Scalar) -> Self {
        Self(I::broadcast(x))
    }

    /// Loads the first `WIDTH` elements of `s`.
    ///
    /// # Panics
    ///
    /// Panics if `s` holds fewer than `WIDTH` elements.
    #[inline(always)]
    pub fn from_slice(s: &[I::Scalar]) -> Self {
        match Self::try_from_slice(s) {
            Ok(v) => v,
            Err(e) => panic!("{e}"),
        }
    }

    /// Loads the first `WIDTH` elements of `s`, reporting short slices.
    ///
    /// # Errors
    ///
    /// Returns [`RayoError::SizeMismatch`] if `s` holds fewer than `WIDTH`
    /// elements.
    #[inline]
    pub fn try_from_slice(s: &[I::Scalar]) -> Result<Self> {
        if s.len() < I::WIDTH {
            return Err(RayoError::SizeMismatch {
                expected: I::WIDTH,
                actual: s.len(),
            });
        }
        // SAFETY: length checked above; copy_from reads exactly WIDTH.
        Ok(Self(unsafe { I::copy_from(s.as_ptr()) }))
    }

    /// Builds a vector from a full lane buffer.
    #[inline(always)]
    pub fn from_lanes(lanes: I::Store) -> Self {
        Self(I::from_lanes(lanes))
    }

    /// The lanes as a plain buffer.
    #[inline(always)]
    pub fn lanes(self) -> I::Store {
        I::to_lanes(self.0)
    }

    /// Stores all lanes into the front of `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out` holds fewer than `WIDTH` elements.
    #[inline]
    pub fn write_to_slice(self, out: &mut [I::Scalar]) {
        assert!(
            out.len() >= I::WIDTH,
            "slice shorter than vector width"
        );
        // SAFETY: length checked above; copy_to writes exactly WIDTH.
        unsafe { I::copy_to(self.0, out.as_mut_ptr()) }
    }

    /// Reads lane `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= WIDTH`.
    #[inline(always)]
    pub fn extract(self, i: usize) -> I::Scalar {
        I::element(self.0, i)
    }

    /// Overwrites lane `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= WIDTH`.
    #[inline(always)]
    pub fn replace(&mut self, i: usize, x: I::Scalar) {
        I::set_element(&mut self.0, i, x)
    }

    /// Sum of all lanes, accumulated left to right.
    #[inline(always)]
    pub fn reduce_add(self) -> I::Scalar {
        I::reduce_add(self.0)
    }

    /// Fused multiply-add: `self * v + w`, one rounding per float lane.
    ///
    /// # Examples
    ///
    /// ```
    /// use rayo::Simd;
    ///
    /// let k = Simd::<f64, 4>::broadcast(2.0);
    /// let a = Simd::<f64, 4>::from_slice(&[1.0, 2.0, 3.0, 4.0]);
    /// let b = Simd::<f64, 4>::broadcast(1.0);
    /// assert_eq!(k.mul_add(a, b), Simd::<f64, 4>::from_slice(&[3.0, 5.0, 7.0, 9.0]));
    /// ```
    #[inline(always)]
    pub fn mul_add(self, v: Self, w: Self) -> Self {
        Self(I::fma(self.0, v.0, w.0))
    }
}

impl<I: VectorBackend> Add for Vector<I> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self(I::add(self.0, rhs.0))
    }
}

impl<I: VectorBackend> AddAssign for Vector<I> {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl<I: VectorBackend> Mul for Vector<I> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self(I::mul(self.0, rhs.0))
    }
}

macro_rules! impl_scalar_ops {
    ($($t:ty),* $(,)?) => {$(
        impl<I: VectorBackend<Scalar = $t>> Mul<$t> for Vector<I> {
            type Output = Self;

            #[inline(always)]
            fn mul(self, rhs: $t) -> Self {
                self * Self::broadcast(rhs)
            }
        }

        impl<I: VectorBackend<Scalar = $t>> Mul<Vector<I>> for $t {
            type Output = Vector<I>;

            #[inline(always)]
            fn mul(self, rhs: Vector<I>) -> Vector<I> {
                Vector::broadcast(self) * rhs
            }
        }
    )*};
}

impl_scalar_ops!(f32, f64, i32, i64, u32, u64);

/// An indexed view of a mutable scalar buffer.
///
/// Couples the buffer with an index vector and the caller's asserted
/// [`Constraint`], then exposes the three indexed operations. Construction
/// checks every lane index against the buffer length (and the full dense
/// range for [`Constraint::Contiguous`]), so a view that exists cannot touch
/// memory outside the buffer, even if the asserted constraint turns out to
/// be false. A false assertion still produces unspecified buffer contents;
/// debug builds catch it with an assertion.
///
/// # Examples
///
/// ```
/// use rayo::{indirect, Constraint, Simd};
///
/// let mut hist = [0.0f64; 8];
/// let idx = Simd::<i32, 4>::from_slice(&[2, 2, 2, 5]);
/// let val = Simd::<f64, 4>::from_slice(&[1.0, 2.0, 3.0, 4.0]);
///
/// indirect(&mut hist, idx, Constraint::Monotonic).accumulate(val);
/// assert_eq!(hist[2], 6.0);
/// assert_eq!(hist[5], 4.0);
/// ```
pub struct Indirect<'a, I: VectorBackend, J: VectorBackend> {
    buf: &'a mut [I::Scalar],
    index: Vector<J>,
    constraint: Constraint,
}

impl<'a, I, J> Indirect<'a, I, J>
where
    I: IndexedBackend<J>,
    J: VectorBackend,
    J::Scalar: IndexElement,
{
    /// Builds a validated view, reporting out-of-range lanes.
    ///
    /// # Errors
    ///
    /// Returns [`RayoError::IndexOutOfBounds`] if any lane index (or, under
    /// [`Constraint::Contiguous`], any element of the dense run) falls
    /// outside `buf`.
    pub fn try_new(
        buf: &'a mut [I::Scalar],
        index: Vector<J>,
        constraint: Constraint,
    ) -> Result<Self> {
        let j = J::to_lanes(index.0);
        for &ji in j.as_ref() {
            let at = ji.offset();
            if at >= buf.len() {
                return Err(RayoError::IndexOutOfBounds {
                    index: at,
                    len: buf.len(),
                });
            }
        }
        if constraint == Constraint::Contiguous {
            // The dense fast path touches idx[0]..idx[0]+WIDTH regardless
            // of the other lanes, so the whole run must be in bounds even
            // if the assertion is wrong.
            let first = j.as_ref()[0].offset();
            if first + I::WIDTH > buf.len() {
                return Err(RayoError::IndexOutOfBounds {
                    index: first + I::WIDTH - 1,
                    len: buf.len(),
                });
            }
        }
        debug_assert!(
            constraint.holds_for(j.as_ref()),
            "indices {:?} violate the asserted {} constraint",
            j.as_ref(),
            constraint
        );
        Ok(Self {
            buf,
            index,
            constraint,
        })
    }

    /// Constrained gather: lane `i` becomes `buf[idx[i]]`.
    #[inline]
    pub fn load(&self) -> Vector<I> {
        // SAFETY: construction validated every targeted address.
        Vector(unsafe { I::gather_constrained(self.buf.as_ptr(), self.index.0, self.constraint) })
    }

    /// Constrained scatter: `buf[idx[i]] = v[i]`.
    ///
    /// Duplicate destinations resolve in lane order, so the highest lane
    /// wins. Under [`Constraint::Constant`] that collapses to a single
    /// write of the last lane.
    #[inline]
    pub fn store(&mut self, v: Vector<I>) {
        // SAFETY: construction validated every targeted address.
        unsafe {
            I::scatter_constrained(v.0, self.buf.as_mut_ptr(), self.index.0, self.constraint)
        }
    }

    /// Constrained scatter-add: `buf[idx[i]] += v[i]`, merging duplicate
    /// destinations within the operation.
    #[inline]
    pub fn accumulate(&mut self, v: Vector<I>) {
        // SAFETY: construction validated every targeted address.
        unsafe { I::scatter_add(v.0, self.buf.as_mut_ptr(), self.index.0, self.constraint) }
    }
}

/// Builds an [`Indirect`] view of `buf`.
///
/// # Panics
///
/// Panics if any lane index falls outside `buf`; use
/// [`Indirect::try_new`] to handle that case without panicking.
#[inline]
pub fn indirect<'a, I, J>(
    buf: &'a mut [I::Scalar],
    index: Vector<J>,
    constraint: Constraint,
) -> Indirect<'a, I, J>
where
    I: IndexedBackend<J>,
    J: VectorBackend,
    J::Scalar: IndexElement,
{
    match Indirect::try_new(buf, index, constraint) {
        Ok(view) => view,
        Err(e) => panic!("{e}"),
    }
}
