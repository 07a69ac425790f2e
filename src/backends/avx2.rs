//! AVX2 backend (x86_64, 256-bit with FMA).
//!
//! Compiled only when the target enables both `avx2` and `fma`, so every
//! intrinsic below is callable without runtime feature detection. Two
//! register shapes are provided: four doubles in a `__m256d` and four 32-bit
//! integers in a `__m128i`, the index shape the AVX2 gather instructions
//! take.
//!
//! Only the operations AVX2 accelerates are overridden: the memory hooks,
//! broadcast, the elementwise arithmetic and the native gathers. Scatter,
//! scatter-add, reductions and lane access all run on the inherited fallback
//! bodies, which the overrides must match bit for bit.

use std::arch::x86_64::*;

use crate::backends::{IndexedBackend, VectorBackend};

/// Four `f64` lanes in one 256-bit register.
pub struct F64x4;

// SAFETY: Store is [f64; 4], and the unaligned load/store intrinsics move
// exactly four doubles. The module-level cfg guarantees avx2+fma, so the
// intrinsics are safe to execute on this target.
unsafe impl VectorBackend for F64x4 {
    const WIDTH: usize = 4;
    type Scalar = f64;
    type Register = __m256d;
    type Store = [f64; 4];

    #[inline(always)]
    unsafe fn copy_from(p: *const f64) -> __m256d {
        _mm256_loadu_pd(p)
    }

    #[inline(always)]
    unsafe fn copy_to(v: __m256d, p: *mut f64) {
        _mm256_storeu_pd(p, v)
    }

    #[inline(always)]
    fn broadcast(x: f64) -> __m256d {
        // SAFETY: avx2 is enabled for this compilation unit.
        unsafe { _mm256_set1_pd(x) }
    }

    #[inline(always)]
    fn add(u: __m256d, v: __m256d) -> __m256d {
        // SAFETY: avx2 is enabled for this compilation unit.
        unsafe { _mm256_add_pd(u, v) }
    }

    #[inline(always)]
    fn mul(u: __m256d, v: __m256d) -> __m256d {
        // SAFETY: avx2 is enabled for this compilation unit.
        unsafe { _mm256_mul_pd(u, v) }
    }

    #[inline(always)]
    fn fma(u: __m256d, v: __m256d, w: __m256d) -> __m256d {
        // SAFETY: fma is enabled for this compilation unit. Single rounding
        // per lane, identical to the scalar mul_add the fallback uses.
        unsafe { _mm256_fmadd_pd(u, v, w) }
    }
}

// SAFETY: the hardware gather performs the same four reads at
// p + idx[i] * 8 bytes as the fallback loop.
unsafe impl IndexedBackend<I32x4> for F64x4 {
    #[inline(always)]
    unsafe fn gather(p: *const f64, idx: __m128i) -> __m256d {
        _mm256_i32gather_pd::<8>(p, idx)
    }
}

/// Four `i32` lanes in one 128-bit register.
///
/// This is the index shape for the width-4 gathers, and a value shape in its
/// own right.
pub struct I32x4;

// SAFETY: Store is [i32; 4], and the unaligned load/store intrinsics move
// exactly one 128-bit register.
unsafe impl VectorBackend for I32x4 {
    const WIDTH: usize = 4;
    type Scalar = i32;
    type Register = __m128i;
    type Store = [i32; 4];

    #[inline(always)]
    unsafe fn copy_from(p: *const i32) -> __m128i {
        _mm_loadu_si128(p as *const __m128i)
    }

    #[inline(always)]
    unsafe fn copy_to(v: __m128i, p: *mut i32) {
        _mm_storeu_si128(p as *mut __m128i, v)
    }

    #[inline(always)]
    fn broadcast(x: i32) -> __m128i {
        // SAFETY: sse2 is baseline on x86_64.
        unsafe { _mm_set1_epi32(x) }
    }

    #[inline(always)]
    fn add(u: __m128i, v: __m128i) -> __m128i {
        // SAFETY: sse2 is baseline on x86_64.
        unsafe { _mm_add_epi32(u, v) }
    }

    #[inline(always)]
    fn mul(u: __m128i, v: __m128i) -> __m128i {
        // SAFETY: sse4.1 is implied by avx2. mullo keeps the low 32 bits of
        // each product, the elementwise semantics of the fallback.
        unsafe { _mm_mullo_epi32(u, v) }
    }

    #[inline(always)]
    fn fma(u: __m128i, v: __m128i, w: __m128i) -> __m128i {
        // No integer fma instruction; compose from the overridden pieces.
        Self::add(Self::mul(u, v), w)
    }
}

// SAFETY: the hardware gather performs the same four reads at
// p + idx[i] * 4 bytes as the fallback loop.
unsafe impl IndexedBackend<I32x4> for I32x4 {
    #[inline(always)]
    unsafe fn gather(p: *const i32, idx: __m128i) -> __m128i {
        _mm_i32gather_epi32::<4>(p, idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::generic::Generic;
    use crate::Constraint;

    type RefF64 = Generic<f64, 4>;
    type RefI32 = Generic<i32, 4>;

    #[test]
    fn test_round_trip_matches_reference() {
        let lanes = [1.25, -2.5, 3.75, -4.0];
        let v = F64x4::from_lanes(lanes);
        assert_eq!(F64x4::to_lanes(v), RefF64::to_lanes(RefF64::from_lanes(lanes)));
    }

    #[test]
    fn test_arithmetic_parity_with_reference() {
        let a = [1.5, 2.5, -3.5, 4.5];
        let b = [-2.0, 0.5, 8.0, 1.0];
        let c = [0.125, 0.25, 0.5, 1.0];

        let (ua, ub, uc) = (
            F64x4::from_lanes(a),
            F64x4::from_lanes(b),
            F64x4::from_lanes(c),
        );
        let (ra, rb, rc) = (
            RefF64::from_lanes(a),
            RefF64::from_lanes(b),
            RefF64::from_lanes(c),
        );

        assert_eq!(
            F64x4::to_lanes(F64x4::add(ua, ub)),
            RefF64::to_lanes(RefF64::add(ra, rb))
        );
        assert_eq!(
            F64x4::to_lanes(F64x4::mul(ua, ub)),
            RefF64::to_lanes(RefF64::mul(ra, rb))
        );
        assert_eq!(
            F64x4::to_lanes(F64x4::fma(ua, ub, uc)),
            RefF64::to_lanes(RefF64::fma(ra, rb, rc))
        );
    }

    #[test]
    fn test_native_gather_parity_with_reference() {
        let buf: Vec<f64> = (0..32).map(|i| i as f64 * 0.5).collect();
        let j = [7, 0, 31, 7];
        let idx = I32x4::from_lanes(j);
        let ridx = RefI32::from_lanes(j);

        let native = unsafe { <F64x4 as IndexedBackend<I32x4>>::gather(buf.as_ptr(), idx) };
        let reference =
            unsafe { <RefF64 as IndexedBackend<RefI32>>::gather(buf.as_ptr(), ridx) };
        assert_eq!(F64x4::to_lanes(native), RefF64::to_lanes(reference));
    }

    #[test]
    fn test_integer_gather_and_mul() {
        let buf: Vec<i32> = (0..16).collect();
        let idx = I32x4::from_lanes([3, 1, 4, 1]);
        let v = unsafe { <I32x4 as IndexedBackend<I32x4>>::gather(buf.as_ptr(), idx) };
        assert_eq!(I32x4::to_lanes(v), [3, 1, 4, 1]);

        let w = I32x4::mul(v, I32x4::broadcast(-3));
        assert_eq!(I32x4::to_lanes(w), [-9, -3, -12, -3]);
    }

    #[test]
    fn test_inherited_scatter_add_uses_fallback() {
        let mut buf = [0.0f64; 8];
        let idx = I32x4::from_lanes([2, 2, 2, 5]);
        let v = F64x4::from_lanes([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_add(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::Monotonic,
            );
        }
        assert_eq!(buf[2], 6.0);
        assert_eq!(buf[5], 4.0);
    }
}
