//! Portable array-backed backend (no SIMD).
//!
//! `Generic<T, N>` keeps its register in a plain `[T; N]` and implements
//! nothing beyond the two memory hooks, so every operation runs on the
//! inherited fallback bodies. It works for any registered scalar and width,
//! on every target, and is the reference any hardware override is compared
//! against.

use std::marker::PhantomData;
use std::ptr;

use crate::backends::{IndexedBackend, VectorBackend};
use crate::element::{Element, IndexElement};

/// Portable backend tag for `N` lanes of `T`.
pub struct Generic<T, const N: usize>(PhantomData<T>);

// SAFETY: Store is [T; N] with N == WIDTH, and the hooks move exactly N
// scalars through unaligned-tolerant pointer copies.
unsafe impl<T: Element, const N: usize> VectorBackend for Generic<T, N> {
    const WIDTH: usize = N;
    type Scalar = T;
    type Register = [T; N];
    type Store = [T; N];

    #[inline(always)]
    unsafe fn copy_from(p: *const T) -> [T; N] {
        let mut a = [T::zero(); N];
        ptr::copy_nonoverlapping(p, a.as_mut_ptr(), N);
        a
    }

    #[inline(always)]
    unsafe fn copy_to(v: [T; N], p: *mut T) {
        ptr::copy_nonoverlapping(v.as_ptr(), p, N);
    }
}

// Pairs array registers with any index backend of the same width. Width
// agreement is the usual IndexedBackend contract, debug-asserted in the
// inherited bodies.
// SAFETY: no default body is overridden.
unsafe impl<T, const N: usize, J> IndexedBackend<J> for Generic<T, N>
where
    T: Element,
    J: VectorBackend,
    J::Scalar: IndexElement,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Constraint;

    type F64x4 = Generic<f64, 4>;
    type I32x4 = Generic<i32, 4>;

    fn vec4(a: [f64; 4]) -> [f64; 4] {
        F64x4::from_lanes(a)
    }

    fn idx4(j: [i32; 4]) -> [i32; 4] {
        I32x4::from_lanes(j)
    }

    #[test]
    fn test_broadcast_fills_every_lane() {
        let v = F64x4::broadcast(2.5);
        assert_eq!(F64x4::to_lanes(v), [2.5; 4]);
    }

    #[test]
    fn test_elementwise_arithmetic() {
        let u = vec4([1.0, 2.0, 3.0, 4.0]);
        let v = vec4([10.0, 20.0, 30.0, 40.0]);
        assert_eq!(F64x4::to_lanes(F64x4::add(u, v)), [11.0, 22.0, 33.0, 44.0]);
        assert_eq!(
            F64x4::to_lanes(F64x4::mul(u, v)),
            [10.0, 40.0, 90.0, 160.0]
        );
    }

    #[test]
    fn test_fma_matches_scalar_mul_add() {
        let u = vec4([1.5, 2.5, 3.5, 4.5]);
        let v = vec4([2.0, 2.0, 2.0, 2.0]);
        let w = vec4([0.25, 0.25, 0.25, 0.25]);
        let r = F64x4::to_lanes(F64x4::fma(u, v, w));
        for i in 0..4 {
            let (a, b, c) = (
                F64x4::to_lanes(u)[i],
                F64x4::to_lanes(v)[i],
                F64x4::to_lanes(w)[i],
            );
            assert_eq!(r[i], a.mul_add(b, c));
        }
    }

    #[test]
    fn test_element_access() {
        let mut v = vec4([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(F64x4::element(v, 2), 3.0);
        F64x4::set_element(&mut v, 2, 9.0);
        assert_eq!(F64x4::to_lanes(v), [1.0, 2.0, 9.0, 4.0]);
    }

    #[test]
    fn test_reduce_add_left_to_right() {
        let v = vec4([0.1, 0.2, 0.3, 0.4]);
        assert_eq!(F64x4::reduce_add(v), ((0.0 + 0.1) + 0.2) + 0.3 + 0.4);
    }

    #[test]
    fn test_gather_reads_per_lane() {
        let buf = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0];
        let idx = idx4([5, 0, 3, 3]);
        let v = unsafe { <F64x4 as IndexedBackend<I32x4>>::gather(buf.as_ptr(), idx) };
        assert_eq!(F64x4::to_lanes(v), [50.0, 0.0, 30.0, 30.0]);
    }

    #[test]
    fn test_gather_contiguous_equals_dense_load() {
        let buf = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let idx = idx4([2, 3, 4, 5]);
        let dense = unsafe {
            <F64x4 as IndexedBackend<I32x4>>::gather_constrained(
                buf.as_ptr(),
                idx,
                Constraint::Contiguous,
            )
        };
        let lanes = unsafe {
            <F64x4 as IndexedBackend<I32x4>>::gather_constrained(
                buf.as_ptr(),
                idx,
                Constraint::None,
            )
        };
        assert_eq!(F64x4::to_lanes(dense), F64x4::to_lanes(lanes));
    }

    #[test]
    fn test_scatter_duplicate_destination_last_lane_wins() {
        let mut buf = [0.0f64; 8];
        let idx = idx4([1, 1, 6, 1]);
        let v = vec4([10.0, 20.0, 30.0, 40.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter(v, buf.as_mut_ptr(), idx);
        }
        assert_eq!(buf[1], 40.0);
        assert_eq!(buf[6], 30.0);
    }

    #[test]
    fn test_scatter_constant_writes_last_lane() {
        let mut buf = [0.0f64; 8];
        let idx = idx4([7, 7, 7, 7]);
        let v = vec4([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_constrained(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::Constant,
            );
        }
        assert_eq!(buf[7], 4.0);
    }

    #[test]
    fn test_scatter_add_constant_sums_all_lanes() {
        let mut buf = [0.0f64; 8];
        let idx = idx4([7, 7, 7, 7]);
        let v = vec4([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_add(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::Constant,
            );
        }
        assert_eq!(buf[7], 10.0);
    }

    #[test]
    fn test_scatter_add_monotonic_merges_runs() {
        let mut buf = [0.0f64; 6];
        let idx = idx4([2, 2, 2, 5]);
        let v = vec4([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_add(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::Monotonic,
            );
        }
        assert_eq!(buf, [0.0, 0.0, 6.0, 0.0, 0.0, 4.0]);
    }

    #[test]
    fn test_scatter_add_independent_round_trips() {
        let mut buf = [1.0f64; 8];
        let idx = idx4([6, 4, 2, 0]);
        let v = vec4([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_add(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::Independent,
            );
        }
        assert_eq!(buf, [5.0, 1.0, 4.0, 1.0, 3.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_scatter_add_contiguous_dense_accumulate() {
        let mut buf = [1.0f64; 8];
        let idx = idx4([3, 4, 5, 6]);
        let v = vec4([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_add(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::Contiguous,
            );
        }
        assert_eq!(buf, [1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 1.0]);
    }

    #[test]
    fn test_scatter_add_none_handles_any_aliasing() {
        let mut buf = [0.0f64; 4];
        let idx = idx4([0, 3, 0, 3]);
        let v = vec4([1.0, 2.0, 3.0, 4.0]);
        unsafe {
            <F64x4 as IndexedBackend<I32x4>>::scatter_add(
                v,
                buf.as_mut_ptr(),
                idx,
                Constraint::None,
            );
        }
        assert_eq!(buf, [4.0, 0.0, 0.0, 6.0]);
    }

    #[test]
    fn test_integer_lanes() {
        let u = I32x4::from_lanes([1, 2, 3, 4]);
        let v = I32x4::broadcast(10);
        assert_eq!(I32x4::to_lanes(I32x4::add(u, v)), [11, 12, 13, 14]);
        assert_eq!(I32x4::reduce_add(u), 10);
    }
}
