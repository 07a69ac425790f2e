//! Scalar element bounds for register lanes.
//!
//! [`Element`] is the set of scalar types a register can carry (32/64-bit
//! integers and floats), [`IndexElement`] the subset usable as lane indices
//! into a flat buffer. Both are thin trait aliases over `num-traits` so the
//! fallback engine can compute in scalar arithmetic for any lane type.

use std::fmt::Debug;
use std::ops::Mul;

use num_traits::{AsPrimitive, MulAdd, Zero};

/// A scalar type that can occupy a register lane.
///
/// `mul_add` resolves to the fused scalar primitive on floats, so the
/// software fallback rounds the way hardware FMA does.
pub trait Element:
    Copy + PartialEq + Debug + Zero + Mul<Output = Self> + MulAdd<Output = Self> + 'static
{
}

/// An integer scalar usable as a lane index.
pub trait IndexElement: Element + Ord + AsPrimitive<usize> {
    /// The index as a buffer offset.
    ///
    /// Negative values are outside the indexed-access contract and produce
    /// an unspecified offset.
    #[inline(always)]
    fn offset(self) -> usize {
        self.as_()
    }
}

macro_rules! impl_element {
    ($($t:ty),* $(,)?) => {
        $(impl Element for $t {})*
    };
}

macro_rules! impl_index_element {
    ($($t:ty),* $(,)?) => {
        $(impl IndexElement for $t {})*
    };
}

impl_element!(f32, f64, i32, i64, u32, u64, usize);
impl_index_element!(i32, i64, u32, u64, usize);
