//! Core traits for dense linear algebra
//!
//! [`RealField`] is the scalar abstraction used throughout the solver library:
//! the real types a system matrix can be stored in.

use crate::dense::Precision;
use num_traits::{Float, FromPrimitive, NumAssign, ToPrimitive};
use std::fmt::Debug;

/// Trait for scalar types that can be used as matrix storage.
///
/// Assembly and post-processing always work in `f64`; the storage type only
/// decides how the dense matrix and its factorization are held in memory.
///
/// # Implementations
///
/// Provided for:
/// - `f64` (default, full accuracy)
/// - `f32` (half the memory, for large meshes)
pub trait RealField:
    Float + NumAssign + FromPrimitive + ToPrimitive + Default + Send + Sync + Debug + 'static
{
    /// Storage precision tag of this scalar type
    const PRECISION: Precision;

    /// Convert from a double precision value, rounding if needed
    fn from_f64_lossy(value: f64) -> Self;

    /// Widen to double precision
    fn to_f64_lossy(self) -> f64;

    /// Pivot magnitude under which a matrix is treated as singular
    fn singular_threshold() -> Self {
        Self::from_f64_lossy(1e-30)
    }
}

impl RealField for f64 {
    const PRECISION: Precision = Precision::Double;

    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}

impl RealField for f32 {
    const PRECISION: Precision = Precision::Single;

    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_f64_field() {
        let x = f64::from_f64_lossy(3.0);
        assert_relative_eq!(x.to_f64_lossy(), 3.0);
        assert_eq!(<f64 as RealField>::PRECISION, Precision::Double);
    }

    #[test]
    fn test_f32_field_rounds() {
        let x = f32::from_f64_lossy(0.1);
        assert_relative_eq!(x.to_f64_lossy(), 0.1, epsilon = 1e-7);
        assert_eq!(<f32 as RealField>::PRECISION, Precision::Single);
        assert!(f32::singular_threshold() > 0.0);
    }
}
