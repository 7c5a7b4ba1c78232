//! Distance kernels
//!
//! A [`Distance`] fixes both the metric and the element type of an index,
//! so each (metric, dtype) pair is a distinct monomorphized engine. All
//! kernels return "lower = closer" and accumulate in f32.

use crate::element::Element;
use std::marker::PhantomData;
use vecnav_core::{MetricType, VariantKey};

/// A distance function over vectors of one element type
pub trait Distance: Send + Sync + 'static {
    /// Element type the kernel reads
    type Element: Element;

    /// Registry tag for this metric
    const METRIC: MetricType;

    /// Distance between two vectors of equal length
    fn distance(a: &[Self::Element], b: &[Self::Element]) -> f32;

    /// Variant key this kernel implements
    fn key() -> VariantKey {
        VariantKey::new(Self::METRIC, <Self::Element as Element>::DATA_TYPE)
    }
}

/// Squared Euclidean distance: sum((a - b)^2)
#[derive(Debug, Clone, Copy, Default)]
pub struct SquaredL2<T>(PhantomData<fn() -> T>);

impl<T: Element> Distance for SquaredL2<T> {
    type Element = T;
    const METRIC: MetricType = MetricType::L2;

    #[inline]
    fn distance(a: &[T], b: &[T]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b)
            .map(|(&x, &y)| {
                let d = x.to_f32() - y.to_f32();
                d * d
            })
            .sum()
    }
}

/// Inner product distance: 1 - dot(a, b)
///
/// Meaningful as a similarity ordering for normalized vectors; for
/// unnormalized data it is still a valid ranking by dot product.
#[derive(Debug, Clone, Copy, Default)]
pub struct InnerProduct<T>(PhantomData<fn() -> T>);

impl<T: Element> Distance for InnerProduct<T> {
    type Element = T;
    const METRIC: MetricType = MetricType::InnerProduct;

    #[inline]
    fn distance(a: &[T], b: &[T]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        let dot: f32 = a.iter().zip(b).map(|(&x, &y)| x.to_f32() * y.to_f32()).sum();
        1.0 - dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use vecnav_core::DataType;

    #[test]
    fn test_squared_l2_f32() {
        let a = [1.0f32, 2.0, 3.0];
        let b = [4.0f32, 6.0, 3.0];
        assert_eq!(SquaredL2::<f32>::distance(&a, &b), 25.0);
        assert_eq!(SquaredL2::<f32>::distance(&a, &a), 0.0);
    }

    #[test]
    fn test_squared_l2_u8_does_not_wrap() {
        let a = [0u8, 255];
        let b = [255u8, 0];
        assert_eq!(SquaredL2::<u8>::distance(&a, &b), 2.0 * 255.0 * 255.0);
    }

    #[test]
    fn test_squared_l2_i8() {
        let a = [-128i8, 127];
        let b = [127i8, -128];
        assert_eq!(SquaredL2::<i8>::distance(&a, &b), 2.0 * 255.0 * 255.0);
    }

    #[test]
    fn test_inner_product() {
        let a = [0.6f32, 0.8];
        assert!((InnerProduct::<f32>::distance(&a, &a)).abs() < 1e-6);

        let orthogonal = [0.8f32, -0.6];
        assert!((InnerProduct::<f32>::distance(&a, &orthogonal) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_inner_product_integer_types() {
        assert_eq!(InnerProduct::<u8>::distance(&[2, 3], &[4, 5]), 1.0 - 23.0);
        assert_eq!(InnerProduct::<i8>::distance(&[-2, 3], &[4, -5]), 1.0 + 23.0);
    }

    proptest! {
        #[test]
        fn prop_l2_symmetric_and_non_negative(
            pair in (1usize..32).prop_flat_map(|n| (
                prop::collection::vec(any::<i8>(), n),
                prop::collection::vec(any::<i8>(), n),
            ))
        ) {
            let (a, b) = pair;
            let ab = SquaredL2::<i8>::distance(&a, &b);
            prop_assert!(ab >= 0.0);
            prop_assert_eq!(ab, SquaredL2::<i8>::distance(&b, &a));
            prop_assert_eq!(SquaredL2::<i8>::distance(&a, &a), 0.0);
        }

        #[test]
        fn prop_inner_product_symmetric(
            pair in (1usize..32).prop_flat_map(|n| (
                prop::collection::vec(any::<u8>(), n),
                prop::collection::vec(any::<u8>(), n),
            ))
        ) {
            let (a, b) = pair;
            prop_assert_eq!(
                InnerProduct::<u8>::distance(&a, &b),
                InnerProduct::<u8>::distance(&b, &a)
            );
        }
    }

    #[test]
    fn test_keys() {
        assert_eq!(
            SquaredL2::<u8>::key(),
            VariantKey::new(MetricType::L2, DataType::UInt8)
        );
        assert_eq!(
            InnerProduct::<f32>::key(),
            VariantKey::new(MetricType::InnerProduct, DataType::Float32)
        );
    }
}
