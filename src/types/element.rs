// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use bytemuck::Pod;

/// Rust types that can be stored as elements of a sparse block.
///
/// `Pod` lets values be read from and written to the byte arrays held by blocks
/// without `unsafe` code.
pub trait Element: Pod + Send + Sync + 'static {
    /// Name of the matching [`Type`](crate::types::Type) descriptor.
    const NAME: &'static str;

    fn from_f64(value: f64) -> Self;

    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($t:ty, $name:literal) => {
        impl Element for $t {
            const NAME: &'static str = $name;

            #[inline]
            fn from_f64(value: f64) -> Self {
                value as $t
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element!(i32, "i32");
impl_element!(u32, "u32");
impl_element!(i64, "i64");
impl_element!(f32, "f32");
impl_element!(f64, "f64");

/// Arithmetic used by the built-in `plus` and `times` functions.
///
/// Integer types wrap on overflow, matching two's complement device kernels.
pub trait WrappingOps: Copy {
    fn plus(self, rhs: Self) -> Self;

    fn times(self, rhs: Self) -> Self;
}

macro_rules! impl_wrapping_int {
    ($($t:ty),+) => {
        $(
            impl WrappingOps for $t {
                #[inline]
                fn plus(self, rhs: Self) -> Self {
                    self.wrapping_add(rhs)
                }

                #[inline]
                fn times(self, rhs: Self) -> Self {
                    self.wrapping_mul(rhs)
                }
            }
        )+
    };
}

macro_rules! impl_wrapping_float {
    ($($t:ty),+) => {
        $(
            impl WrappingOps for $t {
                #[inline]
                fn plus(self, rhs: Self) -> Self {
                    self + rhs
                }

                #[inline]
                fn times(self, rhs: Self) -> Self {
                    self * rhs
                }
            }
        )+
    };
}

impl_wrapping_int!(i32, u32, i64);
impl_wrapping_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_arithmetic_wraps() {
        assert_eq!(i32::MAX.plus(1), i32::MIN);
        assert_eq!(u32::MAX.plus(2), 1);
        assert_eq!(i64::MAX.times(2), -2);
        assert_eq!(3i32.times(4), 12);
    }

    #[test]
    fn test_float_arithmetic() {
        assert_eq!(1.5f32.plus(2.0), 3.5);
        assert_eq!(f64::MAX.times(2.0), f64::INFINITY);
    }
}
