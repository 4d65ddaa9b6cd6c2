// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::errors::{SplaError, SplaResult};
use crate::types::{Element, Type, WrappingOps};

type BinaryFn = dyn Fn(&[u8], &[u8], &mut [u8]) + Send + Sync;

/// Binary function `f: ta x tb -> tw` operating on type-erased element bytes.
///
/// Kernels call [`apply`](Self::apply) with slices of exactly `ta.byte_size()`,
/// `tb.byte_size()` and `tw.byte_size()` bytes.
#[derive(Clone)]
pub struct FunctionBinary {
    name: Arc<str>,
    ta: Type,
    tb: Type,
    tw: Type,
    f: Arc<BinaryFn>,
}

impl FunctionBinary {
    /// Wrap a typed closure.
    ///
    /// ```
    /// use spla_flow::types::FunctionBinary;
    ///
    /// let times = FunctionBinary::new::<f32, f32, f32>("times", |a, b| a * b);
    /// let mut out = [0u8; 4];
    /// times.apply(&2.0f32.to_ne_bytes(), &3.0f32.to_ne_bytes(), &mut out);
    /// assert_eq!(f32::from_ne_bytes(out), 6.0);
    /// ```
    pub fn new<A, B, W>(name: &str, f: impl Fn(A, B) -> W + Send + Sync + 'static) -> Self
    where
        A: Element,
        B: Element,
        W: Element,
    {
        let erased = move |a: &[u8], b: &[u8], w: &mut [u8]| {
            let result = f(
                bytemuck::pod_read_unaligned::<A>(a),
                bytemuck::pod_read_unaligned::<B>(b),
            );
            w.copy_from_slice(bytemuck::bytes_of(&result));
        };

        Self {
            name: Arc::from(name),
            ta: Type::of::<A>(),
            tb: Type::of::<B>(),
            tw: Type::of::<W>(),
            f: Arc::new(erased),
        }
    }

    /// Built-in function by name for a single element type.
    ///
    /// Supported names: `plus`, `times`, `min`, `max`, `first`, `second`.
    pub fn builtin(name: &str, ty: &Type) -> SplaResult<Self> {
        let function = match ty.name() {
            "i32" => builtin_typed::<i32>(name),
            "u32" => builtin_typed::<u32>(name),
            "i64" => builtin_typed::<i64>(name),
            "f32" => builtin_typed::<f32>(name),
            "f64" => builtin_typed::<f64>(name),
            _ => None,
        };

        function.ok_or_else(|| {
            SplaError::invalid_argument(format!(
                "No built-in function '{}' for type '{}'",
                name, ty
            ))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ta(&self) -> &Type {
        &self.ta
    }

    pub fn tb(&self) -> &Type {
        &self.tb
    }

    pub fn tw(&self) -> &Type {
        &self.tw
    }

    #[inline]
    pub fn apply(&self, a: &[u8], b: &[u8], w: &mut [u8]) {
        (self.f)(a, b, w)
    }
}

fn builtin_typed<T>(name: &str) -> Option<FunctionBinary>
where
    T: Element + WrappingOps + PartialOrd,
{
    let function = match name {
        "plus" => FunctionBinary::new::<T, T, T>(name, T::plus),
        "times" => FunctionBinary::new::<T, T, T>(name, T::times),
        "min" => FunctionBinary::new::<T, T, T>(name, |a, b| if b < a { b } else { a }),
        "max" => FunctionBinary::new::<T, T, T>(name, |a, b| if b > a { b } else { a }),
        "first" => FunctionBinary::new::<T, T, T>(name, |a, _| a),
        "second" => FunctionBinary::new::<T, T, T>(name, |_, b| b),
        _ => return None,
    };
    Some(function)
}

impl fmt::Debug for FunctionBinary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionBinary")
            .field("name", &self.name)
            .field("ta", &self.ta)
            .field("tb", &self.tb)
            .field("tw", &self.tw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_i32(function: &FunctionBinary, a: i32, b: i32) -> i32 {
        let mut out = [0u8; 4];
        function.apply(&a.to_ne_bytes(), &b.to_ne_bytes(), &mut out);
        i32::from_ne_bytes(out)
    }

    #[test]
    fn test_builtin_functions_i32() {
        let ty = Type::of::<i32>();
        let test_cases = vec![
            ("plus", 3, 4, 7),
            ("times", 3, 4, 12),
            ("min", 3, 4, 3),
            ("max", 3, 4, 4),
            ("first", 3, 4, 3),
            ("second", 3, 4, 4),
        ];

        for (name, a, b, expected) in test_cases {
            let function = FunctionBinary::builtin(name, &ty).unwrap();
            assert_eq!(apply_i32(&function, a, b), expected, "function {}", name);
            assert_eq!(function.tw(), &ty);
        }
    }

    #[test]
    fn test_integer_builtins_wrap_on_overflow() {
        let ty = Type::of::<i32>();
        let plus = FunctionBinary::builtin("plus", &ty).unwrap();
        let times = FunctionBinary::builtin("times", &ty).unwrap();

        assert_eq!(apply_i32(&plus, i32::MAX, 1), i32::MIN);
        assert_eq!(apply_i32(&times, i32::MIN, -1), i32::MIN);
    }

    #[test]
    fn test_builtin_rejects_unknown_name_and_void() {
        assert!(FunctionBinary::builtin("minus", &Type::of::<f32>()).is_err());
        assert!(FunctionBinary::builtin("plus", &Type::void()).is_err());
    }

    #[test]
    fn test_mixed_types() {
        let scale = FunctionBinary::new::<i32, f64, f64>("scale", |a, b| a as f64 * b);
        let mut out = [0u8; 8];
        scale.apply(&2i32.to_ne_bytes(), &1.5f64.to_ne_bytes(), &mut out);
        assert_eq!(f64::from_ne_bytes(out), 3.0);
        assert_eq!(scale.ta().byte_size(), 4);
        assert_eq!(scale.tw().byte_size(), 8);
    }
}
