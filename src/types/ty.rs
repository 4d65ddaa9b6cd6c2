// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use crate::errors::{SplaError, SplaResult};
use crate::types::Element;

/// Element type descriptor.
///
/// Two descriptors are equal when their names and byte sizes match. A type with a
/// zero byte size is structural: blocks of that type store indices only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Type {
    name: Arc<str>,
    byte_size: usize,
}

impl Type {
    /// Descriptor for a Rust element type.
    pub fn of<T: Element>() -> Self {
        Self {
            name: Arc::from(T::NAME),
            byte_size: std::mem::size_of::<T>(),
        }
    }

    /// Structural-only type (no values are stored).
    pub fn void() -> Self {
        Self {
            name: Arc::from("void"),
            byte_size: 0,
        }
    }

    /// Look up one of the built-in descriptors by name.
    pub fn by_name(name: &str) -> SplaResult<Self> {
        match name {
            "void" => Ok(Self::void()),
            "i32" => Ok(Self::of::<i32>()),
            "u32" => Ok(Self::of::<u32>()),
            "i64" => Ok(Self::of::<i64>()),
            "f32" => Ok(Self::of::<f32>()),
            "f64" => Ok(Self::of::<f64>()),
            other => Err(SplaError::invalid_argument(format!(
                "Unknown element type '{}'",
                other
            ))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn byte_size(&self) -> usize {
        self.byte_size
    }

    pub fn has_values(&self) -> bool {
        self.byte_size > 0
    }

    /// True if this descriptor describes `T`.
    pub fn is<T: Element>(&self) -> bool {
        *self.name == *T::NAME && self.byte_size == std::mem::size_of::<T>()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_types() {
        let test_cases = vec![
            ("void", 0, false),
            ("i32", 4, true),
            ("u32", 4, true),
            ("i64", 8, true),
            ("f32", 4, true),
            ("f64", 8, true),
        ];

        for (name, byte_size, has_values) in test_cases {
            let ty = Type::by_name(name).unwrap();
            assert_eq!(ty.name(), name);
            assert_eq!(ty.byte_size(), byte_size, "byte size of {}", name);
            assert_eq!(ty.has_values(), has_values, "has_values of {}", name);
        }
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(matches!(
            Type::by_name("complex128"),
            Err(SplaError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_is() {
        assert!(Type::of::<f32>().is::<f32>());
        assert!(!Type::of::<f32>().is::<i32>());
        assert_eq!(Type::of::<f64>(), Type::by_name("f64").unwrap());
    }
}
