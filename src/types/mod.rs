// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Element types, binary functions and execution descriptors.
//!
//! Values inside storage blocks are type-erased byte arrays. A [`Type`] tells how
//! many bytes one element occupies, and a [`FunctionBinary`] combines two elements
//! byte-wise. The typed constructors (`Type::of::<T>()`,
//! `FunctionBinary::new::<A, B, W>`) keep callers in safe Rust.

mod descriptor;
mod element;
mod function;
mod ty;

pub use descriptor::{Descriptor, DescriptorParam};
pub use element::{Element, WrappingOps};
pub use function::FunctionBinary;
pub use ty::Type;
