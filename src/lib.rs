// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod algo;       // algorithm registry + COO kernels
pub mod config;     // library config + expression files
pub mod device;     // host devices and command queues
pub mod engine;     // task graph + reactive executor
pub mod errors;     // error handling
pub mod expression; // expression graph, validation, processors
pub mod library;
pub mod observability;
pub mod storage;    // vectors, matrices, scalars and their blocks
pub mod traits;     // unified abstractions
pub mod types;      // element types, functions, descriptors

pub use library::Library;
