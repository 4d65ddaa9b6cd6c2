// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod algorithm;
pub mod executor;
pub mod processor;

pub use algorithm::Algorithm;
pub use executor::TaskExecutor;
pub use processor::NodeProcessor;
