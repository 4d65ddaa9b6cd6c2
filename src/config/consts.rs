// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Number of host devices started when the configuration does not say.
pub const DEFAULT_DEVICE_COUNT: usize = 2;
/// Device names are `{prefix}-{index}`.
pub const DEFAULT_DEVICE_PREFIX: &str = "device";
/// Concurrency used when the number of CPU cores cannot be detected.
pub const FALLBACK_CONCURRENCY: usize = 4;
/// Filter applied when neither `RUST_LOG` nor the configuration sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Label of expressions loaded from a file without one.
pub const DEFAULT_EXPRESSION_LABEL: &str = "expression";
