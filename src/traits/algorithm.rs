// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::algo::{AlgorithmParams, AlgorithmType};
use crate::device::DeviceManager;
use crate::errors::SplaResult;

/// A concrete backend computation for one operation kind.
pub trait Algorithm: Send + Sync {
    fn algorithm_type(&self) -> AlgorithmType;

    fn name(&self) -> &'static str;

    /// Pure predicate over the runtime formats of the operand blocks.
    fn select(&self, params: &AlgorithmParams) -> bool;

    /// Run the computation and store the output block in `params`.
    ///
    /// Device work must be complete when this returns, on every path.
    fn process(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()>;
}
