// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

/// Flags that alter how a single operation executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorParam {
    /// Keep output positions absent from the mask instead of present.
    MaskComplement,
    /// Input of a data write is already sorted by index.
    ValuesSorted,
    /// Input of a data write contains no duplicate indices.
    NoDuplicates,
}

/// Execution descriptor attached to every node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    params: HashSet<DescriptorParam>,
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style flag setter.
    pub fn with(mut self, param: DescriptorParam) -> Self {
        self.params.insert(param);
        self
    }

    pub fn set_param(&mut self, param: DescriptorParam) {
        self.params.insert(param);
    }

    pub fn is_param_set(&self, param: DescriptorParam) -> bool {
        self.params.contains(&param)
    }
}
