// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::algo::{AlgorithmParams, AlgorithmType};
use crate::device::DeviceManager;
use crate::errors::{SplaError, SplaResult};
use crate::observability::messages::dispatch::{AlgorithmSelected, NoCandidateMatched};
use crate::observability::messages::StructuredLog;
use crate::traits::Algorithm;

type AlgorithmList = Vec<Arc<dyn Algorithm>>;

/// Ordered algorithm candidates per operation kind.
///
/// Registration order is priority order: the first registered algorithm whose
/// predicate matches a parameter set handles it.
#[derive(Default)]
pub struct AlgorithmManager {
    algorithms: HashMap<AlgorithmType, AlgorithmList>,
}

impl AlgorithmManager {
    /// Empty manager without any algorithms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with every built-in COO algorithm registered.
    pub fn with_builtin() -> Self {
        let mut manager = Self::new();
        crate::algo::register_builtin(&mut manager);
        manager
    }

    pub fn register(&mut self, algorithm: Arc<dyn Algorithm>) {
        self.algorithms
            .entry(algorithm.algorithm_type())
            .or_default()
            .push(algorithm);
    }

    /// Total number of registered candidates across all kinds.
    pub fn registered_count(&self) -> usize {
        self.algorithms.values().map(Vec::len).sum()
    }

    /// Number of candidates registered for `ty`.
    pub fn candidate_count(&self, ty: AlgorithmType) -> usize {
        self.algorithms.get(&ty).map(Vec::len).unwrap_or(0)
    }

    /// First candidate whose predicate accepts `params`.
    pub fn select(&self, params: &AlgorithmParams) -> SplaResult<&Arc<dyn Algorithm>> {
        let ty = params.algorithm_type();
        let candidates = self
            .algorithms
            .get(&ty)
            .filter(|list| !list.is_empty())
            .ok_or_else(|| {
                SplaError::invalid_state(format!("No algorithms for such op={}", ty))
            })?;

        candidates
            .iter()
            .find(|algorithm| algorithm.select(params))
            .ok_or_else(|| {
                NoCandidateMatched {
                    candidate_kind: "algorithm",
                    key: ty.name(),
                    candidates: candidates.len(),
                }
                .log();
                SplaError::invalid_state(format!(
                    "Failed to find suitable algorithm for op={}",
                    ty
                ))
            })
    }

    /// Select an algorithm and run it.
    pub fn dispatch(&self, params: &mut AlgorithmParams, devices: &DeviceManager) -> SplaResult<()> {
        let algorithm = self.select(params)?;

        AlgorithmSelected {
            algorithm: algorithm.name(),
            algorithm_type: params.algorithm_type().name(),
            device: params.device_id.0,
        }
        .log();

        algorithm.process(params, devices)
    }
}

impl std::fmt::Debug for AlgorithmManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self
            .algorithms
            .iter()
            .map(|(ty, list)| (ty.name(), list.iter().map(|a| a.name()).collect::<Vec<_>>()))
            .collect();
        names.sort();
        f.debug_struct("AlgorithmManager")
            .field("algorithms", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::{OpParams, ParamsVectorReduce};
    use crate::device::DeviceId;
    use crate::types::{Descriptor, FunctionBinary, Type};

    struct Fixed {
        name: &'static str,
        accepts: bool,
    }

    impl Algorithm for Fixed {
        fn algorithm_type(&self) -> AlgorithmType {
            AlgorithmType::VectorReduce
        }

        fn name(&self) -> &'static str {
            self.name
        }

        fn select(&self, _params: &AlgorithmParams) -> bool {
            self.accepts
        }

        fn process(&self, params: &mut AlgorithmParams, _devices: &DeviceManager) -> SplaResult<()> {
            params.vector_reduce_mut()?.scalar = Some(self.name.as_bytes().to_vec());
            Ok(())
        }
    }

    fn reduce_params() -> AlgorithmParams {
        let ty = Type::of::<i32>();
        AlgorithmParams::new(
            Descriptor::new(),
            DeviceId(0),
            OpParams::VectorReduce(ParamsVectorReduce {
                vec: None,
                reduce: FunctionBinary::builtin("plus", &ty).unwrap(),
                scalar: None,
                ty,
            }),
        )
    }

    #[test]
    fn test_first_matching_candidate_wins() {
        let mut manager = AlgorithmManager::new();
        manager.register(Arc::new(Fixed { name: "never", accepts: false }));
        manager.register(Arc::new(Fixed { name: "first", accepts: true }));
        manager.register(Arc::new(Fixed { name: "second", accepts: true }));

        let devices = DeviceManager::new(1, "algo").unwrap();
        for _ in 0..3 {
            let mut params = reduce_params();
            manager.dispatch(&mut params, &devices).unwrap();
            assert_eq!(
                params.vector_reduce().unwrap().scalar.as_deref(),
                Some("first".as_bytes())
            );
        }
        assert_eq!(manager.candidate_count(AlgorithmType::VectorReduce), 3);
    }

    #[test]
    fn test_selection_errors() {
        let params = reduce_params();

        let empty = AlgorithmManager::new();
        assert_eq!(
            empty.select(&params).err(),
            Some(SplaError::invalid_state("No algorithms for such op=VectorReduce"))
        );

        let mut picky = AlgorithmManager::new();
        picky.register(Arc::new(Fixed { name: "never", accepts: false }));
        assert_eq!(
            picky.select(&params).err(),
            Some(SplaError::invalid_state(
                "Failed to find suitable algorithm for op=VectorReduce"
            ))
        );
    }

    #[test]
    fn test_builtin_covers_every_type() {
        let manager = AlgorithmManager::with_builtin();
        for ty in [
            AlgorithmType::MatrixEWiseAdd,
            AlgorithmType::VectorEWiseAdd,
            AlgorithmType::MxM,
            AlgorithmType::VxM,
            AlgorithmType::VectorAssign,
            AlgorithmType::Transpose,
            AlgorithmType::VectorReduce,
        ] {
            assert_eq!(manager.candidate_count(ty), 1, "{}", ty);
        }
    }
}
