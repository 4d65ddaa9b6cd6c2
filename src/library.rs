// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::runtime::Runtime;

use crate::algo::AlgorithmManager;
use crate::config::LibraryConfig;
use crate::device::DeviceManager;
use crate::engine::ReactiveExecutor;
use crate::errors::{SplaError, SplaResult};
use crate::expression::{Expression, ExpressionManager};
use crate::observability::messages::engine::LibraryInitialized;
use crate::observability::messages::StructuredLog;

/// Owns the devices, the processor and algorithm registries, and the runtime that
/// evaluates expressions.
///
/// Registries are mutable only while the library is being built. Once constructed
/// they are shared read-only by every submission.
///
/// ```no_run
/// use spla_flow::config::LibraryConfig;
/// use spla_flow::expression::Expression;
/// use spla_flow::library::Library;
/// use spla_flow::storage::Vector;
/// use spla_flow::types::{Descriptor, Type};
///
/// let library = Library::new(LibraryConfig::default()).unwrap();
/// let v = Vector::new(8, Type::of::<i32>());
///
/// let mut expression = Expression::new("fill");
/// expression
///     .make_vector_write_typed(&v, &[(3, 1i32), (5, 2)], Descriptor::new())
///     .unwrap();
/// library.submit(&mut expression).unwrap();
/// assert_eq!(v.nvals(), 2);
/// ```
pub struct Library {
    config: LibraryConfig,
    devices: Arc<DeviceManager>,
    algorithms: Arc<AlgorithmManager>,
    expressions: ExpressionManager,
    executor: ReactiveExecutor,
    runtime: Runtime,
}

impl Library {
    /// Library with the built-in processors and algorithms.
    pub fn new(config: LibraryConfig) -> SplaResult<Self> {
        Self::with_registries(config, |_, _| {})
    }

    /// Library whose registries `register` may extend before they are frozen.
    ///
    /// Built-ins are registered first, so they take priority over anything added
    /// for the same operation.
    pub fn with_registries<F>(config: LibraryConfig, register: F) -> SplaResult<Self>
    where
        F: FnOnce(&mut ExpressionManager, &mut AlgorithmManager),
    {
        config
            .validate()
            .map_err(|e| SplaError::invalid_argument(e.to_string()))?;

        let devices = Arc::new(DeviceManager::new(
            config.devices.count,
            &config.devices.name_prefix,
        )?);
        let mut algorithms = AlgorithmManager::with_builtin();
        let mut expressions = ExpressionManager::with_builtin();
        register(&mut expressions, &mut algorithms);

        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("spla-flow-worker");
        if let Some(threads) = config.executor_options.worker_threads {
            builder.worker_threads(threads);
        }
        let runtime = builder.build().map_err(|e| {
            SplaError::invalid_state(format!("Failed to start the async runtime: {}", e))
        })?;
        let executor = ReactiveExecutor::new(config.executor_options.max_concurrency());

        LibraryInitialized {
            devices: devices.device_count(),
            max_concurrency: executor.max_concurrency(),
            processors: expressions.registered_count(),
            algorithms: algorithms.registered_count(),
        }
        .log();

        Ok(Self {
            config,
            devices,
            algorithms: Arc::new(algorithms),
            expressions,
            executor,
            runtime,
        })
    }

    /// Evaluate `expression`, blocking until it completes.
    ///
    /// Must not be called from inside an async context; use
    /// [`submit_async`](Self::submit_async) there.
    pub fn submit(&self, expression: &mut Expression) -> SplaResult<()> {
        self.runtime.block_on(self.submit_async(expression))
    }

    pub async fn submit_async(&self, expression: &mut Expression) -> SplaResult<()> {
        self.expressions
            .submit(
                expression,
                Arc::clone(&self.devices),
                Arc::clone(&self.algorithms),
                &self.executor,
            )
            .await
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn devices(&self) -> &Arc<DeviceManager> {
        &self.devices
    }

    pub fn algorithms(&self) -> &Arc<AlgorithmManager> {
        &self.algorithms
    }

    pub fn expressions(&self) -> &ExpressionManager {
        &self.expressions
    }

    pub fn executor(&self) -> &ReactiveExecutor {
        &self.executor
    }

    /// Runtime that drives [`submit`](Self::submit).
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("devices", &self.devices)
            .field("algorithms", &self.algorithms)
            .field("expressions", &self.expressions)
            .field("executor", &self.executor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceOptions, ExecutorOptions};
    use crate::expression::{ExpressionContext, ExpressionState, Operation};
    use crate::traits::NodeProcessor;

    fn small_config() -> LibraryConfig {
        LibraryConfig {
            executor_options: ExecutorOptions {
                max_concurrency: Some(2),
                worker_threads: Some(2),
            },
            devices: DeviceOptions {
                count: 3,
                name_prefix: "lib".to_string(),
            },
            log_filter: None,
        }
    }

    #[test]
    fn test_new_uses_config() {
        let library = Library::new(small_config()).unwrap();
        assert_eq!(library.devices().device_count(), 3);
        assert_eq!(library.executor().max_concurrency(), 2);
        assert_eq!(library.expressions().registered_count(), Operation::ALL.len());
        assert_eq!(library.algorithms().registered_count(), 7);
    }

    #[test]
    fn test_debug_lists_components() {
        let library = Library::new(small_config()).unwrap();
        let debug = format!("{:?}", library);
        assert!(debug.starts_with("Library {"), "{}", debug);
        assert!(debug.contains("ReactiveExecutor { max_concurrency: 2 }"), "{}", debug);
        assert!(debug.contains("lib-2"), "{}", debug);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = small_config();
        config.devices.count = 0;
        let error = Library::new(config).unwrap_err();
        assert_eq!(
            error,
            SplaError::invalid_argument("Invalid configuration: devices.count must be at least 1")
        );
    }

    #[test]
    fn test_custom_processor_registered_after_builtin() {
        struct Shadow;

        impl NodeProcessor for Shadow {
            fn operation_type(&self) -> Operation {
                Operation::VectorReduce
            }

            fn name(&self) -> &'static str {
                "Shadow"
            }

            fn process(&self, _idx: usize, _context: &mut ExpressionContext) -> SplaResult<()> {
                Err(SplaError::invalid_state("shadow should never be chosen"))
            }
        }

        let library = Library::with_registries(small_config(), |expressions, _| {
            expressions.register(Arc::new(Shadow));
        })
        .unwrap();
        assert_eq!(library.expressions().candidate_count(Operation::VectorReduce), 2);
    }

    #[test]
    fn test_submit_empty_expression() {
        let library = Library::new(small_config()).unwrap();
        let mut expression = Expression::new("nothing");
        library.submit(&mut expression).unwrap();
        assert_eq!(expression.state(), ExpressionState::Evaluated);
    }
}
