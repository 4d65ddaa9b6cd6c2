// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::errors::{SplaError, SplaResult};

/// One schedulable unit of work. Runs on a blocking-capable worker thread.
pub type SubTask = Box<dyn FnOnce() -> SplaResult<()> + Send + 'static>;

/// The units a processor emits for a single node. Units of one sub-flow have no
/// ordering between them.
pub type Subflow = Vec<SubTask>;

/// Index of a module inside its [`TaskGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

/// A node's sub-flow wrapped for composition into a larger graph.
pub struct Module {
    pub(crate) name: String,
    pub(crate) node: usize,
    pub(crate) units: Subflow,
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index of the expression node this module was built from.
    pub fn node(&self) -> usize {
        self.node
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("node", &self.node)
            .field("units", &self.units.len())
            .finish()
    }
}

/// Modules plus "completes-before" edges between them.
///
/// ```
/// use spla_flow::engine::{SubTask, TaskGraph};
///
/// let unit: SubTask = Box::new(|| Ok(()));
/// let mut graph = TaskGraph::new("example");
/// let a = graph.composed_of("a", 0, vec![unit]);
/// let b = graph.composed_of("b", 1, Vec::new());
/// graph.precede(a, b).unwrap();
///
/// assert_eq!(graph.successors(a), &[b]);
/// assert_eq!(graph.predecessor_count(b), 1);
/// ```
#[derive(Debug, Default)]
pub struct TaskGraph {
    label: String,
    modules: Vec<Module>,
    successors: Vec<Vec<ModuleId>>,
    predecessors: Vec<usize>,
}

impl TaskGraph {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wrap a sub-flow as a new module.
    pub fn composed_of(&mut self, name: impl Into<String>, node: usize, units: Subflow) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(Module {
            name: name.into(),
            node,
            units,
        });
        self.successors.push(Vec::new());
        self.predecessors.push(0);
        id
    }

    /// Declare that `before` must complete before `after` starts.
    ///
    /// Repeated edges are ignored.
    pub fn precede(&mut self, before: ModuleId, after: ModuleId) -> SplaResult<()> {
        for id in [before, after] {
            if id.0 >= self.modules.len() {
                return Err(SplaError::invalid_argument(format!(
                    "Unknown module {} in task graph '{}'",
                    id.0, self.label
                )));
            }
        }
        if before == after {
            return Err(SplaError::invalid_argument(format!(
                "Module '{}' cannot precede itself",
                self.modules[before.0].name
            )));
        }

        let successors = &mut self.successors[before.0];
        if !successors.contains(&after) {
            successors.push(after);
            self.predecessors[after.0] += 1;
        }
        Ok(())
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.0)
    }

    pub fn successors(&self, id: ModuleId) -> &[ModuleId] {
        self.successors.get(id.0).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn predecessor_count(&self, id: ModuleId) -> usize {
        self.predecessors.get(id.0).copied().unwrap_or(0)
    }

    /// Modules that can start immediately.
    pub fn entry_modules(&self) -> Vec<ModuleId> {
        (0..self.modules.len())
            .filter(|&i| self.predecessors[i] == 0)
            .map(ModuleId)
            .collect()
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Module>, Vec<Vec<ModuleId>>, Vec<usize>) {
        (self.label, self.modules, self.successors, self.predecessors)
    }
}
