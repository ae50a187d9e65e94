use anyhow::Result;

use crate::{RealTask, RealTaskId, Unpacked};

/// Lifecycle of a realized task during a run.
///
/// ```text
/// PENDING -> READY     (all parent tasks COMPLETED)
/// READY   -> RUNNING
/// RUNNING -> COMPLETED | FAILED
/// FAILED  -> PENDING   (on manual retry; terminal otherwise)
/// ```
///
/// Only the execution subsystem drives these transitions; this crate
/// exposes the topology and input facts the subsystem needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Ready,
    Running,
    Completed,
    Failed,
}

/// One analysis pass over realized tasks (input existence, completion
/// check, execution planning, ...). Visitors are driven in dependency
/// order and must not mutate the graph.
pub trait Visit {
    fn visit(&mut self, id: RealTaskId, task: &RealTask, cx: &Unpacked) -> Result<()>;
}

impl Unpacked<'_> {
    /// Drive a visitor over every realized task, in dependency order.
    pub fn visit_all(&self, visitor: &mut dyn Visit) -> Result<()> {
        for (id, task) in self.tasks.enumerate() {
            visitor.visit(id, task, self)?;
        }
        Ok(())
    }
}
