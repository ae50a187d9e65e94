//! Completion checking and execution planning over realized tasks.

use anyhow::Result;

use unpack::{RealTask, RealTaskId, TaskState, Unpacked, Visit};
use util::HashSet;

use crate::fs::Layout;
use crate::version::UnionWorkflowVersionInfo;

/// Visitor that marks realized tasks whose realization directory holds
/// every declared output.
pub struct CompletionChecker<'a> {
    layout: &'a Layout,
    complete: HashSet<RealTaskId>,
}

impl<'a> CompletionChecker<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            complete: HashSet::default(),
        }
    }

    pub fn is_complete(&self, id: RealTaskId) -> bool {
        self.complete.contains(&id)
    }

    pub fn num_complete(&self) -> usize {
        self.complete.len()
    }
}

impl Visit for CompletionChecker<'_> {
    fn visit(&mut self, id: RealTaskId, task: &RealTask, cx: &Unpacked) -> Result<()> {
        let graph = cx.graph();
        let def = graph.task(task.task);
        let dir = self.layout.realization_dir(&def.name, &task.realization);
        let done = dir.is_dir()
            && def.outputs.iter().all(|spec| {
                self.layout
                    .out(&def.name, &task.realization, &graph.spec(*spec).name)
                    .exists()
            });
        if done {
            self.complete.insert(id);
        }
        Ok(())
    }
}

/// One realized task in the execution plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanEntry {
    pub id: RealTaskId,
    pub state: TaskState,
    /// Workflow version whose outputs this task may reuse.
    pub version: u32,
}

/// The ordered set of realized tasks handed to the execution subsystem.
/// Entries appear in dependency order; only the execution subsystem moves
/// tasks through the rest of the state machine.
#[derive(Debug, Default)]
pub struct ExecutionPlan {
    pub entries: Vec<PlanEntry>,
}

impl ExecutionPlan {
    /// Build the plan from completion facts and the version union.
    pub fn build(
        cx: &Unpacked,
        complete: &CompletionChecker,
        versions: &UnionWorkflowVersionInfo,
    ) -> Result<Self> {
        struct Builder<'a, 'b> {
            complete: &'a CompletionChecker<'b>,
            versions: &'a UnionWorkflowVersionInfo,
            entries: Vec<PlanEntry>,
        }

        impl Visit for Builder<'_, '_> {
            fn visit(&mut self, id: RealTaskId, task: &RealTask, cx: &Unpacked) -> Result<()> {
                let state = if self.complete.is_complete(id) {
                    TaskState::Completed
                } else if task.parents.iter().all(|p| self.complete.is_complete(*p)) {
                    TaskState::Ready
                } else {
                    TaskState::Pending
                };
                let version = self
                    .versions
                    .lookup(cx.task_name(id), &task.realization);
                self.entries.push(PlanEntry { id, state, version });
                Ok(())
            }
        }

        let mut builder = Builder {
            complete,
            versions,
            entries: Vec::with_capacity(cx.len()),
        };
        cx.visit_all(&mut builder)?;
        Ok(Self {
            entries: builder.entries,
        })
    }

    /// Entries that still need to run, in dependency order.
    pub fn to_run(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.state != TaskState::Completed)
    }

    pub fn has_tasks_to_run(&self) -> bool {
        self.to_run().next().is_some()
    }
}
