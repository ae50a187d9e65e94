use anyhow::{Context, Result};
use syntax::ast;
use util::{HashMap, IdVec};

use crate::{BranchRegistry, Error, SpecTable, Task, TaskId};

/// Accumulates task definitions before resolution.
///
/// Mutation is confined to this builder; [`Workflow::build`] consumes it and
/// returns an immutable [`crate::TaskGraph`].
#[derive(Debug, Default)]
pub struct Workflow {
    pub(crate) tasks: IdVec<TaskId, Task>,
    pub(crate) ids_by_name: HashMap<String, TaskId>,
    pub specs: SpecTable,
    pub branches: BranchRegistry,
}

impl Workflow {
    /// Load one parsed task definition. Task names are globally unique.
    pub fn add_task(&mut self, def: ast::TaskDef) -> Result<TaskId> {
        if self.ids_by_name.contains_key(&def.name) {
            return Err(Error::DuplicateTaskName(def.name).into());
        }
        let name = def.name.clone();
        let pos = def.pos;
        let task = Task::create(def, &mut self.specs, &mut self.branches)
            .with_context(|| format!("while loading task [{name}] at {pos}"))?;
        let id = self.tasks.push(task);
        self.ids_by_name.insert(name, id);
        Ok(id)
    }

    #[inline]
    pub fn task(&self, id: TaskId) -> &Task {
        self.tasks.get(id)
    }

    pub fn task_named(&self, name: &str) -> Option<TaskId> {
        self.ids_by_name.get(name).copied()
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duplicate_task_name_rejected() {
        let mut wf = Workflow::default();
        wf.add_task(ast::TaskDef::new("tokenize")).unwrap();
        let err = wf.add_task(ast::TaskDef::new("tokenize")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DuplicateTaskName(_))
        ));
    }
}
