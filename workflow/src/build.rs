//! Turns a loaded [`Workflow`] into an immutable [`TaskGraph`].

use anyhow::{Context, Result};

use hyperdag::{HyperDag, HyperDagBuilder, VertexId};
use util::{HashMap, IdVec};

use crate::resolve::Mode;
use crate::{
    BranchId, BranchPointId, BranchRegistry, Error, RealizedVars, Realization, ResolvedSlot,
    ResolvedSource, Rval, Spec, SpecId, SpecTable, Task, TaskId, TaskTemplate, Workflow,
    BASELINE_BRANCH, BASELINE_POINT,
};

/// A task's dependency under one branch: another task, or a phantom
/// placeholder standing in for "no temporal edge" (literal, unbound, or
/// self-referential sources, and all param sources).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parent {
    Task(TaskId),
    Phantom,
}

/// Per-task parent bookkeeping: branch point -> branch -> parents,
/// in first-touch order throughout.
#[derive(Debug, Default)]
struct TaskParents {
    points: Vec<(BranchPointId, Vec<(BranchId, Vec<Parent>)>)>,
}

impl TaskParents {
    fn record(&mut self, point: BranchPointId, branch: BranchId, parent: Parent) {
        let pi = match self.points.iter().position(|(p, _)| *p == point) {
            Some(i) => i,
            None => {
                self.points.push((point, Vec::new()));
                self.points.len() - 1
            }
        };
        let branches = &mut self.points[pi].1;
        let bi = match branches.iter().position(|(b, _)| *b == branch) {
            Some(i) => i,
            None => {
                branches.push((branch, Vec::new()));
                branches.len() - 1
            }
        };
        let parents = &mut branches[bi].1;
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }
}

/// The fully-resolved workflow: one template per task, wired into a
/// meta-hyper-DAG. Immutable once built; safe to share across threads.
#[derive(Debug)]
pub struct TaskGraph {
    tasks: IdVec<TaskId, Task>,
    ids_by_name: HashMap<String, TaskId>,
    pub specs: SpecTable,
    pub branches: BranchRegistry,
    templates: IdVec<TaskId, TaskTemplate>,
    dag: HyperDag<TaskId, BranchPointId, BranchId>,
    vertex_of: IdVec<TaskId, VertexId>,
    topo: Vec<TaskId>,
}

impl Workflow {
    /// Resolve every task and emit the task graph.
    ///
    /// Fails fast on unresolvable references, non-literal params, reference
    /// loops, and dependency cycles among tasks.
    pub fn build(self) -> Result<TaskGraph> {
        let mut templates: IdVec<TaskId, TaskTemplate> =
            IdVec::with_capacity(self.tasks.len());
        let mut parent_recs: Vec<TaskParents> = Vec::with_capacity(self.tasks.len());

        for (task_id, task) in self.tasks.enumerate() {
            let (template, parents) = self
                .resolve_task(task_id)
                .with_context(|| format!("in task [{}] at {}", task.name, task.pos))?;
            templates.push(template);
            parent_recs.push(parents);
        }

        log::debug!(
            "resolved {} task templates over {} branch points",
            templates.len(),
            self.branches.num_points()
        );

        let mut builder: HyperDagBuilder<TaskId, BranchPointId, BranchId> =
            HyperDagBuilder::default();
        let mut vertex_of: IdVec<TaskId, VertexId> = IdVec::with_capacity(self.tasks.len());
        for task_id in self.tasks.keys() {
            vertex_of.push(builder.add_vertex(task_id));
        }

        for (task_id, parents) in self.tasks.keys().zip(parent_recs) {
            let head = *vertex_of.get(task_id);
            let mut phantom: Option<VertexId> = None;
            for (point, branches) in parents.points {
                let meta = builder.add_meta_edge(head, point);
                for (branch, parent_list) in branches {
                    let mut tails = Vec::with_capacity(parent_list.len());
                    for parent in parent_list {
                        tails.push(match parent {
                            Parent::Task(t) => *vertex_of.get(t),
                            Parent::Phantom => {
                                *phantom.get_or_insert_with(|| builder.add_phantom())
                            }
                        });
                    }
                    builder.add_hyper_edge(meta, branch, tails);
                }
            }
        }

        let dag = builder.build();
        let topo = dag
            .topo_order()
            .context("while ordering tasks for execution")?
            .into_iter()
            .map(|v| *dag.payload(v).expect("topo order holds only real vertices"))
            .collect();

        Ok(TaskGraph {
            tasks: self.tasks,
            ids_by_name: self.ids_by_name,
            specs: self.specs,
            branches: self.branches,
            templates,
            dag,
            vertex_of,
            topo,
        })
    }

    fn resolve_task(&self, task_id: TaskId) -> Result<(TaskTemplate, TaskParents)> {
        let task = self.task(task_id);
        let mut branch_points = Vec::new();
        let mut parents = TaskParents::default();

        let touch = |branch_points: &mut Vec<BranchPointId>, point: BranchPointId| {
            if !branch_points.contains(&point) {
                branch_points.push(point);
            }
        };

        let mut inputs = Vec::with_capacity(task.inputs.len());
        for spec_id in &task.inputs {
            let spec = self.specs.get(*spec_id);
            let slot = self
                .resolve_slot(*spec_id, task_id, Mode::Input)
                .with_context(|| {
                    format!("while resolving input \"{}\" at {}", spec.name, spec.pos)
                })?;
            for (branch, src) in &slot.entries {
                let parent = if src.task != task_id {
                    Parent::Task(src.task)
                } else {
                    Parent::Phantom
                };
                parents.record(slot.point, *branch, parent);
            }
            touch(&mut branch_points, slot.point);
            inputs.push(slot);
        }

        let mut params = Vec::with_capacity(task.params.len());
        for spec_id in &task.params {
            let spec = self.specs.get(*spec_id);
            let slot = self
                .resolve_slot(*spec_id, task_id, Mode::Param)
                .with_context(|| {
                    format!("while resolving parameter \"{}\" at {}", spec.name, spec.pos)
                })?;
            // params carry no temporal order, so their parents stay phantom
            for (branch, _) in &slot.entries {
                parents.record(slot.point, *branch, Parent::Phantom);
            }
            touch(&mut branch_points, slot.point);
            params.push(slot);
        }

        let template = TaskTemplate {
            task: task_id,
            branch_points,
            inputs,
            params,
        };
        Ok((template, parents))
    }

    fn resolve_slot(
        &self,
        spec_id: SpecId,
        owner: TaskId,
        mode: Mode,
    ) -> Result<ResolvedSlot, Error> {
        let resolve = |child: SpecId| -> Result<ResolvedSource, Error> {
            let (spec, task) = match mode {
                Mode::Input => self.resolve_chain(child, owner, Mode::Input)?,
                Mode::Param => self.resolve_param_chain(child, owner)?,
            };
            Ok(ResolvedSource { spec, task })
        };

        match &self.specs.get(spec_id).rval {
            Rval::BranchPoint { point, vals } => {
                let mut entries = Vec::with_capacity(vals.len());
                for (branch, child) in vals {
                    entries.push((*branch, resolve(*child)?));
                }
                Ok(ResolvedSlot {
                    spec: spec_id,
                    point: *point,
                    entries,
                })
            }
            _ => Ok(ResolvedSlot {
                spec: spec_id,
                point: BASELINE_POINT,
                entries: vec![(BASELINE_BRANCH, resolve(spec_id)?)],
            }),
        }
    }
}

impl TaskGraph {
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

    #[inline]
    pub fn template(&self, id: TaskId) -> &TaskTemplate {
        self.templates.get(id)
    }

    #[inline]
    pub fn spec(&self, id: SpecId) -> &Spec {
        self.specs.get(id)
    }

    pub fn dag(&self) -> &HyperDag<TaskId, BranchPointId, BranchId> {
        &self.dag
    }

    pub fn vertex(&self, task: TaskId) -> VertexId {
        *self.vertex_of.get(task)
    }

    /// Task ids in dependency order.
    pub fn topo(&self) -> &[TaskId] {
        &self.topo
    }

    /// Realize one task's slots under the given branch assignment.
    pub fn realize(&self, task: TaskId, active: &Realization) -> Result<RealizedVars, Error> {
        self.template(task).realize(active, &self.branches)
    }
}

#[cfg(test)]
mod test {
    use syntax::ast::{Spec, TaskDef};

    use super::*;

    fn build(defs: Vec<TaskDef>) -> TaskGraph {
        let mut wf = Workflow::default();
        for def in defs {
            wf.add_task(def).unwrap();
        }
        wf.build().unwrap()
    }

    #[test]
    fn test_branched_literal_input_has_phantom_parents() {
        let graph = build(vec![TaskDef::new("tok").input(Spec::branch_point(
            "in",
            "Size",
            vec![
                Spec::literal("small", "./small.txt"),
                Spec::literal("large", "./large.txt"),
            ],
        ))]);

        let tok = graph.task_named("tok").unwrap();
        let template = graph.template(tok);
        let size = graph.branches.point_named("Size").unwrap();
        assert_eq!(template.branch_points, vec![size]);

        let v = graph.vertex(tok);
        assert!(graph.dag().dependencies(v).is_empty(), "no real parents");
        let edges = graph.dag().in_edges(v);
        assert_eq!(edges.len(), 1);
        let meta = graph.dag().meta_edge(edges[0]);
        assert_eq!(meta.label, size);
        assert_eq!(meta.hyperedges.len(), 2);
    }

    #[test]
    fn test_variable_input_creates_real_edge() {
        let graph = build(vec![
            TaskDef::new("tok").output(Spec::unbound("out")),
            TaskDef::new("train").input(Spec::variable("corpus", "tok", "out")),
        ]);
        let tok = graph.task_named("tok").unwrap();
        let train = graph.task_named("train").unwrap();
        assert_eq!(graph.dag().dependencies(graph.vertex(train)), vec![graph.vertex(tok)]);
        assert_eq!(graph.topo(), &[tok, train]);
    }

    #[test]
    fn test_param_branch_point_stays_phantom() {
        let graph = build(vec![TaskDef::new("a").param(Spec::branch_point(
            "mem",
            "mem",
            vec![Spec::literal("2gb", "2gb"), Spec::literal("16gb", "16gb")],
        ))]);
        let a = graph.task_named("a").unwrap();
        assert!(graph.dag().dependencies(graph.vertex(a)).is_empty());
        assert_eq!(graph.template(a).branch_points.len(), 1);
    }

    #[test]
    fn test_task_cycle_rejected() {
        let mut wf = Workflow::default();
        wf.add_task(
            TaskDef::new("a")
                .input(Spec::variable("in", "b", "out"))
                .output(Spec::unbound("out")),
        )
        .unwrap();
        wf.add_task(
            TaskDef::new("b")
                .input(Spec::variable("in", "a", "out"))
                .output(Spec::unbound("out")),
        )
        .unwrap();
        assert!(wf.build().is_err());
    }
}
