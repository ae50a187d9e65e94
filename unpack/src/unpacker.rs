use anyhow::Result;
use colored::Colorize;

use hyperdag::VertexId;
use util::{HashMap, HashSet, IdVec};
use workflow::{Realization, SpecId, TaskGraph, TaskId};

use crate::{Error, RealTaskId};

/// A task template paired with one realization.
/// Identity is `(task name, realization name)`, unique within an [`Unpacked`].
#[derive(Debug)]
pub struct RealTask {
    pub task: TaskId,
    /// Canonical realization name, e.g. `"small"` or `"baseline"`.
    pub realization: String,
    /// One branch per branch point on any path to this task.
    pub active: Realization,
    /// `(own spec, source spec, source task)` per input, declaration order.
    pub inputs: Vec<(SpecId, SpecId, TaskId)>,
    /// `(own spec, literal source spec, source task)` per param.
    pub params: Vec<(SpecId, SpecId, TaskId)>,
    /// Realized predecessors, in first-seen order.
    pub parents: Vec<RealTaskId>,
}

/// All realized tasks of one unpacking run, in emission (dependency) order.
pub struct Unpacked<'a> {
    graph: &'a TaskGraph,
    pub tasks: IdVec<RealTaskId, RealTask>,
    by_key: HashMap<(TaskId, String), RealTaskId>,
}

impl<'a> Unpacked<'a> {
    pub fn graph(&self) -> &'a TaskGraph {
        self.graph
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    #[inline]
    pub fn get(&self, id: RealTaskId) -> &RealTask {
        self.tasks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RealTaskId, &RealTask)> {
        self.tasks.enumerate()
    }

    /// Look up a realized task by its user-visible identity.
    pub fn find(&self, task: &str, realization: &str) -> Option<&RealTask> {
        let task = self.graph.task_named(task)?;
        let id = self.by_key.get(&(task, realization.to_owned()))?;
        Some(self.tasks.get(*id))
    }

    /// Name of the task underlying a realized task.
    pub fn task_name(&self, id: RealTaskId) -> &str {
        &self.graph.task(self.tasks.get(id).task).name
    }
}

/// Enumerate the realized tasks reachable from `goals` (every task when
/// `goals` is empty), in deterministic dependency order.
pub fn unpack<'a>(graph: &'a TaskGraph, goals: &[&str]) -> Result<Unpacked<'a>> {
    let reachable: Option<HashSet<VertexId>> = if goals.is_empty() {
        None
    } else {
        let mut vertices = Vec::with_capacity(goals.len());
        for name in goals {
            let id = graph
                .task_named(name)
                .ok_or_else(|| Error::GoalTaskNotFound((*name).to_owned()))?;
            vertices.push(graph.vertex(id));
        }
        Some(graph.dag().ancestors(&vertices))
    };

    let mut unpacked = Unpacked {
        graph,
        tasks: IdVec::with_capacity(graph.num_tasks() * 2),
        by_key: HashMap::default(),
    };
    let mut reals_of: IdVec<TaskId, Vec<RealTaskId>> = IdVec::with_capacity(graph.num_tasks());
    for _ in 0..graph.num_tasks() {
        reals_of.push(Vec::new());
    }

    for task_id in graph.topo().iter().copied() {
        if let Some(set) = &reachable {
            if !set.contains(&graph.vertex(task_id)) {
                continue;
            }
        }
        unpack_vertex(graph, task_id, &mut unpacked, &mut reals_of)?;
    }

    log::debug!("unpacked {} realized task(s)", unpacked.len());
    Ok(unpacked)
}

fn unpack_vertex(
    graph: &TaskGraph,
    task_id: TaskId,
    unpacked: &mut Unpacked,
    reals_of: &mut IdVec<TaskId, Vec<RealTaskId>>,
) -> Result<()> {
    let dag = graph.dag();
    let vertex = graph.vertex(task_id);

    // realization names are user-visible, so meta-edge order matters
    let mut metas: Vec<_> = dag.in_edges(vertex).iter().map(|id| dag.meta_edge(*id)).collect();
    metas.sort_by(|a, b| {
        graph
            .branches
            .point_name(a.label)
            .cmp(graph.branches.point_name(b.label))
    });

    let own_radix: Vec<usize> = metas.iter().map(|m| m.hyperedges.len()).collect();
    let mut seen: HashSet<String> = HashSet::default();

    for_each_combo(&own_radix, |own_idx| {
        let mut own = Realization::default();
        let mut parent_tasks: Vec<TaskId> = Vec::new();
        for (meta, i) in metas.iter().zip(own_idx) {
            let he = dag.hyper_edge(meta.hyperedges[*i]);
            own.insert(meta.label, he.label);
            for tail in &he.tails {
                if let Some(t) = dag.payload(*tail) {
                    if !parent_tasks.contains(t) {
                        parent_tasks.push(*t);
                    }
                }
            }
        }

        let parent_radix: Vec<usize> =
            parent_tasks.iter().map(|t| reals_of.get(*t).len()).collect();

        for_each_combo(&parent_radix, |parent_idx| {
            let mut active = own.clone();
            let mut parents = Vec::with_capacity(parent_tasks.len());
            for (t, i) in parent_tasks.iter().zip(parent_idx) {
                let parent_id = reals_of.get(*t)[*i];
                match active.merged(&unpacked.tasks.get(parent_id).active) {
                    Some(merged) => {
                        active = merged;
                        parents.push(parent_id);
                    }
                    // two paths disagree on a shared branch point
                    None => return Ok(()),
                }
            }

            let name = active.name(&graph.branches);
            if !seen.insert(name.clone()) {
                return Ok(());
            }
            log::trace!("{}[{}]", graph.task(task_id).name.cyan(), name);

            let vars = graph.realize(task_id, &active)?;
            let id = unpacked.tasks.push(RealTask {
                task: task_id,
                realization: name.clone(),
                active,
                inputs: vars.inputs,
                params: vars.params,
                parents,
            });
            reals_of.get_mut(task_id).push(id);
            unpacked.by_key.insert((task_id, name), id);
            Ok(())
        })
    })?;

    log::debug!(
        "unpacked {} realization(s) of {}",
        reals_of.get(task_id).len(),
        graph.task(task_id).name
    );
    Ok(())
}

/// Call `f` with every point of the mixed-radix space described by `radix`,
/// rightmost digit varying fastest. The empty space has exactly one point.
fn for_each_combo<F>(radix: &[usize], mut f: F) -> Result<()>
where
    F: FnMut(&[usize]) -> Result<()>,
{
    if radix.iter().any(|r| *r == 0) {
        return Ok(());
    }
    let mut idx = vec![0usize; radix.len()];
    loop {
        f(&idx)?;
        let mut i = radix.len();
        loop {
            if i == 0 {
                return Ok(());
            }
            i -= 1;
            idx[i] += 1;
            if idx[i] < radix[i] {
                break;
            }
            idx[i] = 0;
        }
    }
}

#[cfg(test)]
mod test {
    use syntax::ast::{Spec, TaskDef};
    use workflow::Workflow;

    use super::*;

    fn unpack_all(defs: Vec<TaskDef>) -> (TaskGraph, Vec<(String, String)>) {
        let mut wf = Workflow::default();
        for def in defs {
            wf.add_task(def).unwrap();
        }
        let graph = wf.build().unwrap();
        let unpacked = unpack(&graph, &[]).unwrap();
        let keys = unpacked
            .iter()
            .map(|(_, t)| (graph.task(t.task).name.clone(), t.realization.clone()))
            .collect();
        (graph, keys)
    }

    #[test]
    fn test_task_without_branches_is_baseline() {
        let (_, keys) = unpack_all(vec![TaskDef::new("t")
            .input(Spec::literal("in", "./in.txt"))
            .output(Spec::unbound("out"))]);
        assert_eq!(keys, vec![("t".to_owned(), "baseline".to_owned())]);
    }

    #[test]
    fn test_goal_restricts_to_ancestors() {
        let mut wf = Workflow::default();
        wf.add_task(TaskDef::new("a").output(Spec::unbound("out"))).unwrap();
        wf.add_task(TaskDef::new("b").input(Spec::variable("in", "a", "out"))).unwrap();
        wf.add_task(TaskDef::new("c").output(Spec::unbound("out"))).unwrap();
        let graph = wf.build().unwrap();
        let unpacked = unpack(&graph, &["b"]).unwrap();
        assert_eq!(unpacked.len(), 2);
        assert!(unpacked.find("a", "baseline").is_some());
        assert!(unpacked.find("c", "baseline").is_none());
    }

    #[test]
    fn test_unknown_goal_rejected() {
        let (graph, _) = unpack_all(vec![TaskDef::new("t")]);
        assert!(unpack(&graph, &["nope"]).is_err());
    }

    #[test]
    fn test_mixed_radix_combo_order() {
        let mut seen = Vec::new();
        for_each_combo(&[2, 3], |idx| {
            seen.push((idx[0], idx[1]));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]
        );
    }

    #[test]
    fn test_empty_combo_space_has_one_point() {
        let mut calls = 0;
        for_each_combo(&[], |_| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 1);
    }
}
