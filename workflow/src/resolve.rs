//! Walks chains of variable references down to their concrete source.

use util::HashSet;

use crate::{Error, Rval, SpecId, TaskId, Workflow};

/// Which slot table a variable reference selects in the source task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Inputs draw from the source task's outputs; `Unbound` terminates the
    /// walk (the user supplies the file at runtime).
    Input,
    /// Params draw from the source task's params and must end in a literal.
    Param,
}

impl Mode {
    fn slot_kind(self) -> &'static str {
        match self {
            Mode::Input => "output",
            Mode::Param => "parameter",
        }
    }
}

impl Workflow {
    /// Follow the chain of `Variable` indirections starting at `start`,
    /// owned by `owner`, returning the terminal spec and the task it is
    /// attributed to.
    ///
    /// Branch points must have been peeled off by the caller; encountering
    /// one mid-walk is an error, as is a reference loop.
    pub(crate) fn resolve_chain(
        &self,
        start: SpecId,
        owner: TaskId,
        mode: Mode,
    ) -> Result<(SpecId, TaskId), Error> {
        let mut cur = start;
        let mut cur_task = owner;
        let mut visited: HashSet<SpecId> = HashSet::default();

        loop {
            if !visited.insert(cur) {
                return Err(Error::ResolutionCycle(self.specs.get(start).name.clone()));
            }
            match &self.specs.get(cur).rval {
                Rval::Literal(_) => return Ok((cur, cur_task)),
                Rval::Unbound => {
                    return match mode {
                        Mode::Input => Ok((cur, cur_task)),
                        Mode::Param => {
                            Err(Error::UnboundParam(self.specs.get(start).name.clone()))
                        }
                    }
                }
                Rval::BranchPoint { point, .. } => {
                    return Err(Error::UnexpectedBranchPoint(
                        self.branches.point_name(*point).to_owned(),
                    ))
                }
                Rval::Variable { task, output } => {
                    let src_task =
                        self.task_named(task).ok_or_else(|| Error::SourceTaskNotFound {
                            task: task.clone(),
                            output: output.clone(),
                        })?;
                    let src = self.task(src_task);
                    let slot = match mode {
                        Mode::Input => src.output_named(&self.specs, output),
                        Mode::Param => src.param_named(&self.specs, output),
                    };
                    let slot = slot.ok_or_else(|| Error::SourceSlotNotFound {
                        task: task.clone(),
                        slot: output.clone(),
                        kind: mode.slot_kind(),
                    })?;
                    cur = slot;
                    cur_task = src_task;
                }
            }
        }
    }

    /// Param-mode walk that also enforces the terminal spec is a literal.
    pub(crate) fn resolve_param_chain(
        &self,
        start: SpecId,
        owner: TaskId,
    ) -> Result<(SpecId, TaskId), Error> {
        let (spec, task) = self.resolve_chain(start, owner, Mode::Param)?;
        match &self.specs.get(spec).rval {
            Rval::Literal(_) => Ok((spec, task)),
            _ => Err(Error::NonLiteralParam(
                self.specs.get(start).name.clone(),
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use syntax::ast::{Spec, TaskDef};

    use super::*;

    fn two_task_workflow() -> Workflow {
        let mut wf = Workflow::default();
        wf.add_task(
            TaskDef::new("tokenize")
                .output(Spec::unbound("out"))
                .param(Spec::literal("lang", "en")),
        )
        .unwrap();
        wf.add_task(
            TaskDef::new("train")
                .input(Spec::variable("corpus", "tokenize", "out"))
                .param(Spec::variable("lang", "tokenize", "lang")),
        )
        .unwrap();
        wf
    }

    fn slot(wf: &Workflow, task: &str, kind: &str, name: &str) -> (SpecId, TaskId) {
        let id = wf.task_named(task).unwrap();
        let t = wf.task(id);
        let spec = match kind {
            "input" => t.input_named(&wf.specs, name),
            "param" => t.param_named(&wf.specs, name),
            _ => t.output_named(&wf.specs, name),
        };
        (spec.unwrap(), id)
    }

    #[test]
    fn test_input_chain_ends_at_source_output() {
        let wf = two_task_workflow();
        let (spec, owner) = slot(&wf, "train", "input", "corpus");
        let (resolved, src_task) = wf.resolve_chain(spec, owner, Mode::Input).unwrap();
        assert_eq!(src_task, wf.task_named("tokenize").unwrap());
        assert!(matches!(wf.specs.get(resolved).rval, Rval::Unbound));
    }

    #[test]
    fn test_param_chain_ends_at_literal() {
        let wf = two_task_workflow();
        let (spec, owner) = slot(&wf, "train", "param", "lang");
        let (resolved, src_task) = wf.resolve_param_chain(spec, owner).unwrap();
        assert_eq!(src_task, wf.task_named("tokenize").unwrap());
        assert!(matches!(&wf.specs.get(resolved).rval, Rval::Literal(v) if v == "en"));
    }

    #[test]
    fn test_missing_source_task() {
        let mut wf = Workflow::default();
        wf.add_task(TaskDef::new("t").input(Spec::variable("in", "nope", "out")))
            .unwrap();
        let (spec, owner) = slot(&wf, "t", "input", "in");
        let err = wf.resolve_chain(spec, owner, Mode::Input).unwrap_err();
        assert!(matches!(err, Error::SourceTaskNotFound { .. }));
    }

    #[test]
    fn test_missing_source_slot() {
        let mut wf = Workflow::default();
        wf.add_task(TaskDef::new("src").output(Spec::unbound("out"))).unwrap();
        wf.add_task(TaskDef::new("t").input(Spec::variable("in", "src", "nope")))
            .unwrap();
        let (spec, owner) = slot(&wf, "t", "input", "in");
        let err = wf.resolve_chain(spec, owner, Mode::Input).unwrap_err();
        assert!(matches!(err, Error::SourceSlotNotFound { .. }));
    }

    #[test]
    fn test_unbound_param_rejected() {
        let mut wf = Workflow::default();
        wf.add_task(TaskDef::new("t").param(Spec::unbound("p"))).unwrap();
        let (spec, owner) = slot(&wf, "t", "param", "p");
        let err = wf.resolve_param_chain(spec, owner).unwrap_err();
        assert!(matches!(err, Error::UnboundParam(_)));
    }

    #[test]
    fn test_reference_cycle_detected() {
        let mut wf = Workflow::default();
        wf.add_task(TaskDef::new("a").param(Spec::variable("p", "b", "q"))).unwrap();
        wf.add_task(TaskDef::new("b").param(Spec::variable("q", "a", "p"))).unwrap();
        let (spec, owner) = slot(&wf, "a", "param", "p");
        let err = wf.resolve_param_chain(spec, owner).unwrap_err();
        assert!(matches!(err, Error::ResolutionCycle(_)));
    }

    #[test]
    fn test_branch_point_mid_walk_rejected() {
        let mut wf = Workflow::default();
        wf.add_task(TaskDef::new("src").param(Spec::branch_point(
            "q",
            "Mem",
            vec![Spec::literal("2gb", "2gb"), Spec::literal("16gb", "16gb")],
        )))
        .unwrap();
        wf.add_task(TaskDef::new("t").param(Spec::variable("p", "src", "q"))).unwrap();
        let (spec, owner) = slot(&wf, "t", "param", "p");
        let err = wf.resolve_param_chain(spec, owner).unwrap_err();
        assert!(matches!(err, Error::UnexpectedBranchPoint(_)));
    }
}
