use crate::{
    BranchId, BranchPointId, BranchRegistry, Error, Realization, SpecId, TaskId, BASELINE_POINT,
};

/// Where a slot's value comes from for one branch: the terminal spec of the
/// resolved variable chain, and the task it is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSource {
    pub spec: SpecId,
    pub task: TaskId,
}

/// One input or param slot with its per-branch resolution table.
///
/// A slot has at most one top-level branch point; unbranched slots use the
/// canonical baseline point with a single entry.
#[derive(Debug)]
pub struct ResolvedSlot {
    /// The task's own spec for this slot.
    pub spec: SpecId,
    /// The branch point whose branches key `entries`.
    pub point: BranchPointId,
    /// One resolved source per branch, in declaration order.
    pub entries: Vec<(BranchId, ResolvedSource)>,
}

impl ResolvedSlot {
    fn select(&self, active: &Realization, reg: &BranchRegistry) -> Result<ResolvedSource, Error> {
        let missing = || Error::MissingBranchForBranchPoint(reg.point_name(self.point).to_owned());
        let branch = active.get(self.point).ok_or_else(missing)?;
        self.entries
            .iter()
            .find(|(b, _)| *b == branch)
            .map(|(_, src)| *src)
            .ok_or_else(missing)
    }
}

/// A resolved-but-unrealized task: every indirection chain followed, all
/// branches still open.
#[derive(Debug)]
pub struct TaskTemplate {
    pub task: TaskId,
    /// Distinct branch points touching this task, in first-touch order.
    /// Every point mentioned in the resolved tables appears here.
    pub branch_points: Vec<BranchPointId>,
    pub inputs: Vec<ResolvedSlot>,
    pub params: Vec<ResolvedSlot>,
}

/// Inputs and params of one realized task:
/// `(own spec, source spec, source task)` per slot, in declaration order.
#[derive(Debug)]
pub struct RealizedVars {
    pub inputs: Vec<(SpecId, SpecId, TaskId)>,
    pub params: Vec<(SpecId, SpecId, TaskId)>,
}

impl TaskTemplate {
    /// True if this template touches only the canonical baseline point.
    pub fn is_baseline_only(&self) -> bool {
        self.branch_points.iter().all(|p| *p == BASELINE_POINT)
    }

    /// Select the per-slot sources matching `active`.
    ///
    /// Every branch point of this template must be covered by `active`;
    /// a gap is an internal invariant violation, not a user error.
    pub fn realize(
        &self,
        active: &Realization,
        reg: &BranchRegistry,
    ) -> Result<RealizedVars, Error> {
        for point in &self.branch_points {
            if !active.covers(*point) {
                return Err(Error::MissingBranchForBranchPoint(
                    reg.point_name(*point).to_owned(),
                ));
            }
        }

        let select_all = |slots: &[ResolvedSlot]| -> Result<Vec<(SpecId, SpecId, TaskId)>, Error> {
            slots
                .iter()
                .map(|slot| {
                    let src = slot.select(active, reg)?;
                    Ok((slot.spec, src.spec, src.task))
                })
                .collect()
        };

        Ok(RealizedVars {
            inputs: select_all(&self.inputs)?,
            params: select_all(&self.params)?,
        })
    }
}
