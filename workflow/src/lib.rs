//!
//! Compiles parsed task definitions into a graph of task templates.
//!
//! Loading happens in two phases. First, [`Workflow`] accumulates task
//! definitions, flattening their specs into an arena and registering branch
//! points as it goes. Then [`Workflow::build`] resolves every input and
//! parameter through its chain of variable references, peels branch points
//! off the top level of each spec, and emits a [`TaskGraph`]: one
//! [`TaskTemplate`] per task, wired into a meta-hyper-DAG whose meta-edges
//! are branch points and whose hyperedges are branches.

mod id;
pub use id::{BranchId, BranchPointId, SpecId, TaskId};

mod branch;
pub use branch::{BranchRegistry, Realization, BASELINE_BRANCH, BASELINE_POINT};

mod spec;
pub use spec::{Rval, Spec, SpecTable};

mod task;
pub use task::Task;

mod workflow;
pub use workflow::Workflow;

mod resolve;

mod template;
pub use template::{RealizedVars, ResolvedSlot, ResolvedSource, TaskTemplate};

mod build;
pub use build::TaskGraph;

/// Joins branch names in a realization name, e.g. "small-2gb".
pub const REALIZATION_DELIM: char = '-';

/// Name rendered for a realization with no non-baseline branches.
pub const BASELINE_NAME: &str = "baseline";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Duplicate task name: [{0}]")]
    DuplicateTaskName(String),
    #[error("Source task not found: ${output}@{task}")]
    SourceTaskNotFound { task: String, output: String },
    #[error("Task [{task}] has no {kind} named \"{slot}\"")]
    SourceSlotNotFound {
        task: String,
        slot: String,
        kind: &'static str,
    },
    #[error("Branch point \"{0}\" is not allowed inside a variable chain; branch points may only appear at the top level of a spec")]
    UnexpectedBranchPoint(String),
    #[error("Parameter \"{0}\" resolved to an unbound value")]
    UnboundParam(String),
    #[error("Parameter \"{0}\" did not resolve to a literal")]
    NonLiteralParam(String),
    #[error("Cycle detected while resolving \"{0}\"")]
    ResolutionCycle(String),
    #[error("Branch point \"{name}\" redeclared with a different set of branches (was [{prev}], now [{cur}])")]
    BranchPointRedeclarationMismatch {
        name: String,
        prev: String,
        cur: String,
    },
    #[error("Realization is missing a branch for branch point \"{0}\"")]
    MissingBranchForBranchPoint(String),
}
