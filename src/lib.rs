//!
//! Workflow compilation and realization engine for experimental pipelines.
//!
//! Users declare named tasks (shell commands with typed input/output file
//! slots and parameter slots); the engine compiles those declarations into
//! a dependency graph, expands the graph across the cross-product of
//! declared branch points, and maps the resulting concrete task instances
//! onto on-disk locations, with integer workflow versions so reruns can
//! reuse prior outputs.
//!
//! The pipeline, end to end:
//!
//! ```text
//! ast -> workflow::Workflow -> workflow::TaskGraph -> unpack::Unpacked
//!        -> [input checker, directory layout, version history] -> plan
//! ```
//!
//! Compilation and unpacking are single-threaded and purely functional;
//! everything they produce is immutable and can be shared across execution
//! threads without locking. The only side-effectful startup phase is
//! [`version::WorkflowVersionHistory::load`], which may delete corrupt
//! version directories and must run exactly once, before any visitor.

pub mod check;
pub mod fs;
pub mod plan;
pub mod version;

pub use check::{InputChecker, InputFileNotFound, MissingInputs};
pub use fs::{Fs, Layout};
pub use plan::{CompletionChecker, ExecutionPlan, PlanEntry};
pub use version::{
    UnionWorkflowVersionInfo, VersionedTaskId, WorkflowVersionHistory, WorkflowVersionInfo,
};
