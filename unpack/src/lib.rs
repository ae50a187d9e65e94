//!
//! Enumerates the concrete realized tasks of a [`workflow::TaskGraph`].
//!
//! The unpacker walks real vertices in dependency order. At each vertex it
//! takes the Cartesian product of branch choices over the vertex's
//! meta-edges (one branch per branch point), joins in the branch
//! assignments inherited from the chosen parents, and prunes any
//! combination where two paths disagree on a shared branch point. Each
//! surviving assignment becomes one [`RealTask`].
//!
//! The emission order is deterministic: topological order of vertices,
//! then lexicographic order of branch-point names, then declaration order
//! of branches. Realization names are user-visible, so this order is part
//! of the contract.

mod unpacker;
pub use unpacker::{unpack, RealTask, Unpacked};

mod visit;
pub use visit::{TaskState, Visit};

util::id!(RealTaskId, u32);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Goal task not found: [{0}]")]
    GoalTaskNotFound(String),
}
