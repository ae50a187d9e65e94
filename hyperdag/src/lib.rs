//!
//! A directed acyclic graph with two extensions used to model branching
//! workflows:
//!
//! * A *hyperedge* groups multiple in-edges into a single logical
//!   alternative: selecting the hyperedge selects all of its tail vertices
//!   at once.
//! * A *meta-edge* groups multiple hyperedges under a label, so that
//!   selecting one value of the label selects exactly one hyperedge.
//!
//! Vertices may be *phantom*: present for dependency bookkeeping, but
//! invisible to execution-order traversal.
//!
//! Construction happens through [`HyperDagBuilder`]; the [`HyperDag`] it
//! returns is immutable.

mod dag;
pub use dag::{HyperDag, HyperEdge, MetaEdge};

mod builder;
pub use builder::HyperDagBuilder;

util::id!(VertexId, u32);
util::id!(MetaEdgeId, u32);
util::id!(HyperEdgeId, u32);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Dependency cycle detected in the task graph")]
    Cycle,
}
