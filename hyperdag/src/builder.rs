use util::IdVec;

use crate::dag::{HyperDag, HyperEdge, MetaEdge, Vertex};
use crate::{HyperEdgeId, MetaEdgeId, VertexId};

/// Accumulates vertices and edges, then emits an immutable [`HyperDag`].
/// All mutation is confined to this builder.
#[derive(Debug)]
pub struct HyperDagBuilder<V, M, H> {
    vertices: IdVec<VertexId, Vertex<V>>,
    meta_edges: IdVec<MetaEdgeId, MetaEdge<M>>,
    hyper_edges: IdVec<HyperEdgeId, HyperEdge<H>>,
}

impl<V, M, H> Default for HyperDagBuilder<V, M, H> {
    fn default() -> Self {
        Self {
            vertices: IdVec::with_capacity(16),
            meta_edges: IdVec::with_capacity(16),
            hyper_edges: IdVec::with_capacity(32),
        }
    }
}

impl<V, M, H> HyperDagBuilder<V, M, H> {
    /// Add a real vertex carrying `payload`.
    pub fn add_vertex(&mut self, payload: V) -> VertexId {
        self.vertices.push(Vertex {
            payload: Some(payload),
            in_edges: Vec::new(),
        })
    }

    /// Add a phantom vertex: usable as a hyperedge tail, but skipped by
    /// execution-order traversal.
    pub fn add_phantom(&mut self) -> VertexId {
        self.vertices.push(Vertex {
            payload: None,
            in_edges: Vec::new(),
        })
    }

    /// Add an empty meta-edge with the given head and label.
    pub fn add_meta_edge(&mut self, head: VertexId, label: M) -> MetaEdgeId {
        let id = self.meta_edges.push(MetaEdge {
            label,
            head,
            hyperedges: Vec::new(),
        });
        self.vertices.get_mut(head).in_edges.push(id);
        id
    }

    /// Add a hyperedge (one labelled alternative) to an existing meta-edge.
    pub fn add_hyper_edge(&mut self, meta: MetaEdgeId, label: H, tails: Vec<VertexId>) -> HyperEdgeId {
        let id = self.hyper_edges.push(HyperEdge { label, tails });
        self.meta_edges.get_mut(meta).hyperedges.push(id);
        id
    }

    /// Finish construction.
    pub fn build(self) -> HyperDag<V, M, H> {
        HyperDag {
            vertices: self.vertices,
            meta_edges: self.meta_edges,
            hyper_edges: self.hyper_edges,
        }
    }
}
