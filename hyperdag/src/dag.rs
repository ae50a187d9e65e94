use std::collections::VecDeque;

use util::{HashSet, IdVec};

use crate::{Error, HyperEdgeId, MetaEdgeId, VertexId};

#[derive(Debug)]
pub(crate) struct Vertex<V> {
    /// `None` marks a phantom vertex.
    pub(crate) payload: Option<V>,
    /// Meta-edges whose head is this vertex.
    pub(crate) in_edges: Vec<MetaEdgeId>,
}

/// Groups the hyperedges of one label incident to a vertex.
/// Selecting one value of the label selects exactly one hyperedge.
#[derive(Debug)]
pub struct MetaEdge<M> {
    pub label: M,
    pub head: VertexId,
    pub hyperedges: Vec<HyperEdgeId>,
}

/// One alternative within a meta-edge: a labelled set of tail vertices.
#[derive(Debug)]
pub struct HyperEdge<H> {
    pub label: H,
    pub tails: Vec<VertexId>,
}

/// An immutable DAG of vertices, meta-edges, and hyperedges.
#[derive(Debug)]
pub struct HyperDag<V, M, H> {
    pub(crate) vertices: IdVec<VertexId, Vertex<V>>,
    pub(crate) meta_edges: IdVec<MetaEdgeId, MetaEdge<M>>,
    pub(crate) hyper_edges: IdVec<HyperEdgeId, HyperEdge<H>>,
}

impl<V, M, H> HyperDag<V, M, H> {
    /// Number of vertices, phantoms included.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Payload of vertex `v`; `None` if `v` is phantom.
    #[inline]
    pub fn payload(&self, v: VertexId) -> Option<&V> {
        self.vertices.get(v).payload.as_ref()
    }

    #[inline]
    pub fn is_phantom(&self, v: VertexId) -> bool {
        self.vertices.get(v).payload.is_none()
    }

    /// Meta-edges whose head is `v`, in insertion order.
    #[inline]
    pub fn in_edges(&self, v: VertexId) -> &[MetaEdgeId] {
        &self.vertices.get(v).in_edges
    }

    #[inline]
    pub fn meta_edge(&self, id: MetaEdgeId) -> &MetaEdge<M> {
        self.meta_edges.get(id)
    }

    #[inline]
    pub fn hyper_edge(&self, id: HyperEdgeId) -> &HyperEdge<H> {
        self.hyper_edges.get(id)
    }

    /// Iterate over real (non-phantom) vertices in insertion order.
    pub fn real_vertices(&self) -> impl Iterator<Item = (VertexId, &V)> {
        self.vertices
            .enumerate()
            .filter_map(|(id, v)| v.payload.as_ref().map(|p| (id, p)))
    }

    /// Distinct real vertices that `v` depends on across all of its
    /// hyperedges, in first-seen order.
    pub fn dependencies(&self, v: VertexId) -> Vec<VertexId> {
        let mut seen = HashSet::default();
        let mut deps = Vec::new();
        for me in self.in_edges(v) {
            for he in &self.meta_edge(*me).hyperedges {
                for tail in &self.hyper_edge(*he).tails {
                    if !self.is_phantom(*tail) && seen.insert(*tail) {
                        deps.push(*tail);
                    }
                }
            }
        }
        deps
    }

    /// Real vertices from which any of `goals` is reachable, goals included.
    pub fn ancestors(&self, goals: &[VertexId]) -> HashSet<VertexId> {
        let mut seen: HashSet<VertexId> = goals.iter().copied().collect();
        let mut queue: VecDeque<VertexId> = goals.iter().copied().collect();
        while let Some(v) = queue.pop_front() {
            for dep in self.dependencies(v) {
                if seen.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }
        seen
    }

    /// Topological order over real vertices; phantom tails contribute no
    /// ordering. Insertion order breaks ties, so the result is stable for
    /// identical graphs.
    pub fn topo_order(&self) -> Result<Vec<VertexId>, Error> {
        let mut in_deg: IdVec<VertexId, usize> = IdVec::with_capacity(self.vertices.len());
        let mut children: IdVec<VertexId, Vec<VertexId>> =
            IdVec::with_capacity(self.vertices.len());
        for _ in 0..self.vertices.len() {
            in_deg.push(0);
            children.push(Vec::new());
        }

        let mut real_count = 0;
        for (v, _) in self.real_vertices() {
            real_count += 1;
            let deps = self.dependencies(v);
            *in_deg.get_mut(v) = deps.len();
            for dep in deps {
                children.get_mut(dep).push(v);
            }
        }

        let mut queue: VecDeque<VertexId> = self
            .real_vertices()
            .filter(|(v, _)| *in_deg.get(*v) == 0)
            .map(|(v, _)| v)
            .collect();

        let mut order = Vec::with_capacity(real_count);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for child in children.get(v) {
                let deg = in_deg.get_mut(*child);
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(*child);
                }
            }
        }

        if order.len() < real_count {
            return Err(Error::Cycle);
        }
        Ok(order)
    }
}

#[cfg(test)]
mod test {
    use crate::HyperDagBuilder;

    /// a -> b -> d, a -> c -> d (labels are unit; one hyperedge per meta-edge)
    fn diamond() -> (
        crate::HyperDag<&'static str, (), ()>,
        [crate::VertexId; 4],
    ) {
        let mut b = HyperDagBuilder::default();
        let a = b.add_vertex("a");
        let bb = b.add_vertex("b");
        let c = b.add_vertex("c");
        let d = b.add_vertex("d");
        for (head, tails) in [(bb, vec![a]), (c, vec![a]), (d, vec![bb, c])] {
            let me = b.add_meta_edge(head, ());
            b.add_hyper_edge(me, (), tails);
        }
        (b.build(), [a, bb, c, d])
    }

    #[test]
    fn test_topo_order_diamond() {
        let (dag, [a, b, c, d]) = diamond();
        assert_eq!(dag.topo_order().unwrap(), vec![a, b, c, d]);
    }

    #[test]
    fn test_phantoms_skipped() {
        let mut b = HyperDagBuilder::default();
        let v = b.add_vertex("v");
        let ph = b.add_phantom();
        let me = b.add_meta_edge(v, ());
        b.add_hyper_edge(me, (), vec![ph]);
        let dag = b.build();
        assert!(dag.is_phantom(ph));
        assert!(dag.dependencies(v).is_empty());
        assert_eq!(dag.topo_order().unwrap(), vec![v]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut b = HyperDagBuilder::default();
        let x = b.add_vertex("x");
        let y = b.add_vertex("y");
        for (head, tail) in [(x, y), (y, x)] {
            let me = b.add_meta_edge(head, ());
            b.add_hyper_edge(me, (), vec![tail]);
        }
        assert!(b.build().topo_order().is_err());
    }

    #[test]
    fn test_ancestors() {
        let (dag, [a, b, c, d]) = diamond();
        let anc = dag.ancestors(&[b]);
        assert!(anc.contains(&a) && anc.contains(&b));
        assert!(!anc.contains(&c) && !anc.contains(&d));
    }
}
