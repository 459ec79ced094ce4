//! Pointer flow graph: an edge `s -> t` means that the points-to set of `t`
//! includes the one of `s`.

use crate::pta::element::PointerId;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction::Outgoing;

#[derive(Debug, Default)]
pub struct PointerFlowGraph {
    inner: DiGraphMap<PointerId, ()>,
}

impl PointerFlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge, returns `true` if it was not already in the graph.
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        if self.inner.contains_edge(source, target) {
            return false;
        }
        self.inner.add_edge(source, target, ());
        true
    }

    pub fn succs_of(&self, ptr: PointerId) -> impl Iterator<Item = PointerId> + '_ {
        self.inner.neighbors_directed(ptr, Outgoing)
    }

    pub fn nb_edges(&self) -> usize {
        self.inner.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pta::arena::Idx;

    #[test]
    fn edges_are_deduplicated() {
        let mut pfg = PointerFlowGraph::new();
        let (a, b, c) = (Idx::new(0), Idx::new(1), Idx::new(2));
        assert!(pfg.add_edge(a, b));
        assert!(!pfg.add_edge(a, b));
        assert!(pfg.add_edge(a, c));
        // cycles are fine
        assert!(pfg.add_edge(b, a));
        assert_eq!(pfg.nb_edges(), 3);
        let mut succs: Vec<PointerId> = pfg.succs_of(a).collect();
        succs.sort();
        assert_eq!(succs, vec![b, c]);
        assert_eq!(pfg.succs_of(c).count(), 0);
    }
}
