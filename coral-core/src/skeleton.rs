use crate::types::{NodeId, Segment};
use glam::DVec3;

#[derive(Debug, Clone)]
pub struct SkeletonNode {
    pub pos: DVec3,
    /// Generation at which this node was placed; the root is generation 0.
    pub generation: u32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena of every point placed during a run.
///
/// Nodes are appended in emission order and never removed, so node `i`
/// (for `i >= 1`) is the end of the `i - 1`th emitted segment.
#[derive(Debug, Clone)]
pub struct Skeleton {
    pub nodes: Vec<SkeletonNode>,
}

impl SkeletonNode {
    pub fn new_root(pos: DVec3) -> Self {
        Self {
            pos,
            generation: 0,
            parent: None,
            children: Vec::with_capacity(2),
        }
    }

    pub fn new_child(pos: DVec3, generation: u32, parent: NodeId) -> Self {
        Self {
            pos,
            generation,
            parent: Some(parent),
            children: Vec::with_capacity(2),
        }
    }
}

impl Skeleton {
    pub fn new(root_pos: DVec3) -> Self {
        Self {
            nodes: vec![SkeletonNode::new_root(root_pos)],
        }
    }

    pub fn add_child(&mut self, parent: NodeId, pos: DVec3, generation: u32) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SkeletonNode::new_child(pos, generation, parent));
        self.nodes[parent].children.push(id);
        id
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.nodes.len() - 1
    }

    /// The segment ending at `id`, or `None` for the root.
    pub fn segment_to(&self, id: NodeId) -> Option<Segment> {
        let node = &self.nodes[id];
        node.parent
            .map(|p| Segment::new(self.nodes[p].pos, node.pos))
    }

    /// All segments in emission order.
    pub fn segments(&self) -> Vec<Segment> {
        (1..self.nodes.len())
            .filter_map(|id| self.segment_to(id))
            .collect()
    }

    /// Nodes with no children: the final tips of every lineage.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, n)| n.children.is_empty().then_some(id))
    }
}

/// Inspection helpers for tests.
#[cfg(test)]
impl Skeleton {
    /// Number of segments whose end node was placed at `generation`.
    pub fn count_at_generation(&self, generation: u32) -> usize {
        self.nodes
            .iter()
            .skip(1)
            .filter(|n| n.generation == generation)
            .count()
    }

    /// Smallest distance between any two distinct nodes, if there are two.
    pub fn min_pairwise_distance(&self) -> Option<f64> {
        let mut best: Option<f64> = None;
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                let d = a.pos.distance(b.pos);
                best = Some(best.map_or(d, |m| m.min(d)));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_skeleton_has_root_and_no_segments() {
        let s = Skeleton::new(DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.nodes.len(), 1);
        assert_eq!(s.segment_count(), 0);
        assert!(s.segments().is_empty());
        assert_eq!(s.nodes[0].pos, DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(s.segment_to(0), None);
    }

    #[test]
    fn add_child_links_parent_and_emits_segment() {
        let mut s = Skeleton::new(DVec3::ZERO);
        let a = s.add_child(0, DVec3::Z, 1);
        let b = s.add_child(a, DVec3::new(0.0, 1.0, 2.0), 2);
        let c = s.add_child(a, DVec3::new(0.0, -1.0, 2.0), 2);

        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(s.nodes[0].children, vec![a]);
        assert_eq!(s.nodes[a].children, vec![b, c]);
        assert_eq!(s.nodes[c].parent, Some(a));

        let segs = s.segments();
        assert_eq!(segs.len(), 3);
        // Emission order is preserved.
        assert_eq!(segs[0], Segment::new(DVec3::ZERO, DVec3::Z));
        assert_eq!(segs[2], Segment::new(DVec3::Z, DVec3::new(0.0, -1.0, 2.0)));

        assert_eq!(s.count_at_generation(1), 1);
        assert_eq!(s.count_at_generation(2), 2);
        assert_eq!(s.leaves().collect::<Vec<_>>(), vec![b, c]);
    }

    #[test]
    fn min_pairwise_distance_over_all_nodes() {
        let mut s = Skeleton::new(DVec3::ZERO);
        assert_eq!(s.min_pairwise_distance(), None);

        s.add_child(0, DVec3::new(3.0, 0.0, 0.0), 1);
        s.add_child(1, DVec3::new(3.0, 0.5, 0.0), 2);
        assert_eq!(s.min_pairwise_distance(), Some(0.5));
    }
}
