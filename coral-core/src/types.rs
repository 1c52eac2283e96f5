use glam::DVec3;

/// Identifier for a node in a [`crate::skeleton::Skeleton`].
///
/// This is an index into `Skeleton::nodes`, and is only meaningful within
/// the lifetime of a given `Skeleton` instance.
pub type NodeId = usize;

/// Plain `(x, y, z)` coordinate triple used at the call boundary.
pub type Triple = [f64; 3];

/// One grown branch edge, from the parent tip position to the new tip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: DVec3,
    pub end: DVec3,
}

impl Segment {
    pub fn new(start: DVec3, end: DVec3) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Converts the segment into a pair of plain coordinate triples.
    pub fn to_triples(&self) -> (Triple, Triple) {
        (self.start.to_array(), self.end.to_array())
    }
}
