use glam::{DVec3, I64Vec3};
use std::collections::HashMap;

/// Largest cell coordinate magnitude. Cells past it are clamped onto the
/// boundary, where their points are still compared exactly.
const MAX_CELL: f64 = 1_073_741_824.0;

/// Relative widening of the cell edge over the radius. Covers the rounding
/// of `p / edge` within [`MAX_CELL`].
const EDGE_SLACK: f64 = 1e-6;

/// A uniform hash grid over placed endpoints, used for crowding checks.
///
/// The cell edge is just over the query radius, so any point closer than
/// the radius to a query lies in the query's cell or one of its 26
/// neighbours. Clamping cell coordinates is monotone and keeps that
/// property, so tiny radii or far-away points only cost speed.
/// Points are only ever inserted, never moved or removed, which matches how
/// a growth run places endpoints.
///
/// Lookups only touch the hash map by key, so results never depend on the
/// map's iteration order.
#[derive(Debug, Clone)]
pub struct EndpointGrid {
    /// Query radius.
    radius: f64,
    /// Cell edge length.
    edge: f64,
    /// Points bucketed by integer cell coordinate.
    cells: HashMap<I64Vec3, Vec<DVec3>>,
}

impl EndpointGrid {
    /// Creates an empty grid for the given crowding radius.
    ///
    /// ### Parameters
    /// - `radius` - Minimum allowed distance between points; must be `> 0`.
    ///
    /// ### Returns
    /// A new, empty [`EndpointGrid`].
    pub fn new(radius: f64) -> Self {
        debug_assert!(radius > 0.0, "grid radius must be positive");
        Self {
            radius,
            edge: radius * (1.0 + EDGE_SLACK),
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn cell_of(&self, p: DVec3) -> I64Vec3 {
        (p / self.edge)
            .floor()
            .clamp(DVec3::splat(-MAX_CELL), DVec3::splat(MAX_CELL))
            .as_i64vec3()
    }

    /// Records a placed endpoint.
    pub fn insert(&mut self, p: DVec3) {
        let key = self.cell_of(p);
        self.cells.entry(key).or_default().push(p);
    }

    /// Returns `true` if any stored point lies strictly closer than the
    /// grid radius to `p`.
    ///
    /// ### Parameters
    /// - `p` - Candidate position.
    ///
    /// ### Returns
    /// `true` if placing `p` would crowd an existing endpoint.
    pub fn crowds(&self, p: DVec3) -> bool {
        let r2 = self.radius * self.radius;
        let center = self.cell_of(p);

        for dz in -1..=1 {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let key = center + I64Vec3::new(dx, dy, dz);
                    if let Some(points) = self.cells.get(&key)
                        && points.iter().any(|q| q.distance_squared(p) < r2)
                    {
                        return true;
                    }
                }
            }
        }
        false
    }
}
