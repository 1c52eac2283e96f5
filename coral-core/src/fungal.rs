//! Hyphal network growth over a surface.
//!
//! Tips live on a surface described by a small adapter trait, [`Surface`],
//! so the model works on any parametric surface the caller can project
//! onto. Each iteration extends every tip by one step along the surface,
//! possibly branching, and records the step as a world-space [`Segment`].

use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{Checks, ConfigError},
    rng::GrowthRng,
    spatial::EndpointGrid,
    types::Segment,
};

/// Orthonormal frame at a surface point: two tangents and the normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFrame {
    pub t1: DVec3,
    pub t2: DVec3,
    pub normal: DVec3,
}

/// Minimal parametric-surface adapter.
pub trait Surface {
    /// Parameters of the surface point closest to `p`.
    fn closest_uv(&self, p: DVec3) -> DVec2;

    /// World position at parameters `uv`.
    fn point_at(&self, uv: DVec2) -> DVec3;

    /// Tangent frame at parameters `uv`.
    fn frame_at(&self, uv: DVec2) -> SurfaceFrame;

    /// Moves `length` along `dir` starting at `uv`.
    ///
    /// The default steps in world space and projects back onto the
    /// surface; adapters with exact geodesics should override it.
    fn step(&self, uv: DVec2, dir: DVec3, length: f64) -> (DVec2, DVec3) {
        let guess = self.point_at(uv) + dir * length;
        let uv2 = self.closest_uv(guess);
        (uv2, self.point_at(uv2))
    }
}

/// The `z = 0` plane, parameterized by `(u, v) = (x, y)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct XyPlane;

impl Surface for XyPlane {
    fn closest_uv(&self, p: DVec3) -> DVec2 {
        p.truncate()
    }

    fn point_at(&self, uv: DVec2) -> DVec3 {
        uv.extend(0.0)
    }

    fn frame_at(&self, _uv: DVec2) -> SurfaceFrame {
        SurfaceFrame {
            t1: DVec3::X,
            t2: DVec3::Y,
            normal: DVec3::Z,
        }
    }

    fn step(&self, uv: DVec2, dir: DVec3, length: f64) -> (DVec2, DVec3) {
        let uv2 = uv + dir.truncate() * length;
        (uv2, uv2.extend(0.0))
    }
}

/// Parameters for [`FungalEngine`]. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FungalConfig {
    pub iterations: u32,
    /// Length of one hyphal extension.
    pub step_length: f64,
    /// Chance that a tip branches into two children.
    pub branch_probability: f64,
    /// Maximum in-plane turn of a child direction.
    pub angle_spread: f64,
    /// Chance that a tip dies at an iteration.
    pub terminate_probability: f64,
    /// Minimum distance between nodes. `0` disables crowding control.
    pub min_spacing: f64,
    pub seed: Option<u64>,
}

impl Default for FungalConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            step_length: 1.0,
            branch_probability: 0.2,
            angle_spread: 30.0,
            terminate_probability: 0.0,
            min_spacing: 0.0,
            seed: None,
        }
    }
}

impl FungalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut checks = Checks::default();
        checks.require(
            self.step_length.is_finite() && self.step_length > 0.0,
            "step_length",
            "must be finite and > 0",
            self.step_length,
        );
        checks.unit(self.branch_probability, "branch_probability");
        checks.non_negative(self.angle_spread, "angle_spread");
        checks.unit(self.terminate_probability, "terminate_probability");
        checks.non_negative(self.min_spacing, "min_spacing");
        checks.finish()
    }
}

/// Local nutrient level at surface parameters, expected in `[0, 1]`.
pub type NutrientFn<'a> = &'a dyn Fn(DVec2) -> f64;

#[derive(Debug, Clone, Copy)]
struct Hypha {
    uv: DVec2,
    pos: DVec3,
    dir: DVec3,
}

/// Grows hyphal networks from a validated [`FungalConfig`].
#[derive(Debug, Clone)]
pub struct FungalEngine {
    config: FungalConfig,
    rng: GrowthRng,
}

impl FungalEngine {
    pub fn new(config: FungalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = GrowthRng::new(config.seed);
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &FungalConfig {
        &self.config
    }

    /// Grows a network from `spores` over `surface`.
    ///
    /// Every spore is projected onto the surface and starts one tip with a
    /// random tangent direction. Per tip and iteration the draws are:
    /// termination, branching, then one turn angle per child.
    ///
    /// ### Parameters
    /// - `surface` - Adapter for the surface to grow on.
    /// - `spores` - World-space starting points.
    /// - `nutrient` - Optional field scaling the branch probability by
    ///   `0.75..=1.25` and the step length by `0.5..=1.5`.
    ///
    /// ### Returns
    /// World-space segments in emission order.
    pub fn grow<S: Surface + ?Sized>(
        &mut self,
        surface: &S,
        spores: &[DVec3],
        nutrient: Option<NutrientFn<'_>>,
    ) -> Vec<Segment> {
        let cfg = &self.config;
        let spread = cfg.angle_spread.to_radians();

        let mut grid = (cfg.min_spacing > 0.0).then(|| EndpointGrid::new(cfg.min_spacing));
        let mut segments = Vec::new();

        let mut tips: Vec<Hypha> = spores
            .iter()
            .map(|&sp| {
                let uv = surface.closest_uv(sp);
                let frame = surface.frame_at(uv);
                let (sin, cos) = self.rng.range(0.0, TAU).sin_cos();
                let dir = (frame.t1 * cos + frame.t2 * sin).normalize_or(frame.t1);
                let pos = surface.point_at(uv);
                if let Some(grid) = grid.as_mut() {
                    grid.insert(pos);
                }
                Hypha { uv, pos, dir }
            })
            .collect();

        for iteration in 0..cfg.iterations {
            if tips.is_empty() {
                break;
            }

            let mut next = Vec::with_capacity(tips.len() * 2);
            for tip in &tips {
                if self.rng.chance(cfg.terminate_probability) {
                    continue;
                }

                let (branch_p, step_len) = match nutrient {
                    Some(f) => {
                        let v = f(tip.uv).clamp(0.0, 1.0);
                        (
                            (cfg.branch_probability * (0.75 + 0.5 * v)).clamp(0.0, 1.0),
                            cfg.step_length * (0.5 + v),
                        )
                    }
                    None => (cfg.branch_probability, cfg.step_length),
                };

                let children = if self.rng.chance(branch_p) { 2 } else { 1 };
                for _ in 0..children {
                    let frame = surface.frame_at(tip.uv);
                    let tangent = (tip.dir - frame.normal * tip.dir.dot(frame.normal))
                        .normalize_or(frame.t1);

                    // Turn within the tangent plane, expressed in (t1, t2).
                    let (sin, cos) = self.rng.range(-spread, spread).sin_cos();
                    let a = tangent.dot(frame.t1);
                    let b = tangent.dot(frame.t2);
                    let dir = (frame.t1 * (a * cos - b * sin) + frame.t2 * (a * sin + b * cos))
                        .normalize_or(frame.t1);

                    let (uv, pos) = surface.step(tip.uv, dir, step_len);

                    if let Some(grid) = grid.as_mut() {
                        if grid.crowds(pos) {
                            continue;
                        }
                        grid.insert(pos);
                    }

                    segments.push(Segment::new(tip.pos, pos));
                    next.push(Hypha { uv, pos, dir });
                }
            }

            tips = next;
            debug!(
                iteration,
                active_tips = tips.len(),
                segments = segments.len(),
                "fungal iteration complete"
            );
        }

        info!(
            seed = ?self.rng.seed(),
            spores = spores.len(),
            segments = segments.len(),
            "fungal growth finished"
        );
        segments
    }
}
