//! The branch-growth algorithm.
//!
//! A run advances every active tip once per generation, in insertion
//! order:
//! 1. Stem gating: while `g < stem_generations` a tip always continues
//!    as a single child and no decision draws are made.
//! 2. [`GrowthEngine::decide`]: age-based pruning, termination, then the
//!    split decision, one draw each.
//! 3. [`GrowthEngine::extend`], per child: jittered deviation angle and
//!    length, a cone-sampled twisted direction, and the avoidance check.
//!    Surviving children are appended to the [`Skeleton`] and become the
//!    next generation's tips.
//!
//! Termination is decided before emission: a retired tip emits nothing at
//! the generation it dies.

use glam::DVec3;
use tracing::{debug, info, warn};

use crate::{
    config::GrowthConfig,
    direction,
    error::ConfigError,
    rng::GrowthRng,
    skeleton::Skeleton,
    spatial::EndpointGrid,
    types::{NodeId, Segment, Triple},
};

/// Re-draws allowed for a crowded candidate before the child is dropped.
pub const MAX_AVOID_RETRIES: usize = 8;

/// Lower clamp for segment lengths.
pub const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Upper clamp for the per-child deviation angle, in degrees.
pub const MAX_DEVIATION_DEG: f64 = 180.0;

/// One actively growing branch end.
#[derive(Debug, Clone, Copy)]
struct Tip {
    /// Skeleton node holding the tip position.
    node: NodeId,
    dir: DVec3,
    generation: u32,
    in_stem: bool,
    /// On the first-child chain from the root.
    trunk: bool,
    /// Generation at which the current unsplit branch started.
    born: u32,
}

impl Tip {
    fn root(dir: DVec3, in_stem: bool) -> Self {
        Self {
            node: 0,
            dir,
            generation: 0,
            in_stem,
            trunk: true,
            born: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fate {
    Pruned,
    Terminated,
    Continue,
    Split,
}

/// Counters describing what happened during a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Generations that actually ran before the tips ran out.
    pub generations: u32,
    pub splits: usize,
    pub terminated: usize,
    pub pruned: usize,
    /// Candidates re-drawn because they crowded an existing endpoint.
    pub avoid_retries: usize,
    /// Children dropped after exhausting [`MAX_AVOID_RETRIES`].
    pub crowded_out: usize,
}

/// Result of [`GrowthEngine::run`].
#[derive(Debug, Clone)]
pub struct GrowthOutcome {
    pub skeleton: Skeleton,
    pub stats: GrowthStats,
}

impl GrowthOutcome {
    /// All emitted segments in emission order.
    pub fn segments(&self) -> Vec<Segment> {
        self.skeleton.segments()
    }
}

/// Mutable state threaded through one run.
struct RunState {
    axis: DVec3,
    skeleton: Skeleton,
    grid: Option<EndpointGrid>,
    stats: GrowthStats,
}

/// Owns a validated configuration and the random stream for growing it.
#[derive(Debug, Clone)]
pub struct GrowthEngine {
    config: GrowthConfig,
    rng: GrowthRng,
}

impl GrowthEngine {
    /// Validates `config` and seeds the stream from `config.seed`.
    ///
    /// ### Returns
    /// - `Ok(engine)` ready to grow.
    /// - `Err(ConfigError::InvalidConfiguration)` naming every parameter
    ///   outside its domain. Nothing is grown in that case.
    pub fn new(config: GrowthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = GrowthRng::new(config.seed);
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    /// Grows from `start` and returns the ordered segment list.
    pub fn grow(&mut self, start: DVec3) -> Vec<Segment> {
        self.run(start).segments()
    }

    /// Grows from `start`, keeping the node arena and run statistics.
    ///
    /// Each call continues the engine's random stream, so only the first
    /// run after [`GrowthEngine::new`] reproduces a seeded result.
    pub fn run(&mut self, start: DVec3) -> GrowthOutcome {
        let cfg = &self.config;
        let axis = cfg.axis();

        let grid = (cfg.avoid_radius > 0.0).then(|| {
            let mut grid = EndpointGrid::new(cfg.avoid_radius);
            grid.insert(start);
            grid
        });
        if cfg.avoid_radius > cfg.branch_length * (1.0 + cfg.length_jitter) {
            warn!(
                avoid_radius = cfg.avoid_radius,
                branch_length = cfg.branch_length,
                "avoid radius exceeds every possible segment length; all tips will be crowded out"
            );
        }

        let mut state = RunState {
            axis,
            skeleton: Skeleton::new(start),
            grid,
            stats: GrowthStats::default(),
        };
        let mut tips = vec![Tip::root(axis, cfg.stem_generations > 0)];

        for g in 0..self.config.iterations {
            if tips.is_empty() {
                break;
            }

            let mut next = Vec::with_capacity(tips.len() * 2);
            for tip in &tips {
                let children = match self.decide(tip, g) {
                    Fate::Pruned => {
                        state.stats.pruned += 1;
                        continue;
                    }
                    Fate::Terminated => {
                        state.stats.terminated += 1;
                        continue;
                    }
                    Fate::Continue => 1,
                    Fate::Split => {
                        state.stats.splits += 1;
                        2
                    }
                };

                for child in 0..children {
                    if let Some(new_tip) = self.extend(tip, child, children == 2, &mut state) {
                        next.push(new_tip);
                    }
                }
            }

            tips = next;
            state.stats.generations = g + 1;
            debug!(
                generation = g,
                active_tips = tips.len(),
                segments = state.skeleton.segment_count(),
                "generation complete"
            );
        }

        let stats = state.stats;
        info!(
            seed = ?self.rng.seed(),
            segments = state.skeleton.segment_count(),
            generations = stats.generations,
            splits = stats.splits,
            terminated = stats.terminated,
            pruned = stats.pruned,
            crowded_out = stats.crowded_out,
            leaves = state.skeleton.leaves().count(),
            "growth finished"
        );

        GrowthOutcome {
            skeleton: state.skeleton,
            stats,
        }
    }

    /// Decides what a tip does at generation `g`.
    ///
    /// Stem tips always continue. Otherwise the draws are, in order: the
    /// age-based prune (only when `age_based_prune > 0`), termination, and
    /// the split decision.
    fn decide(&mut self, tip: &Tip, g: u32) -> Fate {
        if tip.in_stem {
            return Fate::Continue;
        }

        let cfg = &self.config;
        if cfg.age_based_prune > 0.0 {
            let age = g.saturating_sub(tip.born);
            let p = 1.0 - (1.0 - cfg.age_based_prune).powi(age as i32);
            if self.rng.chance(p) {
                return Fate::Pruned;
            }
        }

        if self.rng.chance(cfg.terminate_probability) {
            return Fate::Terminated;
        }

        if self.rng.chance(cfg.split_probability) {
            Fate::Split
        } else {
            Fate::Continue
        }
    }

    /// Grows one child of `parent` and records it in the skeleton.
    ///
    /// Draw order: angle jitter, length jitter, then one cone sample per
    /// placement attempt. With avoidance enabled, a candidate that crowds
    /// an existing endpoint is re-sampled with the same angle bound and
    /// length up to [`MAX_AVOID_RETRIES`] times before the child is dropped.
    ///
    /// ### Parameters
    /// - `parent` - Tip being advanced.
    /// - `child` - Index of this child among its siblings (0 or 1).
    /// - `split` - Whether `parent` split at this generation.
    /// - `state` - Skeleton, endpoint grid and counters of the run.
    ///
    /// ### Returns
    /// The new tip, or `None` if the child was crowded out.
    fn extend(
        &mut self,
        parent: &Tip,
        child: usize,
        split: bool,
        state: &mut RunState,
    ) -> Option<Tip> {
        let cfg = &self.config;
        let g = parent.generation;

        // The first child of a trunk tip stays on the trunk.
        let trunk = parent.trunk && child == 0;
        let base_angle = if parent.in_stem || (cfg.trunk_lineage && trunk) {
            cfg.stem_angle_or_branch()
        } else {
            cfg.branch_angle
        };
        // A cone wider than a half-turn covers the whole sphere anyway.
        let spread = (base_angle * cfg.angle_scale).min(MAX_DEVIATION_DEG);
        let max_angle =
            (spread * self.rng.jitter(cfg.angle_jitter)).min(MAX_DEVIATION_DEG).to_radians();

        let length = (cfg.branch_length
            * (1.0 - cfg.length_decay).powi(g as i32)
            * self.rng.jitter(cfg.length_jitter))
        .max(MIN_SEGMENT_LENGTH);

        let upward = cfg.enforce_upward.then_some(state.axis);
        // The first generation grows from the untwisted frame.
        let twist = if g == 0 { 0.0 } else { cfg.twist_rate.to_radians() };
        let origin = state.skeleton.nodes[parent.node].pos;

        let mut retries = 0;
        let (dir, end) = loop {
            let deviated = direction::perturb(parent.dir, max_angle, upward, &mut self.rng);
            let dir = direction::twist(deviated, state.axis, twist);
            let end = origin + dir * length;

            match state.grid.as_mut() {
                Some(grid) if grid.crowds(end) => {
                    if retries == MAX_AVOID_RETRIES {
                        state.stats.crowded_out += 1;
                        return None;
                    }
                    retries += 1;
                    state.stats.avoid_retries += 1;
                }
                Some(grid) => {
                    grid.insert(end);
                    break (dir, end);
                }
                None => break (dir, end),
            }
        };

        let generation = g + 1;
        let node = state.skeleton.add_child(parent.node, end, generation);

        // Stem tips and fresh split children restart their age.
        let born = if parent.in_stem || split {
            generation
        } else {
            parent.born
        };

        Some(Tip {
            node,
            dir,
            generation,
            in_stem: generation < cfg.stem_generations,
            trunk,
            born,
        })
    }
}

/// Validates `config` and grows one structure from `start`.
pub fn grow(start: DVec3, config: &GrowthConfig) -> Result<Vec<Segment>, ConfigError> {
    Ok(GrowthEngine::new(config.clone())?.grow(start))
}

/// Plain-triple entry point: `(x, y, z)` in, `(start, end)` triples out.
pub fn grow_triples(
    start: Triple,
    config: &GrowthConfig,
) -> Result<Vec<(Triple, Triple)>, ConfigError> {
    let segments = grow(DVec3::from_array(start), config)?;
    Ok(segments.iter().map(Segment::to_triples).collect())
}
