//! Core 3-D coral growth library.
//!
//! Main components:
//! - [`engine`]: the branch-growth algorithm ([`GrowthEngine`]).
//! - [`config`]: growth parameters, validation and presets.
//! - [`error`]: configuration and preset errors.
//! - [`rng`]: the per-run random stream.
//! - [`direction`]: cone perturbation, upward enforcement and twist.
//! - [`skeleton`]: arena of placed nodes and the segments between them.
//! - [`spatial`]: endpoint grid for crowding checks.
//! - [`fungal`]: hyphal network growth over a surface.
//! - [`types`]: shared segment and id types.

pub mod config;
pub mod direction;
pub mod engine;
pub mod error;
pub mod fungal;
pub mod rng;
pub mod skeleton;
pub mod spatial;
pub mod types;

pub use config::GrowthConfig;
pub use engine::{GrowthEngine, GrowthOutcome, GrowthStats, grow, grow_triples};
pub use error::{ConfigError, PresetError, Violation};
pub use fungal::{FungalConfig, FungalEngine, Surface, SurfaceFrame, XyPlane};
pub use types::{NodeId, Segment, Triple};
