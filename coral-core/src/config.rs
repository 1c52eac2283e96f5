//! Growth parameters, their validation and the preset layer.

use std::fs;
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{Checks, ConfigError, PresetError};

/// Full parameter set for one run of [`crate::engine::GrowthEngine`].
///
/// Angles are in degrees. Every field has a default, so presets only need
/// to name the keys they change. Call [`GrowthConfig::validate`] (or let
/// the engine do it) before growing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrowthConfig {
    /// Number of generations to run. `0` yields no segments.
    pub iterations: u32,
    /// Base length of a segment at generation 0.
    pub branch_length: f64,
    /// Maximum deviation of a child direction from its parent.
    pub branch_angle: f64,
    /// Chance that a tip splits into two children.
    pub split_probability: f64,
    /// Seed for the RNG stream. `None` makes the run non-deterministic.
    pub seed: Option<u64>,

    /// Number of initial generations forced to grow as a single stem.
    pub stem_generations: u32,
    /// Deviation used during the stem phase; falls back to `branch_angle`.
    pub stem_angle: Option<f64>,

    /// Relative random spread of segment lengths, in `[0, 1]`.
    pub length_jitter: f64,
    /// Relative random spread of the maximum deviation, in `[0, 1]`.
    pub angle_jitter: f64,
    /// Fractional length reduction per generation, in `[0, 1)`.
    pub length_decay: f64,
    /// Multiplier applied to every deviation angle.
    pub angle_scale: f64,
    /// Rotation about the growth axis per generation.
    pub twist_rate: f64,
    /// Minimum distance between placed endpoints. `0` disables avoidance.
    pub avoid_radius: f64,
    /// Chance that a tip dies at a generation once the stem phase is over.
    pub terminate_probability: f64,
    /// Pruning pressure on branches that have grown long without splitting.
    pub age_based_prune: f64,

    /// Initial direction from the root; also the twist axis.
    pub growth_axis: [f64; 3],
    /// Reject directions that point backwards along the growth axis.
    pub enforce_upward: bool,
    /// Keep the stem angle for the first-child lineage after the stem phase.
    pub trunk_lineage: bool,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            iterations: 5,
            branch_length: 2.0,
            branch_angle: 25.0,
            split_probability: 0.7,
            seed: None,
            stem_generations: 0,
            stem_angle: None,
            length_jitter: 0.0,
            angle_jitter: 0.0,
            length_decay: 0.0,
            angle_scale: 1.0,
            twist_rate: 0.0,
            avoid_radius: 0.0,
            terminate_probability: 0.0,
            age_based_prune: 0.0,
            growth_axis: [0.0, 0.0, 1.0],
            enforce_upward: true,
            trunk_lineage: false,
        }
    }
}

impl GrowthConfig {
    /// Names accepted by [`GrowthConfig::named`].
    pub const PRESETS: [&'static str; 8] = [
        "basic", "stemmed", "jittered", "decaying", "twisted", "sparse", "crowded", "pruned",
    ];

    /// Checks every parameter against its domain.
    ///
    /// All violations are collected, so the error names every offending
    /// parameter rather than only the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut checks = Checks::default();

        checks.require(
            self.branch_length.is_finite() && self.branch_length > 0.0,
            "branch_length",
            "must be finite and > 0",
            self.branch_length,
        );
        checks.non_negative(self.branch_angle, "branch_angle");
        checks.unit(self.split_probability, "split_probability");
        if let Some(angle) = self.stem_angle {
            checks.non_negative(angle, "stem_angle");
        }
        checks.unit(self.length_jitter, "length_jitter");
        checks.unit(self.angle_jitter, "angle_jitter");
        checks.require(
            (0.0..1.0).contains(&self.length_decay),
            "length_decay",
            "must be in [0, 1)",
            self.length_decay,
        );
        checks.non_negative(self.angle_scale, "angle_scale");
        checks.require(
            self.twist_rate.is_finite(),
            "twist_rate",
            "must be finite",
            self.twist_rate,
        );
        checks.non_negative(self.avoid_radius, "avoid_radius");
        checks.unit(self.terminate_probability, "terminate_probability");
        checks.unit(self.age_based_prune, "age_based_prune");

        let axis = DVec3::from_array(self.growth_axis);
        checks.require(
            axis.is_finite() && axis.length_squared() > 0.0,
            "growth_axis",
            "must be finite and non-zero",
            self.growth_axis,
        );

        checks.finish()
    }

    /// The unit growth axis. Only meaningful on a validated config.
    pub fn axis(&self) -> DVec3 {
        DVec3::from_array(self.growth_axis).normalize_or(DVec3::Z)
    }

    /// Deviation used during the stem phase.
    #[inline]
    pub fn stem_angle_or_branch(&self) -> f64 {
        self.stem_angle.unwrap_or(self.branch_angle)
    }

    /// Worst-case segment count: a full binary split at every generation.
    ///
    /// Equals `2^(iterations + 1) - 2`, saturating at `usize::MAX`.
    pub fn max_segments(&self) -> usize {
        let n = self.iterations.saturating_add(1);
        if n >= usize::BITS {
            usize::MAX
        } else {
            (1usize << n) - 2
        }
    }

    /// Returns a built-in preset by name.
    ///
    /// The presets mirror the parameter studies the model was tuned with:
    /// each one enables a single feature on top of the defaults (except
    /// `basic`, which is the defaults with a fixed seed).
    pub fn named(name: &str) -> Option<Self> {
        let base = Self {
            seed: Some(42),
            ..Self::default()
        };
        let cfg = match name {
            "basic" => base,
            "stemmed" => Self {
                stem_generations: 2,
                stem_angle: Some(5.0),
                ..base
            },
            "jittered" => Self {
                length_jitter: 0.3,
                angle_jitter: 0.4,
                ..base
            },
            "decaying" => Self {
                iterations: 6,
                length_decay: 0.15,
                ..base
            },
            "twisted" => Self {
                iterations: 6,
                twist_rate: 10.0,
                ..base
            },
            "sparse" => Self {
                iterations: 8,
                split_probability: 0.8,
                terminate_probability: 0.2,
                ..base
            },
            "crowded" => Self {
                iterations: 6,
                split_probability: 0.9,
                avoid_radius: 1.0,
                ..base
            },
            "pruned" => Self {
                iterations: 10,
                split_probability: 0.8,
                stem_generations: 3,
                age_based_prune: 0.3,
                ..base
            },
            _ => return None,
        };
        Some(cfg)
    }

    /// Like [`GrowthConfig::named`], but reports unknown names as an error.
    pub fn preset(name: &str) -> Result<Self, PresetError> {
        Self::named(name).ok_or_else(|| PresetError::UnknownPreset(name.to_string()))
    }

    /// Parses and validates a JSON key/value preset.
    pub fn from_json_str(json: &str) -> Result<Self, PresetError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads and validates a JSON preset file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PresetError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PresetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Serializes the configuration as a pretty-printed JSON preset.
    pub fn to_json(&self) -> Result<String, PresetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(GrowthConfig::default().validate().is_ok());
    }

    #[test]
    fn every_named_preset_is_valid() {
        for name in GrowthConfig::PRESETS {
            let cfg = GrowthConfig::named(name).expect("listed preset should exist");
            assert!(cfg.validate().is_ok(), "preset {name} failed validation");
        }
        assert!(GrowthConfig::named("kelp").is_none());
        assert!(matches!(
            GrowthConfig::preset("kelp"),
            Err(PresetError::UnknownPreset(name)) if name == "kelp"
        ));
    }

    #[test]
    fn out_of_domain_values_are_each_reported() {
        let cfg = GrowthConfig {
            branch_length: 0.0,
            branch_angle: -1.0,
            split_probability: 1.5,
            stem_angle: Some(-3.0),
            length_jitter: 2.0,
            angle_jitter: -0.1,
            length_decay: 1.0,
            angle_scale: -1.0,
            twist_rate: f64::INFINITY,
            avoid_radius: -0.5,
            terminate_probability: f64::NAN,
            age_based_prune: 1.1,
            growth_axis: [0.0, 0.0, 0.0],
            ..GrowthConfig::default()
        };

        let err = cfg.validate().unwrap_err();
        let names: Vec<_> = err.violations().iter().map(|v| v.parameter).collect();
        assert_eq!(
            names,
            vec![
                "branch_length",
                "branch_angle",
                "split_probability",
                "stem_angle",
                "length_jitter",
                "angle_jitter",
                "length_decay",
                "angle_scale",
                "twist_rate",
                "avoid_radius",
                "terminate_probability",
                "age_based_prune",
                "growth_axis",
            ]
        );
    }

    #[test]
    fn boundary_values_are_accepted() {
        let cfg = GrowthConfig {
            iterations: 0,
            branch_angle: 0.0,
            split_probability: 1.0,
            length_jitter: 1.0,
            angle_jitter: 1.0,
            length_decay: 0.0,
            angle_scale: 0.0,
            twist_rate: -720.0,
            terminate_probability: 1.0,
            age_based_prune: 1.0,
            ..GrowthConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn stem_angle_falls_back_to_branch_angle() {
        let mut cfg = GrowthConfig::default();
        cfg.branch_angle = 30.0;
        assert_eq!(cfg.stem_angle_or_branch(), 30.0);

        cfg.stem_angle = Some(4.0);
        assert_eq!(cfg.stem_angle_or_branch(), 4.0);
    }

    #[test]
    fn max_segments_matches_full_binary_tree() {
        let mut cfg = GrowthConfig::default();

        cfg.iterations = 0;
        assert_eq!(cfg.max_segments(), 0);

        cfg.iterations = 1;
        assert_eq!(cfg.max_segments(), 2);

        cfg.iterations = 5;
        assert_eq!(cfg.max_segments(), 62);

        cfg.iterations = 200;
        assert_eq!(cfg.max_segments(), usize::MAX);
    }

    #[test]
    fn axis_is_normalized() {
        let mut cfg = GrowthConfig::default();
        cfg.growth_axis = [0.0, 3.0, 0.0];
        assert_eq!(cfg.axis(), DVec3::Y);
    }

    #[test]
    fn partial_json_preset_takes_defaults_for_missing_keys() {
        let cfg = GrowthConfig::from_json_str(
            r#"{ "iterations": 7, "twist_rate": 12.5, "seed": 9, "stem_angle": 3.0 }"#,
        )
        .unwrap();

        assert_eq!(cfg.iterations, 7);
        assert_eq!(cfg.twist_rate, 12.5);
        assert_eq!(cfg.seed, Some(9));
        assert_eq!(cfg.stem_angle, Some(3.0));
        assert_eq!(cfg.branch_length, GrowthConfig::default().branch_length);
    }

    #[test]
    fn json_preset_rejects_unknown_keys_and_bad_values() {
        let unknown = GrowthConfig::from_json_str(r#"{ "branch_lenght": 2.0 }"#);
        assert!(matches!(unknown, Err(PresetError::Parse(_))));

        let negative_iterations = GrowthConfig::from_json_str(r#"{ "iterations": -1 }"#);
        assert!(matches!(negative_iterations, Err(PresetError::Parse(_))));

        let invalid = GrowthConfig::from_json_str(r#"{ "split_probability": 3.0 }"#);
        match invalid {
            Err(PresetError::Invalid(err)) => assert!(err.mentions("split_probability")),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn json_round_trip_preserves_preset() {
        let cfg = GrowthConfig::named("pruned").unwrap();
        let json = cfg.to_json().unwrap();
        assert_eq!(GrowthConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn load_reports_missing_file_path() {
        let err = GrowthConfig::load("/nonexistent/coral-preset.json").unwrap_err();
        match err {
            PresetError::Io { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/coral-preset.json"))
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
