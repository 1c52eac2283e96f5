//! Command-line driver for the coral growth library.
//!
//! This binary builds a configuration from a preset and flags, runs the
//! core, and delegates all output formatting to the [`report`] module.
//! Logs go to stderr so stdout carries only the segment data.

mod report;

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use coral_core::{FungalConfig, FungalEngine, GrowthConfig, GrowthEngine, XyPlane};
use glam::DVec3;
use tracing::Level;

use report::Format;

/// Grow branching coral skeletons as 3-D line segments.
#[derive(Parser)]
#[command(name = "coral")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grow a branching coral from a single root point.
    Grow(GrowArgs),
    /// Grow a hyphal network over the XY plane.
    Fungal(FungalArgs),
    /// List the built-in presets.
    Presets,
}

#[derive(Args)]
struct GrowArgs {
    /// Built-in preset to start from (see `coral presets`).
    #[arg(short, long, conflicts_with = "config")]
    preset: Option<String>,

    /// JSON preset file to start from.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed for reproducible growth.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of growth generations.
    #[arg(short, long)]
    iterations: Option<u32>,

    /// Root point as `x,y,z`.
    #[arg(long, value_parser = parse_point, default_value = "0,0,0", allow_hyphen_values = true)]
    start: DVec3,

    /// Base segment length.
    #[arg(long)]
    branch_length: Option<f64>,

    /// Maximum branch deviation in degrees.
    #[arg(long)]
    branch_angle: Option<f64>,

    /// Probability that a tip splits in two.
    #[arg(long)]
    split_probability: Option<f64>,

    /// Generations forced to grow as a single stem.
    #[arg(long)]
    stem_generations: Option<u32>,

    /// Stem deviation in degrees.
    #[arg(long)]
    stem_angle: Option<f64>,

    /// Rotation about the growth axis per generation, in degrees.
    #[arg(long, allow_hyphen_values = true)]
    twist_rate: Option<f64>,

    /// Minimum distance between endpoints.
    #[arg(long)]
    avoid_radius: Option<f64>,

    /// Probability that a tip dies at each generation.
    #[arg(long)]
    terminate_probability: Option<f64>,

    /// Relative segment length randomization, 0..=1.
    #[arg(long)]
    length_jitter: Option<f64>,

    /// Relative deviation angle randomization, 0..=1.
    #[arg(long)]
    angle_jitter: Option<f64>,

    /// Per-generation length shrink factor, 0..1.
    #[arg(long)]
    length_decay: Option<f64>,

    /// Multiplier applied to every deviation angle.
    #[arg(long)]
    angle_scale: Option<f64>,

    /// Per-generation prune chance of a branch that has not split.
    #[arg(long)]
    age_based_prune: Option<f64>,

    /// Keep the stem angle along the first-child chain after the stem phase.
    #[arg(long)]
    trunk_lineage: Option<bool>,

    /// Keep every direction on the upper side of the growth axis.
    #[arg(long)]
    enforce_upward: Option<bool>,

    /// Print the resolved configuration as JSON instead of growing.
    #[arg(long)]
    dump_config: bool,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Args)]
struct FungalArgs {
    #[arg(short, long)]
    iterations: Option<u32>,

    #[arg(long)]
    step_length: Option<f64>,

    #[arg(long)]
    branch_probability: Option<f64>,

    /// Maximum in-plane turn in degrees.
    #[arg(long)]
    angle_spread: Option<f64>,

    #[arg(long)]
    terminate_probability: Option<f64>,

    #[arg(long)]
    min_spacing: Option<f64>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Spore position as `x,y,z`; repeat for several spores.
    #[arg(long = "spore", value_parser = parse_point, allow_hyphen_values = true)]
    spores: Vec<DVec3>,

    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

/// Parses `x,y,z` into a point.
fn parse_point(s: &str) -> Result<DVec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{s}'"));
    }
    let mut xyz = [0.0; 3];
    for (slot, part) in xyz.iter_mut().zip(&parts) {
        *slot = part
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate '{part}': {e}"))?;
    }
    Ok(DVec3::from_array(xyz))
}

impl GrowArgs {
    /// Resolves the base configuration and applies flag overrides.
    fn resolve(&self) -> Result<GrowthConfig, Box<dyn Error>> {
        let mut cfg = match (&self.preset, &self.config) {
            (Some(name), _) => GrowthConfig::preset(name)?,
            (None, Some(path)) => GrowthConfig::load(path)?,
            (None, None) => GrowthConfig::default(),
        };

        if let Some(v) = self.seed {
            cfg.seed = Some(v);
        }
        if let Some(v) = self.iterations {
            cfg.iterations = v;
        }
        if let Some(v) = self.branch_length {
            cfg.branch_length = v;
        }
        if let Some(v) = self.branch_angle {
            cfg.branch_angle = v;
        }
        if let Some(v) = self.split_probability {
            cfg.split_probability = v;
        }
        if let Some(v) = self.stem_generations {
            cfg.stem_generations = v;
        }
        if let Some(v) = self.stem_angle {
            cfg.stem_angle = Some(v);
        }
        if let Some(v) = self.twist_rate {
            cfg.twist_rate = v;
        }
        if let Some(v) = self.avoid_radius {
            cfg.avoid_radius = v;
        }
        if let Some(v) = self.terminate_probability {
            cfg.terminate_probability = v;
        }
        if let Some(v) = self.length_jitter {
            cfg.length_jitter = v;
        }
        if let Some(v) = self.angle_jitter {
            cfg.angle_jitter = v;
        }
        if let Some(v) = self.length_decay {
            cfg.length_decay = v;
        }
        if let Some(v) = self.angle_scale {
            cfg.angle_scale = v;
        }
        if let Some(v) = self.age_based_prune {
            cfg.age_based_prune = v;
        }
        if let Some(v) = self.trunk_lineage {
            cfg.trunk_lineage = v;
        }
        if let Some(v) = self.enforce_upward {
            cfg.enforce_upward = v;
        }
        Ok(cfg)
    }
}

impl FungalArgs {
    fn resolve(&self) -> FungalConfig {
        let mut cfg = FungalConfig::default();
        if let Some(v) = self.iterations {
            cfg.iterations = v;
        }
        if let Some(v) = self.step_length {
            cfg.step_length = v;
        }
        if let Some(v) = self.branch_probability {
            cfg.branch_probability = v;
        }
        if let Some(v) = self.angle_spread {
            cfg.angle_spread = v;
        }
        if let Some(v) = self.terminate_probability {
            cfg.terminate_probability = v;
        }
        if let Some(v) = self.min_spacing {
            cfg.min_spacing = v;
        }
        cfg.seed = self.seed;
        cfg
    }
}

fn run_grow(args: &GrowArgs) -> Result<(), Box<dyn Error>> {
    let cfg = args.resolve()?;
    if args.dump_config {
        // Validate first so a dumped preset is always loadable.
        cfg.validate()?;
        println!("{}", cfg.to_json()?);
        return Ok(());
    }

    let mut engine = GrowthEngine::new(cfg)?;
    let segments = engine.grow(args.start);
    print!("{}", report::render(&segments, args.format)?);
    Ok(())
}

fn run_fungal(args: &FungalArgs) -> Result<(), Box<dyn Error>> {
    let mut engine = FungalEngine::new(args.resolve())?;
    let spores = if args.spores.is_empty() {
        vec![DVec3::ZERO]
    } else {
        args.spores.clone()
    };
    let segments = engine.grow(&XyPlane, &spores, None);
    print!("{}", report::render(&segments, args.format)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Grow(args) => run_grow(args),
        Commands::Fungal(args) => run_fungal(args),
        Commands::Presets => {
            for name in GrowthConfig::PRESETS {
                println!("{name}");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_point_accepts_signed_coordinates() {
        assert_eq!(
            parse_point("1, -2.5,3e1").unwrap(),
            DVec3::new(1.0, -2.5, 30.0)
        );
    }

    #[test]
    fn parse_point_rejects_wrong_arity_and_garbage() {
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,2,3,4").is_err());
        assert!(parse_point("1,y,3").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn grow_flags_override_the_preset() {
        let cli = Cli::try_parse_from([
            "coral",
            "grow",
            "--preset",
            "stemmed",
            "--seed",
            "7",
            "--stem-generations",
            "4",
            "--twist-rate",
            "-15",
            "--start",
            "1,-1,0",
        ])
        .unwrap();

        let Commands::Grow(args) = cli.command else {
            panic!("expected grow subcommand");
        };
        let cfg = args.resolve().unwrap();
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.stem_generations, 4);
        assert_eq!(cfg.stem_angle, Some(5.0));
        assert_eq!(cfg.twist_rate, -15.0);
        assert_eq!(args.start, DVec3::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn shape_flags_reach_the_config() {
        let cli = Cli::try_parse_from([
            "coral",
            "grow",
            "--length-jitter",
            "0.2",
            "--angle-jitter",
            "0.3",
            "--length-decay",
            "0.1",
            "--angle-scale",
            "1.5",
            "--age-based-prune",
            "0.05",
            "--trunk-lineage",
            "true",
            "--enforce-upward",
            "false",
        ])
        .unwrap();

        let Commands::Grow(args) = cli.command else {
            panic!("expected grow subcommand");
        };
        let cfg = args.resolve().unwrap();
        assert_eq!(cfg.length_jitter, 0.2);
        assert_eq!(cfg.angle_jitter, 0.3);
        assert_eq!(cfg.length_decay, 0.1);
        assert_eq!(cfg.angle_scale, 1.5);
        assert_eq!(cfg.age_based_prune, 0.05);
        assert!(cfg.trunk_lineage);
        assert!(!cfg.enforce_upward);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unset_shape_flags_keep_the_preset_values() {
        let cli = Cli::try_parse_from(["coral", "grow", "--preset", "jittered"]).unwrap();
        let Commands::Grow(args) = cli.command else {
            panic!("expected grow subcommand");
        };
        assert_eq!(args.resolve().unwrap(), GrowthConfig::named("jittered").unwrap());
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let cli = Cli::try_parse_from(["coral", "grow", "--preset", "kelp"]).unwrap();
        let Commands::Grow(args) = cli.command else {
            panic!("expected grow subcommand");
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn fungal_flags_build_a_config() {
        let cli = Cli::try_parse_from([
            "coral",
            "fungal",
            "--iterations",
            "12",
            "--min-spacing",
            "0.5",
            "--spore",
            "0,0,0",
            "--spore",
            "-3,4,0",
        ])
        .unwrap();

        let Commands::Fungal(args) = cli.command else {
            panic!("expected fungal subcommand");
        };
        let cfg = args.resolve();
        assert_eq!(cfg.iterations, 12);
        assert_eq!(cfg.min_spacing, 0.5);
        assert_eq!(args.spores.len(), 2);
        assert_eq!(args.spores[1], DVec3::new(-3.0, 4.0, 0.0));
    }
}
