//! Error types for configuration validation and preset loading.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single parameter that fell outside its declared domain.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Name of the offending parameter, as it appears in presets.
    pub parameter: &'static str,
    /// Human-readable constraint, e.g. `"must be > 0"`.
    pub constraint: &'static str,
    /// The rejected value, formatted.
    pub value: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (got {})", self.parameter, self.constraint, self.value)
    }
}

/// Raised before any growth starts when a configuration is malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration: {}", join_violations(.0))]
    InvalidConfiguration(Vec<Violation>),
}

impl ConfigError {
    /// Every violation found, in parameter declaration order.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ConfigError::InvalidConfiguration(v) => v,
        }
    }

    /// Returns `true` if `parameter` is among the violations.
    pub fn mentions(&self, parameter: &str) -> bool {
        self.violations().iter().any(|v| v.parameter == parameter)
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while resolving a parameter preset.
#[derive(Error, Debug)]
pub enum PresetError {
    #[error("failed to read preset '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed preset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

/// Accumulates domain checks so that every violation is reported at once.
#[derive(Debug, Default)]
pub(crate) struct Checks {
    violations: Vec<Violation>,
}

impl Checks {
    /// Records a violation unless `ok` holds.
    ///
    /// Conditions are written positively (`x > 0.0`), so NaN always fails.
    pub(crate) fn require(
        &mut self,
        ok: bool,
        parameter: &'static str,
        constraint: &'static str,
        value: impl fmt::Debug,
    ) {
        if !ok {
            self.violations.push(Violation {
                parameter,
                constraint,
                value: format!("{value:?}"),
            });
        }
    }

    /// Shorthand for a closed `[0, 1]` probability-like range.
    pub(crate) fn unit(&mut self, value: f64, parameter: &'static str) {
        self.require(
            (0.0..=1.0).contains(&value),
            parameter,
            "must be in [0, 1]",
            value,
        );
    }

    /// Shorthand for a finite, non-negative value.
    pub(crate) fn non_negative(&mut self, value: f64, parameter: &'static str) {
        self.require(
            value.is_finite() && value >= 0.0,
            parameter,
            "must be finite and >= 0",
            value,
        );
    }

    pub(crate) fn finish(self) -> Result<(), ConfigError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::InvalidConfiguration(self.violations))
        }
    }
}
