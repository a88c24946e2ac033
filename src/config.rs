//! Serializable solver parameters, loaded from and written to TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diagonal::DominancePolicy;
use crate::error::ConfigError;
use crate::operator::Scalars;
use crate::overset::overset_face_factor;
use crate::relax::Relaxation;

/// Parameters of the operator, its smoother and level construction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// What to do when the operator is found not to be diagonally dominant.
    #[serde(default)]
    pub dominance: DominancePolicy,
    /// Operator scalars.
    #[serde(default)]
    pub operator: Scalars,
    /// Smoother parameters.
    #[serde(default)]
    pub relax: Relaxation,
    /// Overset level construction.
    #[serde(default)]
    pub overset: Overset,
    /// Verbosity of logging.
    #[serde(default)]
    pub logging: Logging,
}

impl SolverConfig {
    /// Parses and validates a config from a TOML string.
    pub fn from_toml_str(string: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(string)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a config from a toml file given a path.
    pub fn import_from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let string = std::fs::read_to_string(path)?;
        Self::from_toml_str(&string)
    }

    /// Exports this config to a toml file.
    pub fn export_to_toml(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let string = toml::to_string_pretty(self)?;
        std::fs::write(path, string)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let omega = self.relax.omega;
        if !(omega > 0.0 && omega < 2.0) {
            return Err(ConfigError::Invalid {
                name: "relax.omega",
                reason: format!("{omega} is outside of (0, 2)"),
            });
        }

        if self.overset.ratio == 0 {
            return Err(ConfigError::Invalid {
                name: "overset.ratio",
                reason: "coarsening ratio must be positive".to_string(),
            });
        }

        if let Some(factor) = self.overset.factor {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(ConfigError::Invalid {
                    name: "overset.factor",
                    reason: format!("{factor} is not a positive number"),
                });
            }
        }

        Ok(())
    }
}

/// Options for coarsening overset levels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overset {
    /// Refinement ratio between a level and the one it was coarsened from.
    pub ratio: usize,
    /// Explicit interface face factor. Derived from `ratio` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor: Option<f64>,
}

impl Overset {
    /// Factor applied to face coefficients on active/covered interfaces.
    pub fn face_factor(&self) -> f64 {
        self.factor
            .unwrap_or_else(|| overset_face_factor(self.ratio))
    }
}

impl Default for Overset {
    fn default() -> Self {
        Self {
            ratio: 2,
            factor: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    /// Verbosity of logging
    pub level: usize,
}

impl Logging {
    pub const OFF: usize = 0;
    pub const ERROR: usize = 1;
    pub const WARN: usize = 2;
    pub const INFO: usize = 3;
    pub const DEBUG: usize = 4;
    pub const TRACE: usize = 5;

    /// Converts a logging level to a `log::LevelFilter`.
    pub fn filter(&self) -> log::LevelFilter {
        match self.level {
            0 => log::LevelFilter::Off,
            1 => log::LevelFilter::Error,
            2 => log::LevelFilter::Warn,
            3 => log::LevelFilter::Info,
            4 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

impl Default for Logging {
    fn default() -> Logging {
        Logging { level: Self::WARN }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() -> Result<(), ConfigError> {
        let config = SolverConfig::from_toml_str(
            r#"
            dominance = "abort"

            [operator]
            alpha = 1.0
            beta = 0.5
            eta = 2.0

            [relax]
            omega = 1.2
            sweeps = 8

            [overset]
            ratio = 4

            [logging]
            level = 4
            "#,
        )?;

        assert_eq!(config.dominance, DominancePolicy::Abort);
        assert_eq!(
            config.operator,
            Scalars {
                alpha: 1.0,
                beta: 0.5,
                eta: 2.0
            }
        );
        assert_eq!(config.relax.sweeps, 8);
        assert_eq!(config.overset.face_factor(), 8.0 / 5.0);
        assert_eq!(config.logging.filter(), log::LevelFilter::Debug);
        Ok(())
    }

    #[test]
    fn defaults() -> Result<(), ConfigError> {
        let config = SolverConfig::from_toml_str("")?;
        assert_eq!(config, SolverConfig::default());
        assert_eq!(config.dominance, DominancePolicy::Warn);
        assert_eq!(config.logging.filter(), log::LevelFilter::Warn);
        assert_eq!(config.overset.face_factor(), 4.0 / 3.0);
        Ok(())
    }

    #[test]
    fn explicit_face_factor() -> Result<(), ConfigError> {
        let config = SolverConfig::from_toml_str("[overset]\nratio = 2\nfactor = 1.0\n")?;
        assert_eq!(config.overset.face_factor(), 1.0);
        Ok(())
    }

    #[test]
    fn rejects_invalid_parameters() {
        let err = SolverConfig::from_toml_str("[relax]\nomega = 2.0\nsweeps = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "relax.omega", .. }));

        let err = SolverConfig::from_toml_str("[overset]\nratio = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "overset.ratio", .. }));

        let err = SolverConfig::from_toml_str("[relax]\nomega = \"fast\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_round_trip() -> Result<(), ConfigError> {
        let mut config = SolverConfig::default();
        config.operator.eta = 0.25;
        config.relax.omega = 1.5;
        config.dominance = DominancePolicy::Abort;

        let string = toml::to_string_pretty(&config)?;
        assert_eq!(SolverConfig::from_toml_str(&string)?, config);
        Ok(())
    }

    #[test]
    fn file_round_trip() -> Result<(), ConfigError> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("solver.toml");

        let mut config = SolverConfig::default();
        config.overset.factor = Some(1.25);
        config.relax.sweeps = 12;
        config.logging.level = Logging::DEBUG;

        config.export_to_toml(&path)?;
        assert_eq!(SolverConfig::import_from_toml(&path)?, config);

        let missing = SolverConfig::import_from_toml(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
        Ok(())
    }
}
