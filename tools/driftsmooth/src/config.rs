use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Arg, Command, value_parser};
use driftlap::prelude::SolverConfig;
use serde::{Deserialize, Serialize};

/// Configuration format for driftsmooth.
#[derive(Serialize, Deserialize)]
pub struct Config {
    /// Name of the run, used in log output.
    pub name: String,
    /// Model problem to smooth.
    #[serde(default)]
    pub problem: Problem,
    /// Operator, smoother and logging parameters.
    #[serde(flatten)]
    pub solver: SolverConfig,
}

/// A single square or cubic patch with constant coefficients.
#[derive(Serialize, Deserialize, Clone)]
pub struct Problem {
    /// Number of spatial dimensions (2 or 3).
    pub dimension: usize,
    /// Cells along each axis.
    pub cells: usize,
    /// Side length of the domain.
    pub length: f64,
    /// Reaction coefficient `a`.
    #[serde(default = "default_one")]
    pub reaction: f64,
    /// Diffusion coefficient `b` on every face.
    #[serde(default = "default_one")]
    pub diffusion: f64,
    /// Constant drift velocity `c`, one entry per axis.
    #[serde(default)]
    pub drift: Vec<f64>,
    /// Block of covered cells, if any.
    #[serde(default)]
    pub overset: Option<Block>,
}

fn default_one() -> f64 {
    1.0
}

impl Default for Problem {
    fn default() -> Self {
        Self {
            dimension: 2,
            cells: 32,
            length: 1.0,
            reaction: 1.0,
            diffusion: 1.0,
            drift: Vec::new(),
            overset: None,
        }
    }
}

/// Inclusive cell bounds of a covered block.
#[derive(Serialize, Deserialize, Clone)]
pub struct Block {
    pub lo: Vec<isize>,
    pub hi: Vec<isize>,
}

/// Parsed command line.
pub struct Invocation {
    pub config: Config,
    /// Where to write the resolved solver parameters, if requested.
    pub export: Option<PathBuf>,
}

pub fn configure() -> Result<Invocation> {
    let matches = Command::new("driftsmooth")
        .about("Runs the red-black smoother of a drift-diffusion-reaction operator on a model problem.")
        .version("v0.1.0")
        .arg(
            Arg::new("path")
                .help("Path of config file describing the problem and smoother")
                .value_name("PATH")
                .required(true),
        )
        .arg(
            Arg::new("solver")
                .long("solver")
                .help("Solver parameters to use in place of those in the config file")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("export")
                .long("export")
                .help("Writes the resolved solver parameters to FILE")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches();

    // Get path argument
    let path = matches
        .get_one::<String>("path")
        .ok_or(anyhow!("Failed to specify path argument"))?;

    let config = load(path, matches.get_one::<PathBuf>("solver"))?;

    Ok(Invocation {
        config,
        export: matches.get_one::<PathBuf>("export").cloned(),
    })
}

/// Reads the config at `path`, replacing its solver parameters with the
/// contents of `solver` if given.
pub fn load(path: impl AsRef<Path>, solver: Option<&PathBuf>) -> Result<Config> {
    let path = path.as_ref();

    // Read config file.
    let config_string = std::fs::read_to_string(path)
        .context(format!("Failed to read {} file", path.display()))?;

    // Parse config file into structure.
    let mut config: Config =
        toml::from_str(&config_string).context("Failed to parse config file")?;

    if let Some(solver) = solver {
        config.solver = SolverConfig::import_from_toml(solver)
            .context(format!("Failed to load solver parameters from {}", solver.display()))?;
    }

    config
        .solver
        .validate()
        .context("Invalid solver parameters")?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_problem_and_solver() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            name = "drift"
            dominance = "abort"

            [problem]
            dimension = 3
            cells = 16
            length = 2.0
            drift = [1.0, 0.0, -0.5]

            [problem.overset]
            lo = [4, 4, 4]
            hi = [7, 7, 7]

            [relax]
            omega = 1.1
            sweeps = 10
            "#,
        )?;

        assert_eq!(config.name, "drift");
        assert_eq!(config.problem.dimension, 3);
        assert_eq!(config.problem.reaction, 1.0);
        assert_eq!(config.problem.drift, vec![1.0, 0.0, -0.5]);
        assert!(config.problem.overset.is_some());
        assert_eq!(config.solver.relax.sweeps, 10);
        assert_eq!(config.solver.operator.beta, 1.0);
        Ok(())
    }

    #[test]
    fn solver_file_replaces_inline_parameters() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("run.toml");
        std::fs::write(
            &path,
            "name = \"run\"\n\n[problem]\ndimension = 2\ncells = 8\nlength = 1.0\n\n[relax]\nomega = 1.1\nsweeps = 3\n",
        )?;

        let config = load(&path, None)?;
        assert_eq!(config.solver.relax.sweeps, 3);

        let mut solver = config.solver.clone();
        solver.relax.sweeps = 9;
        solver.operator.eta = 0.5;
        let solver_path = dir.path().join("solver.toml");
        solver.export_to_toml(&solver_path)?;

        let config = load(&path, Some(&solver_path))?;
        assert_eq!(config.name, "run");
        assert_eq!(config.problem.cells, 8);
        assert_eq!(config.solver, solver);

        // Invalid parameters in the solver file are rejected.
        std::fs::write(&solver_path, "[relax]\nomega = 3.0\nsweeps = 1\n")?;
        assert!(load(&path, Some(&solver_path)).is_err());
        Ok(())
    }
}
