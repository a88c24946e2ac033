use thiserror::Error;

/// Failures reported by operator kernels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperatorError {
    #[error(
        "operator is not diagonally dominant at cell {cell:?} (component {component}): |offdiag| = {offdiag:e} > |diag| = {diag:e}"
    )]
    NotDiagonallyDominant {
        cell: Vec<isize>,
        component: usize,
        diag: f64,
        offdiag: f64,
    },
}

/// Failures while loading or validating a `SolverConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid parameter `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}
