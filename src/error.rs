//! Error type shared by the sampler, its random sources and the diagnostics.

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GibbsError {
    /// A caller-supplied argument was rejected before any work started.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A variate was requested with a parameter outside its distribution's domain.
    #[error("{distribution} {parameter} = {value} is outside the valid domain")]
    NumericDomain {
        distribution: &'static str,
        parameter: &'static str,
        value: f64,
    },

    /// The random source could not be set up.
    #[error("Random source initialisation failed: {0}")]
    GeneratorInit(String),

    #[cfg(feature = "csv")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, GibbsError>;

impl GibbsError {
    pub(crate) fn domain(distribution: &'static str, parameter: &'static str, value: f64) -> Self {
        GibbsError::NumericDomain {
            distribution,
            parameter,
            value,
        }
    }
}
