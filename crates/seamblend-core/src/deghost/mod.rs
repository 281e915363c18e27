//! Ghost-suppressing per-pixel weights from a stack of aligned exposures.
//!
//! Pixels that agree with the rest of the stack get high weights; pixels
//! belonging to moving objects, which few other images share, get low ones.

pub mod kernel;
pub mod khan;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_DEGHOST_ITERATIONS, DEFAULT_DEGHOST_SIGMA, NEIGHB_DIST};
use crate::error::{BlendError, Result};
use crate::storage::StorageMode;

pub use kernel::Kernel;
pub use khan::{hat, KhanEstimator};

/// Density kernel over Lab differences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelShape {
    #[default]
    Gaussian,
    /// Heavy-tailed; distant colors keep a small share of the density.
    Arctangent,
}

impl std::fmt::Display for KernelShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gaussian => write!(f, "Gaussian"),
            Self::Arctangent => write!(f, "Arctangent"),
        }
    }
}

/// Parameters of the deghosting pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeghostConfig {
    /// Number of reweighting passes (default: 4).
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Kernel bandwidth in Lab units (default: 30).
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    #[serde(default)]
    pub kernel: KernelShape,
    /// Log-compress the input before Lab conversion.
    #[serde(default)]
    pub hdr: bool,
    /// Neighborhood radius in pixels (default: 1).
    #[serde(default = "default_neighborhood")]
    pub neighborhood: usize,
    /// Where the Lab stack is kept while iterating.
    #[serde(default)]
    pub storage: StorageMode,
}

fn default_iterations() -> usize {
    DEFAULT_DEGHOST_ITERATIONS
}

fn default_sigma() -> f64 {
    DEFAULT_DEGHOST_SIGMA
}

fn default_neighborhood() -> usize {
    NEIGHB_DIST
}

impl Default for DeghostConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_DEGHOST_ITERATIONS,
            sigma: DEFAULT_DEGHOST_SIGMA,
            kernel: KernelShape::default(),
            hdr: false,
            neighborhood: NEIGHB_DIST,
            storage: StorageMode::Memory,
        }
    }
}

impl DeghostConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(BlendError::InvalidParameter(
                "deghosting needs at least one iteration".into(),
            ));
        }
        validate_sigma(self.sigma)
    }
}

/// Kernel bandwidth must be positive and finite.
pub(crate) fn validate_sigma(sigma: f64) -> Result<()> {
    if sigma.is_finite() && sigma > 0.0 {
        Ok(())
    } else {
        Err(BlendError::InvalidParameter(format!(
            "sigma must be positive and finite, got {sigma}"
        )))
    }
}
