use std::f64::consts::PI;

use crate::error::Result;
use crate::pixel::Rgb;

use super::{validate_sigma, KernelShape};

/// Density kernel evaluated on the difference of two Lab colors.
#[derive(Clone, Copy, Debug)]
pub struct Kernel {
    shape: KernelShape,
    sigma_sq: f64,
    /// Normalization of the Gaussian, `(sigma * sqrt(2 pi))^3`.
    gauss_norm: f64,
}

impl Kernel {
    pub fn new(shape: KernelShape, sigma: f64) -> Result<Self> {
        validate_sigma(sigma)?;
        Ok(Self {
            shape,
            sigma_sq: sigma * sigma,
            gauss_norm: (sigma * (2.0 * PI).sqrt()).powi(3),
        })
    }

    pub fn eval(&self, diff: Rgb) -> f64 {
        self.eval_sq(f64::from(diff.norm_sqr()))
    }

    /// Kernel value at squared distance `d2`.
    #[inline]
    pub fn eval_sq(&self, d2: f64) -> f64 {
        match self.shape {
            KernelShape::Gaussian => (-d2 / (2.0 * self.sigma_sq)).exp() / self.gauss_norm,
            KernelShape::Arctangent => 0.5 - ((d2 - self.sigma_sq) / self.sigma_sq).atan() / PI,
        }
    }
}
