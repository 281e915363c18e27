//! Iterative kernel-density weighting (Khan, Akyüz and Reinhard).
//!
//! Each pixel's weight is its exposure quality ([`hat`]) times the weighted
//! density of similar colors around it, across the whole stack. Repeating
//! the estimate with the previous weights drives ghost pixels towards zero.

use ndarray::Array2;
use tracing::{debug, info};

use crate::color::srgb_to_lab;
use crate::consts::{EPSILON, HAT_EXPONENT};
use crate::error::{BlendError, Result};
use crate::pixel::{Pixel, Rgb};
use crate::pyramid::generate;
use crate::storage::{store_from_array, PixelStore};

use super::kernel::Kernel;
use super::DeghostConfig;

/// Exposure quality: 1 for mid-tones, falling to 0 at black and white.
pub fn hat(rgb: [f32; 3]) -> f32 {
    let v = ((rgb[0] + rgb[1] + rgb[2]) / 3.0).clamp(0.0, 1.0);
    1.0 - (2.0 * v - 1.0).powi(HAT_EXPONENT)
}

pub struct KhanEstimator {
    config: DeghostConfig,
    kernel: Kernel,
}

impl KhanEstimator {
    pub fn new(config: DeghostConfig) -> Result<Self> {
        config.validate()?;
        let kernel = Kernel::new(config.kernel, config.sigma)?;
        Ok(Self { config, kernel })
    }

    /// One weight map per input, each in `[0, 1]` after normalizing by the
    /// stack-wide maximum.
    pub fn weight_masks<P: Pixel>(&self, images: &[Array2<P>]) -> Result<Vec<Array2<f32>>> {
        let Some(first) = images.first() else {
            return Err(BlendError::InvalidParameter(
                "deghosting needs at least one image".into(),
            ));
        };
        let dim = first.dim();
        for (i, img) in images.iter().enumerate() {
            if img.dim() != dim {
                return Err(BlendError::shape("deghost", i, dim, img.dim()));
            }
        }

        let quality: Vec<Array2<f32>> = images
            .iter()
            .map(|img| img.mapv(|p| hat(p.to_rgb())))
            .collect();
        let lab = self.preprocess(images)?;

        let mut weights = quality.clone();
        for pass in 0..self.config.iterations {
            let next: Vec<Array2<f32>> = (0..images.len())
                .map(|i| {
                    generate(dim, |row, col| {
                        let density = self.density(&lab, &weights, i, row, col);
                        (f64::from(quality[i][[row, col]]) * density) as f32
                    })
                })
                .collect();
            // Rescaling keeps the next pass's sums away from underflow.
            weights = normalize(next);
            info!(pass = pass + 1, iterations = self.config.iterations, "Deghosting pass done");
        }

        Ok(weights)
    }

    /// Optional log compression, then Lab, into the configured storage.
    fn preprocess<P: Pixel>(&self, images: &[Array2<P>]) -> Result<Vec<Box<dyn PixelStore<Rgb>>>> {
        let max = if self.config.hdr {
            images
                .iter()
                .flat_map(|img| img.iter())
                .flat_map(|p| p.to_rgb())
                .fold(0.0f32, f32::max)
        } else {
            0.0
        };
        let log_scale = if max > 0.0 { Some((1.0 + max).ln()) } else { None };
        debug!(
            hdr = self.config.hdr,
            max,
            storage = %self.config.storage,
            "Converting stack to Lab"
        );

        images
            .iter()
            .map(|img| {
                let lab = img.mapv(|p| {
                    let mut rgb = p.to_rgb();
                    if let Some(scale) = log_scale {
                        rgb = rgb.map(|v| (1.0 + v.max(0.0)).ln() / scale);
                    }
                    Rgb(srgb_to_lab(rgb))
                });
                store_from_array(&self.config.storage, lab)
            })
            .collect()
    }

    /// Weighted kernel density of image `i`'s color at `(row, col)` over the
    /// neighborhood in every image, leaving out the sample itself.
    fn density(
        &self,
        lab: &[Box<dyn PixelStore<Rgb>>],
        weights: &[Array2<f32>],
        i: usize,
        row: usize,
        col: usize,
    ) -> f64 {
        let (h, w) = weights[i].dim();
        let radius = self.config.neighborhood;
        let rows = row.saturating_sub(radius)..(row + radius + 1).min(h);
        let cols = col.saturating_sub(radius)..(col + radius + 1).min(w);
        let center = lab[i].get(row, col);

        let mut num = 0.0f64;
        let mut den = 0.0f64;
        for (j, (store, weight)) in lab.iter().zip(weights).enumerate() {
            for r in rows.clone() {
                for c in cols.clone() {
                    if j == i && r == row && c == col {
                        continue;
                    }
                    let wq = f64::from(weight[[r, c]]);
                    if wq <= 0.0 {
                        continue;
                    }
                    num += wq * self.kernel.eval(center - store.get(r, c));
                    den += wq;
                }
            }
        }

        if den > f64::from(EPSILON) {
            num / den
        } else {
            0.0
        }
    }
}

/// Divide every map by the largest weight in the stack.
fn normalize(mut weights: Vec<Array2<f32>>) -> Vec<Array2<f32>> {
    let max = weights
        .iter()
        .flat_map(|w| w.iter())
        .copied()
        .fold(0.0f32, f32::max);
    if max > 0.0 {
        for w in &mut weights {
            w.mapv_inplace(|v| v / max);
        }
    }
    weights
}
