use ndarray::{Array2, Zip};

use crate::error::{BlendError, Result};
use crate::pixel::Pixel;
use crate::pyramid::{expand, Pyramid};

/// Combine two Laplacian pyramids level by level under a Gaussian mask
/// pyramid: `black + m * (white - black)`, i.e. `m*white + (1-m)*black`.
///
/// Written in difference form so that identical inputs pass through unchanged.
pub fn blend_pyramids<P: Pixel>(
    mask: &Pyramid<f32>,
    white: &Pyramid<P>,
    black: &Pyramid<P>,
) -> Result<Pyramid<P>> {
    if white.len() != black.len() {
        return Err(BlendError::LevelMismatch {
            expected: white.len(),
            got: black.len(),
        });
    }
    if mask.len() != white.len() {
        return Err(BlendError::LevelMismatch {
            expected: white.len(),
            got: mask.len(),
        });
    }

    let mut levels = Vec::with_capacity(white.len());
    for (i, ((m, w), b)) in mask
        .levels
        .iter()
        .zip(&white.levels)
        .zip(&black.levels)
        .enumerate()
    {
        if w.dim() != b.dim() {
            return Err(BlendError::shape("blend", i, w.dim(), b.dim()));
        }
        if m.dim() != w.dim() {
            return Err(BlendError::shape("blend", i, w.dim(), m.dim()));
        }
        let combined = Zip::from(m)
            .and(w)
            .and(b)
            .par_map_collect(|&m, &w, &b| b + (w - b) * m);
        levels.push(combined);
    }

    Ok(Pyramid { levels })
}

/// Reconstruct an image from a Laplacian pyramid, coarsest level first.
pub fn collapse<P: Pixel>(pyramid: Pyramid<P>, wrap: bool) -> Array2<P> {
    let mut levels = pyramid.levels;
    let Some(mut current) = levels.pop() else {
        return Array2::from_elem((0, 0), P::zero());
    };

    while let Some(residual) = levels.pop() {
        let expanded = expand(&current, residual.dim(), wrap);
        current = Zip::from(&residual)
            .and(&expanded)
            .par_map_collect(|&l, &e| l + e);
    }

    current
}
