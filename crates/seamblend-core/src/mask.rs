//! Blend mask generation over the union of two layers.
//!
//! Outside the overlap the mask follows whichever alpha is set. Inside it,
//! a pixel goes to the layer it lies deeper within: the distance to the
//! nearest pixel of the union box that the white layer does not cover is
//! compared with the same distance for the black layer. The seam falls on
//! the medial line of the overlap.

use ndarray::{s, Array2, ArrayView2, Zip};

use crate::consts::{CHAMFER_DIAGONAL, EPSILON};
use crate::error::{BlendError, Result};
use crate::pyramid::generate;
use crate::roi::BoundingBox;

fn check_alphas(
    white: &Array2<bool>,
    black: &Array2<bool>,
    union: &BoundingBox,
) -> Result<()> {
    if white.dim() != black.dim() {
        return Err(BlendError::shape("mask", 0, black.dim(), white.dim()));
    }
    if !BoundingBox::from_dim(white.dim()).contains(union) {
        return Err(BlendError::shape("mask", 0, white.dim(), union.dim()));
    }
    Ok(())
}

/// Binary mask over `union` (1.0 = white wins), from canvas-sized alphas.
pub fn create_mask(
    white_alpha: &Array2<bool>,
    black_alpha: &Array2<bool>,
    union: &BoundingBox,
    wraparound: bool,
) -> Result<Array2<f32>> {
    check_alphas(white_alpha, black_alpha, union)?;
    let white = union.view(white_alpha);
    let black = union.view(black_alpha);

    let white_depth = distance_to_uncovered(white, wraparound);
    let black_depth = distance_to_uncovered(black, wraparound);

    Ok(generate(union.dim(), |row, col| {
        match (white[[row, col]], black[[row, col]]) {
            (true, false) => 1.0,
            (false, _) => 0.0,
            (true, true) => {
                if white_depth[[row, col]] >= black_depth[[row, col]] {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }))
}

/// Soft mask from per-pixel confidence weights (canvas-sized).
///
/// In the overlap the mask is `ww / (ww + wb)`; where both weights vanish
/// the hard [`create_mask`] decision is used instead.
pub fn weighted_mask(
    white_alpha: &Array2<bool>,
    black_alpha: &Array2<bool>,
    white_weight: &Array2<f32>,
    black_weight: &Array2<f32>,
    union: &BoundingBox,
    wraparound: bool,
) -> Result<Array2<f32>> {
    if white_weight.dim() != white_alpha.dim() {
        return Err(BlendError::shape("mask", 0, white_alpha.dim(), white_weight.dim()));
    }
    if black_weight.dim() != black_alpha.dim() {
        return Err(BlendError::shape("mask", 0, black_alpha.dim(), black_weight.dim()));
    }
    let mut mask = create_mask(white_alpha, black_alpha, union, wraparound)?;

    Zip::from(&mut mask)
        .and(union.view(white_alpha))
        .and(union.view(black_alpha))
        .and(union.view(white_weight))
        .and(union.view(black_weight))
        .for_each(|m, &wa, &ba, &ww, &wb| {
            if wa && ba {
                let total = ww + wb;
                if total > EPSILON {
                    *m = (ww / total).clamp(0.0, 1.0);
                }
            }
        });

    Ok(mask)
}

/// Distance from each covered pixel to the nearest uncovered pixel of the
/// box. Pixels outside the box do not count; a fully covered box yields
/// infinity everywhere. With `wraparound` the left and right edges touch.
pub fn distance_to_uncovered(covered: ArrayView2<bool>, wraparound: bool) -> Array2<f32> {
    let (h, w) = covered.dim();
    if !wraparound || w == 0 {
        return chamfer(covered);
    }
    let tiled = Array2::from_shape_fn((h, 3 * w), |(row, col)| covered[[row, col % w]]);
    chamfer(tiled.view()).slice(s![.., w..2 * w]).to_owned()
}

/// Two-pass chamfer distance transform with unit and sqrt(2) steps.
fn chamfer(covered: ArrayView2<bool>) -> Array2<f32> {
    let (h, w) = covered.dim();
    let mut dist = covered.mapv(|c| if c { f32::INFINITY } else { 0.0 });

    let at = |dist: &Array2<f32>, row: isize, col: isize| -> f32 {
        if row < 0 || col < 0 || row >= h as isize || col >= w as isize {
            f32::INFINITY
        } else {
            dist[[row as usize, col as usize]]
        }
    };

    for row in 0..h {
        for col in 0..w {
            if dist[[row, col]] == 0.0 {
                continue;
            }
            let (r, c) = (row as isize, col as isize);
            let best = dist[[row, col]]
                .min(at(&dist, r, c - 1) + 1.0)
                .min(at(&dist, r - 1, c) + 1.0)
                .min(at(&dist, r - 1, c - 1) + CHAMFER_DIAGONAL)
                .min(at(&dist, r - 1, c + 1) + CHAMFER_DIAGONAL);
            dist[[row, col]] = best;
        }
    }

    for row in (0..h).rev() {
        for col in (0..w).rev() {
            if dist[[row, col]] == 0.0 {
                continue;
            }
            let (r, c) = (row as isize, col as isize);
            let best = dist[[row, col]]
                .min(at(&dist, r, c + 1) + 1.0)
                .min(at(&dist, r + 1, c) + 1.0)
                .min(at(&dist, r + 1, c + 1) + CHAMFER_DIAGONAL)
                .min(at(&dist, r + 1, c - 1) + CHAMFER_DIAGONAL);
            dist[[row, col]] = best;
        }
    }

    dist
}
