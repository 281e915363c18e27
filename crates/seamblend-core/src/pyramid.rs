//! Gaussian and Laplacian pyramids over a region of interest.
//!
//! Levels are built finest-first with a separable 5-tap binomial kernel and
//! a 2x decimation. Rows always mirror at the border; columns either mirror
//! or wrap, the latter for panoramas that close on themselves horizontally.

use ndarray::{Array2, Zip};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{BINOMIAL_KERNEL, EPSILON, MIN_COARSE_SIZE, PARALLEL_PIXEL_THRESHOLD};
use crate::error::{BlendError, Result};
use crate::pixel::Pixel;
use crate::roi::BoundingBox;

/// An ordered pyramid. `levels[0]` is full resolution.
#[derive(Clone, Debug)]
pub struct Pyramid<P> {
    pub levels: Vec<Array2<P>>,
}

impl<P: Pixel> Pyramid<P> {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn coarsest(&self) -> Option<&Array2<P>> {
        self.levels.last()
    }

    /// Shapes of every level, finest first.
    pub fn dims(&self) -> Vec<(usize, usize)> {
        self.levels.iter().map(|l| l.dim()).collect()
    }
}

/// Mirror boundary handling: reflect index into [0, size).
/// Even function (f(-k) = f(k)) with period 2*size, ping-ponging within [0, size).
pub fn mirror_index(idx: isize, size: usize) -> usize {
    if size <= 1 {
        return 0;
    }
    let period = 2 * size;
    let abs_idx = idx.unsigned_abs();
    let m = abs_idx % period;

    if m < size {
        m
    } else {
        2 * size - 1 - m
    }
}

#[inline]
fn column_index(idx: isize, size: usize, wrap: bool) -> usize {
    if wrap && size > 0 {
        idx.rem_euclid(size as isize) as usize
    } else {
        mirror_index(idx, size)
    }
}

/// Fill a new array from a per-pixel function, in parallel for large outputs.
pub(crate) fn generate<T, F>(dim: (usize, usize), f: F) -> Array2<T>
where
    T: Copy + Default + Send + Sync,
    F: Fn(usize, usize) -> T + Sync + Send,
{
    let mut out = Array2::<T>::default(dim);
    if dim.0 * dim.1 >= PARALLEL_PIXEL_THRESHOLD {
        Zip::indexed(&mut out).par_for_each(|(row, col), v| *v = f(row, col));
    } else {
        Zip::indexed(&mut out).for_each(|(row, col), v| *v = f(row, col));
    }
    out
}

/// Blur with the binomial kernel and keep every other row and column.
pub fn reduce<P: Pixel>(data: &Array2<P>, wrap: bool) -> Array2<P> {
    let (h, w) = data.dim();
    let (nh, nw) = (h.div_ceil(2), w.div_ceil(2));

    let horizontal = generate((h, nw), |row, col| {
        let mut sum = P::zero();
        for (ki, &kv) in BINOMIAL_KERNEL.iter().enumerate() {
            let src = column_index(2 * col as isize + ki as isize - 2, w, wrap);
            sum += data[[row, src]] * kv;
        }
        sum
    });

    generate((nh, nw), |row, col| {
        let mut sum = P::zero();
        for (ki, &kv) in BINOMIAL_KERNEL.iter().enumerate() {
            let src = mirror_index(2 * row as isize + ki as isize - 2, h);
            sum += horizontal[[src, col]] * kv;
        }
        sum
    })
}

/// Alpha-aware [`reduce`]: a normalized convolution where pixels without
/// data carry no weight. A coarse pixel is valid if any tap was valid.
pub fn reduce_masked<P: Pixel>(
    data: &Array2<P>,
    alpha: &Array2<bool>,
    wrap: bool,
) -> (Array2<P>, Array2<bool>) {
    let (h, w) = data.dim();
    let (nh, nw) = (h.div_ceil(2), w.div_ceil(2));

    let horizontal = generate((h, nw), |row, col| {
        let mut sum = P::zero();
        let mut weight = 0.0f32;
        for (ki, &kv) in BINOMIAL_KERNEL.iter().enumerate() {
            let src = column_index(2 * col as isize + ki as isize - 2, w, wrap);
            if alpha[[row, src]] {
                sum += data[[row, src]] * kv;
                weight += kv;
            }
        }
        (sum, weight)
    });

    let reduced = generate((nh, nw), |row, col| {
        let mut sum = P::zero();
        let mut weight = 0.0f32;
        for (ki, &kv) in BINOMIAL_KERNEL.iter().enumerate() {
            let src = mirror_index(2 * row as isize + ki as isize - 2, h);
            let (s, wt) = horizontal[[src, col]];
            sum += s * kv;
            weight += wt * kv;
        }
        (sum, weight)
    });

    let values = reduced.mapv(|(sum, weight)| {
        if weight > EPSILON {
            sum * (1.0 / weight)
        } else {
            P::zero()
        }
    });
    let valid = reduced.mapv(|(_, weight)| weight > EPSILON);
    (values, valid)
}

/// Interpolate `coarse` up to the finer shape `dim`.
pub fn expand<P: Pixel>(coarse: &Array2<P>, dim: (usize, usize), wrap: bool) -> Array2<P> {
    let (ch, cw) = coarse.dim();
    let (h, w) = dim;

    let horizontal = generate((ch, w), |row, col| {
        expand_tap(col, |j| coarse[[row, column_index(j, cw, wrap)]])
    });

    generate((h, w), |row, col| {
        expand_tap(row, |j| horizontal[[mirror_index(j, ch), col]])
    })
}

/// One output sample of the 1D expand: zero insertion followed by the
/// binomial kernel scaled by 2, reduced to the taps that hit coarse samples.
#[inline]
fn expand_tap<P: Pixel>(x: usize, sample: impl Fn(isize) -> P) -> P {
    let j = (x / 2) as isize;
    if x % 2 == 0 {
        sample(j - 1) * 0.125 + sample(j) * 0.75 + sample(j + 1) * 0.125
    } else {
        (sample(j) + sample(j + 1)) * 0.5
    }
}

fn stop_reducing(level: &Array2<impl Copy>) -> bool {
    let (h, w) = level.dim();
    h.min(w) <= 1
}

/// Gaussian pyramid with at most `levels` levels; stops early once a
/// level is a single pixel thick.
pub fn gaussian_pyramid<P: Pixel>(data: &Array2<P>, levels: usize, wrap: bool) -> Pyramid<P> {
    let mut out = Vec::with_capacity(levels.max(1));
    out.push(data.clone());
    while out.len() < levels {
        let last = &out[out.len() - 1];
        if stop_reducing(last) {
            break;
        }
        let next = reduce(last, wrap);
        out.push(next);
    }
    Pyramid { levels: out }
}

/// Gaussian pyramid of an image that only has data where `alpha` is set,
/// together with the validity mask of each level.
fn masked_levels<P: Pixel>(
    data: &Array2<P>,
    alpha: &Array2<bool>,
    levels: usize,
    wrap: bool,
) -> Result<(Pyramid<P>, Vec<Array2<bool>>)> {
    if data.dim() != alpha.dim() {
        return Err(BlendError::shape("gaussian pyramid", 0, data.dim(), alpha.dim()));
    }
    let mut out = Vec::with_capacity(levels.max(1));
    let mut valid = Vec::with_capacity(levels.max(1));
    out.push(data.clone());
    valid.push(alpha.clone());
    while out.len() < levels {
        let last = &out[out.len() - 1];
        if stop_reducing(last) {
            break;
        }
        let (next, next_valid) = reduce_masked(last, &valid[valid.len() - 1], wrap);
        out.push(next);
        valid.push(next_valid);
    }
    Ok((Pyramid { levels: out }, valid))
}

/// Turn a Gaussian pyramid into band-pass residuals. The coarsest level is
/// kept unchanged. Residuals at different levels are computed in parallel.
pub fn laplacian_from_gaussian<P: Pixel>(gaussian: Pyramid<P>, wrap: bool) -> Pyramid<P> {
    let n = gaussian.len();
    let levels = &gaussian.levels;
    let residuals: Vec<Array2<P>> = (0..n)
        .into_par_iter()
        .map(|i| {
            if i + 1 == n {
                levels[i].clone()
            } else {
                let expanded = expand(&levels[i + 1], levels[i].dim(), wrap);
                Zip::from(&levels[i])
                    .and(&expanded)
                    .map_collect(|&g, &e| g - e)
            }
        })
        .collect();
    Pyramid { levels: residuals }
}

pub fn laplacian_pyramid<P: Pixel>(data: &Array2<P>, levels: usize, wrap: bool) -> Pyramid<P> {
    laplacian_from_gaussian(gaussian_pyramid(data, levels, wrap), wrap)
}

/// Laplacian pyramid of an image that only has data where `alpha` is set.
///
/// Residuals are zero where a level has no data, so collapsing fills those
/// pixels from the coarser levels instead of from undefined input.
pub fn laplacian_pyramid_masked<P: Pixel>(
    data: &Array2<P>,
    alpha: &Array2<bool>,
    levels: usize,
    wrap: bool,
) -> Result<Pyramid<P>> {
    let (gaussian, valid) = masked_levels(data, alpha, levels, wrap)?;
    let n = gaussian.len();
    let mut laplacian = laplacian_from_gaussian(gaussian, wrap);
    for (level, valid) in laplacian.levels.iter_mut().zip(&valid).take(n.saturating_sub(1)) {
        Zip::from(level).and(valid).for_each(|v, &ok| {
            if !ok {
                *v = P::zero();
            }
        });
    }
    Ok(laplacian)
}

/// Working region and depth for one blend iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoiPlan {
    /// Region that gets blended, in canvas coordinates.
    pub roi: BoundingBox,
    /// Number of pyramid levels, including full resolution.
    pub levels: usize,
    /// Whether this iteration wraps horizontally.
    pub wraparound: bool,
}

/// Half-width of the combined filter footprint after `levels` levels.
pub fn filter_half_width(levels: usize) -> usize {
    2 * ((1usize << levels.min(usize::BITS as usize - 2)) - 1)
}

/// Derive the pyramid depth from the overlap and grow the overlap into the
/// working ROI.
///
/// The depth grows until the overlap's short side, halved per level, is no
/// larger than [`MIN_COARSE_SIZE`]. The ROI is the overlap grown by the
/// filter half-width and clipped to the union. Wrapping is used only when
/// enabled and the ROI spans the whole canvas width.
pub fn roi_bounds(
    canvas: &BoundingBox,
    intersection: &BoundingBox,
    union: &BoundingBox,
    max_levels: usize,
    wraparound: bool,
) -> RoiPlan {
    let mut levels = 1;
    let mut short = intersection.width().min(intersection.height());
    while short > MIN_COARSE_SIZE && levels < max_levels.max(1) {
        short = short.div_ceil(2);
        levels += 1;
    }

    let roi = intersection
        .add_border(filter_half_width(levels))
        .clip_to(union);
    let wraps = wraparound && roi.x0 == canvas.x0 && roi.x1 == canvas.x1;
    debug!(%roi, levels, wraps, "Planned blend region");

    RoiPlan {
        roi,
        levels,
        wraparound: wraps,
    }
}
