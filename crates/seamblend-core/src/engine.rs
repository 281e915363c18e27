//! The sequential blend loop.
//!
//! A running composite ("black") absorbs one assembled layer ("white") per
//! iteration. The composite is owned by the loop and threaded through each
//! iteration by mutable reference; nothing else touches it while it runs.

use std::collections::VecDeque;

use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::blend::{blend_pyramids, collapse};
use crate::consts::MAX_PYRAMID_LEVELS;
use crate::error::{BlendError, Result};
use crate::mask::{create_mask, weighted_mask};
use crate::pipeline::{BlendStage, ProgressReporter};
use crate::pixel::Pixel;
use crate::pyramid::{gaussian_pyramid, laplacian_pyramid_masked, roi_bounds};
use crate::roi::{mask_bounds, BoundingBox};
use crate::storage::{create_store, PixelStore, StorageMode};

/// Knobs of the blend loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendOptions {
    /// Treat the canvas as horizontally closed (360° panoramas).
    #[serde(default)]
    pub wraparound: bool,
    /// Upper bound on pyramid levels.
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Merge non-overlapping inputs into one layer before blending.
    #[serde(default)]
    pub assemble_disjoint: bool,
    /// Where the composite and assembled layers are kept.
    #[serde(default)]
    pub storage: StorageMode,
}

fn default_max_levels() -> usize {
    MAX_PYRAMID_LEVELS
}

impl Default for BlendOptions {
    fn default() -> Self {
        Self {
            wraparound: false,
            max_levels: MAX_PYRAMID_LEVELS,
            assemble_disjoint: false,
            storage: StorageMode::Memory,
        }
    }
}

impl BlendOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_levels == 0 || self.max_levels > MAX_PYRAMID_LEVELS {
            return Err(BlendError::InvalidParameter(format!(
                "max_levels must be in 1..={MAX_PYRAMID_LEVELS}, got {}",
                self.max_levels
            )));
        }
        Ok(())
    }
}

/// A decoded input image and where it sits in the panorama.
#[derive(Clone, Debug)]
pub struct SourceImage<P> {
    pub data: Array2<P>,
    /// Pixels that carry data.
    pub alpha: Array2<bool>,
    pub x: usize,
    pub y: usize,
    /// Optional per-pixel confidence (e.g. deghosting weights).
    pub weight: Option<Array2<f32>>,
}

impl<P: Pixel> SourceImage<P> {
    pub fn new(data: Array2<P>, alpha: Array2<bool>, x: usize, y: usize) -> Result<Self> {
        if data.dim() != alpha.dim() {
            return Err(BlendError::shape("source", 0, data.dim(), alpha.dim()));
        }
        Ok(Self {
            data,
            alpha,
            x,
            y,
            weight: None,
        })
    }

    /// An image that is valid everywhere.
    pub fn opaque(data: Array2<P>, x: usize, y: usize) -> Self {
        let alpha = Array2::from_elem(data.dim(), true);
        Self {
            data,
            alpha,
            x,
            y,
            weight: None,
        }
    }

    pub fn with_weight(mut self, weight: Array2<f32>) -> Result<Self> {
        if weight.dim() != self.data.dim() {
            return Err(BlendError::shape("source", 0, self.data.dim(), weight.dim()));
        }
        self.weight = Some(weight);
        Ok(self)
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// The placed rectangle in panorama coordinates.
    pub fn placement(&self) -> BoundingBox {
        let (h, w) = self.data.dim();
        BoundingBox::from_size(self.x, self.y, w, h)
    }
}

/// One or more inputs assembled onto the canvas.
///
/// Buffers are canvas-sized; `bounds` is the tight box of `alpha`.
pub struct Layer<P: Pixel> {
    pub image: Box<dyn PixelStore<P>>,
    pub alpha: Array2<bool>,
    pub weight: Option<Array2<f32>>,
    pub bounds: BoundingBox,
    /// Indices of the inputs that make up this layer.
    pub sources: Vec<usize>,
}

/// The running composite is a layer that has absorbed every layer so far.
pub type Composite<P> = Layer<P>;

impl<P: Pixel> Layer<P> {
    fn empty(dim: (usize, usize), storage: &StorageMode) -> Result<Self> {
        Ok(Self {
            image: create_store(storage, dim)?,
            alpha: Array2::from_elem(dim, false),
            weight: None,
            bounds: BoundingBox::empty(),
            sources: Vec::new(),
        })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.alpha.dim()
    }

    pub fn to_array(&self) -> Array2<P> {
        self.image.to_array()
    }

    fn overlaps(&self, src: &SourceImage<P>, at: &BoundingBox) -> bool {
        Zip::from(at.view(&self.alpha))
            .and(&src.alpha)
            .fold(false, |acc, &a, &b| acc || (a && b))
    }

    /// Paint `src` onto the layer at `at` (canvas-local placement).
    fn place(&mut self, index: usize, src: SourceImage<P>, at: &BoundingBox) -> Result<()> {
        if src.data.dim() != src.alpha.dim() {
            return Err(BlendError::shape("assemble", index, src.data.dim(), src.alpha.dim()));
        }
        if !BoundingBox::from_dim(self.dim()).contains(at) || at.dim() != src.dim() {
            return Err(BlendError::shape("assemble", index, self.dim(), src.dim()));
        }

        self.image
            .write_region_where(at, src.data.view(), src.alpha.view())?;
        Zip::from(at.view_mut(&mut self.alpha))
            .and(&src.alpha)
            .for_each(|dst, &a| *dst |= a);

        if let Some(weight) = &src.weight {
            if weight.dim() != src.dim() {
                return Err(BlendError::shape("assemble", index, src.dim(), weight.dim()));
            }
            let dim = self.dim();
            let layer_weight = self.weight.get_or_insert_with(|| Array2::zeros(dim));
            Zip::from(at.view_mut(layer_weight))
                .and(weight)
                .and(&src.alpha)
                .for_each(|dst, &w, &a| {
                    if a {
                        *dst = w;
                    }
                });
        }

        let local = mask_bounds(&src.alpha).translate(at.x0, at.y0);
        self.bounds = self.bounds.unite(&local);
        self.sources.push(index);
        Ok(())
    }

    /// Copy every pixel `other` covers, with no blending.
    fn absorb(&mut self, other: &Layer<P>) -> Result<()> {
        let region = other.bounds;
        let pixels = other.image.read_region(&region);
        let alpha = region.view(&other.alpha);
        self.image
            .write_region_where(&region, pixels.view(), alpha)?;
        self.union_alpha_and_weight(other);
        Ok(())
    }

    fn union_alpha_and_weight(&mut self, other: &Layer<P>) {
        let region = other.bounds;
        Zip::from(region.view_mut(&mut self.alpha))
            .and(region.view(&other.alpha))
            .for_each(|dst, &a| *dst |= a);

        if let Some(other_weight) = &other.weight {
            let dim = self.dim();
            let weight = self.weight.get_or_insert_with(|| Array2::zeros(dim));
            Zip::from(weight)
                .and(other_weight)
                .for_each(|dst, &w| *dst += w);
        }
    }
}

/// Intermediate results a blend run can hand out for inspection.
pub enum Artifact<'a, P: Pixel> {
    /// The assembled white layer of an iteration.
    White { iteration: usize, layer: &'a Layer<P> },
    /// The full mask over the union box.
    Mask {
        iteration: usize,
        mask: &'a Array2<f32>,
    },
    /// One level of the mask's Gaussian pyramid over the ROI.
    MaskLevel {
        iteration: usize,
        level: usize,
        mask: &'a Array2<f32>,
    },
}

/// Receives checkpoints of the composite and optional diagnostic artifacts.
///
/// Checkpoint failures abort the run. Artifacts are best-effort: sinks
/// must swallow (and log) their own failures.
pub trait ArtifactSink<P: Pixel> {
    fn checkpoint(&mut self, _composite: &Composite<P>) -> Result<()> {
        Ok(())
    }

    fn artifact(&mut self, _artifact: Artifact<'_, P>) {}
}

/// Sink that keeps nothing.
pub struct NoArtifacts;
impl<P: Pixel> ArtifactSink<P> for NoArtifacts {}

/// Result of a blend run.
pub struct BlendOutcome<P: Pixel> {
    pub composite: Composite<P>,
    /// Canvas in panorama coordinates; composite buffers start at its corner.
    pub canvas: BoundingBox,
    /// Number of layers folded into the composite, the first included.
    pub layers: usize,
}

/// Pull the next layer off the queue. With `assemble_disjoint`, every
/// queued input that does not overlap the layer so far is merged into it.
fn assemble<P: Pixel>(
    queue: &mut VecDeque<(usize, SourceImage<P>)>,
    canvas: &BoundingBox,
    options: &BlendOptions,
) -> Result<Option<Layer<P>>> {
    let Some((index, first)) = queue.pop_front() else {
        return Ok(None);
    };
    let assembling = |index| move |e: BlendError| e.at_stage(BlendStage::AssembleWhite, index);
    let mut layer = Layer::empty(canvas.dim(), &options.storage).map_err(assembling(index))?;
    let at = first.placement().relative_to(canvas);
    layer.place(index, first, &at).map_err(assembling(index))?;

    if options.assemble_disjoint {
        let mut i = 0;
        while i < queue.len() {
            let at = queue[i].1.placement().relative_to(canvas);
            if layer.overlaps(&queue[i].1, &at) {
                i += 1;
                continue;
            }
            if let Some((index, src)) = queue.remove(i) {
                layer.place(index, src, &at).map_err(assembling(index))?;
            }
        }
    }

    debug!(sources = ?layer.sources, bounds = %layer.bounds, "Assembled layer");
    Ok(Some(layer))
}

/// Current position in the per-layer stage sequence, so a failure can
/// name the stage it happened in.
struct StageCursor<'a> {
    reporter: &'a dyn ProgressReporter,
    iteration: usize,
    current: BlendStage,
}

impl StageCursor<'_> {
    fn enter(&mut self, stage: BlendStage) {
        self.current = stage;
        self.reporter.begin_stage(stage, Some(self.iteration));
    }
}

/// Blend every source into one composite, in input order.
pub fn blend_sources<P: Pixel>(
    sources: Vec<SourceImage<P>>,
    options: &BlendOptions,
    sink: &mut dyn ArtifactSink<P>,
    reporter: &dyn ProgressReporter,
) -> Result<BlendOutcome<P>> {
    options.validate()?;
    if sources.is_empty() {
        return Err(BlendError::InvalidParameter("empty input list".into()));
    }

    let canvas = sources
        .iter()
        .fold(BoundingBox::empty(), |acc, s| acc.unite(&s.placement()));
    let local = BoundingBox::from_dim(canvas.dim());
    info!(images = sources.len(), %canvas, storage = %options.storage, "Starting blend");

    let mut queue: VecDeque<(usize, SourceImage<P>)> = sources.into_iter().enumerate().collect();

    reporter.begin_stage(BlendStage::AssembleWhite, Some(0));
    let Some(mut black) = assemble(&mut queue, &canvas, options)? else {
        return Err(BlendError::InvalidParameter("empty input list".into()));
    };
    reporter.begin_stage(BlendStage::Checkpoint, Some(0));
    let first = black.sources.first().copied().unwrap_or_default();
    sink.checkpoint(&black)
        .map_err(|e| e.at_stage(BlendStage::Checkpoint, first))?;

    let mut layers = 1;
    loop {
        reporter.begin_stage(BlendStage::AwaitingNextImage, Some(layers));
        if queue.is_empty() {
            break;
        }
        reporter.begin_stage(BlendStage::AssembleWhite, Some(layers));
        let Some(white) = assemble(&mut queue, &canvas, options)? else {
            break;
        };
        sink.artifact(Artifact::White {
            iteration: layers,
            layer: &white,
        });

        let image = white.sources.first().copied().unwrap_or_default();
        let mut cursor = StageCursor {
            reporter,
            iteration: layers,
            current: BlendStage::ComputeRoi,
        };
        blend_layer(&mut black, white, &local, options, sink, &mut cursor)
            .map_err(|e| e.at_stage(cursor.current, image))?;

        reporter.advance(layers);
        layers += 1;
    }

    reporter.begin_stage(BlendStage::Done, None);
    info!(layers, "Blend complete");
    Ok(BlendOutcome {
        composite: black,
        canvas,
        layers,
    })
}

/// Fold one white layer into the composite.
fn blend_layer<P: Pixel>(
    black: &mut Composite<P>,
    white: Layer<P>,
    canvas: &BoundingBox,
    options: &BlendOptions,
    sink: &mut dyn ArtifactSink<P>,
    cursor: &mut StageCursor<'_>,
) -> Result<()> {
    let iteration = cursor.iteration;
    cursor.enter(BlendStage::ComputeRoi);
    let union = white.bounds.unite(&black.bounds);

    let Some(intersection) = white.bounds.intersect(&black.bounds) else {
        info!(
            iteration,
            white = %white.bounds,
            black = %black.bounds,
            "No overlap, copying layer into composite"
        );
        black.absorb(&white)?;
        black.bounds = union;
        black.sources.extend(white.sources);
        cursor.enter(BlendStage::Checkpoint);
        return sink.checkpoint(black);
    };

    let plan = roi_bounds(
        canvas,
        &intersection,
        &union,
        options.max_levels,
        options.wraparound,
    );
    info!(
        iteration,
        %union,
        roi = %plan.roi,
        levels = plan.levels,
        wraparound = plan.wraparound,
        "Blending layer"
    );

    cursor.enter(BlendStage::BuildMask);
    let mut mask = match (&white.weight, &black.weight) {
        (Some(ww), Some(wb)) => weighted_mask(
            &white.alpha,
            &black.alpha,
            ww,
            wb,
            &union,
            plan.wraparound,
        )?,
        _ => create_mask(&white.alpha, &black.alpha, &union, plan.wraparound)?,
    };
    if !mask.iter().any(|&m| m > 0.0) {
        warn!(
            iteration,
            sources = ?white.sources,
            "Layer is fully covered by the composite and will not contribute"
        );
    }
    sink.artifact(Artifact::Mask {
        iteration,
        mask: &mask,
    });

    cursor.enter(BlendStage::BuildPyramids);
    let roi_in_union = plan.roi.relative_to(&union);
    let mask_gp = gaussian_pyramid(
        &roi_in_union.view(&mask).to_owned(),
        plan.levels,
        plan.wraparound,
    );
    for (level, data) in mask_gp.levels.iter().enumerate() {
        sink.artifact(Artifact::MaskLevel {
            iteration,
            level,
            mask: data,
        });
    }

    // Outside the ROI there is no overlap, so white's share of the mask is
    // copied as-is. The ROI itself is left for the pyramids.
    roi_in_union.view_mut(&mut mask).fill(0.0);
    let white_in_union = white.bounds.relative_to(&union);
    let outside = white_in_union.view(&mask).mapv(|m| m > 0.5);
    let white_pixels = white.image.read_region(&white.bounds);
    black
        .image
        .write_region_where(&white.bounds, white_pixels.view(), outside.view())?;
    drop(white_pixels);
    drop(mask);

    let white_lp = laplacian_pyramid_masked(
        &white.image.read_region(&plan.roi),
        &plan.roi.view(&white.alpha).to_owned(),
        plan.levels,
        plan.wraparound,
    )?;
    let black_lp = laplacian_pyramid_masked(
        &black.image.read_region(&plan.roi),
        &plan.roi.view(&black.alpha).to_owned(),
        plan.levels,
        plan.wraparound,
    )?;
    debug!(iteration, levels = ?white_lp.dims(), "Built image pyramids");

    black.union_alpha_and_weight(&white);

    cursor.enter(BlendStage::BlendCollapse);
    let blended = blend_pyramids(&mask_gp, &white_lp, &black_lp)?;
    drop(white_lp);
    drop(black_lp);
    let collapsed = collapse(blended, plan.wraparound);

    let alpha_roi = plan.roi.view(&black.alpha).to_owned();
    black
        .image
        .write_region_where(&plan.roi, collapsed.view(), alpha_roi.view())?;
    black.bounds = union;
    black.sources.extend(white.sources);

    cursor.enter(BlendStage::Checkpoint);
    sink.checkpoint(black)
}
