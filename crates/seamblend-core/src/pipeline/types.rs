use std::path::PathBuf;

use crate::pixel::PixelLayout;
use crate::roi::BoundingBox;

/// Processing stage, used for progress reporting.
///
/// The blend loop moves through `AwaitingNextImage -> AssembleWhite ->
/// ComputeRoi -> BuildMask -> BuildPyramids -> BlendCollapse -> Checkpoint`
/// once per layer and ends in `Done`. A layer without overlap goes from
/// `ComputeRoi` straight to `Checkpoint`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlendStage {
    Loading,
    Deghosting,
    AwaitingNextImage,
    AssembleWhite,
    ComputeRoi,
    BuildMask,
    BuildPyramids,
    BlendCollapse,
    Checkpoint,
    Writing,
    Done,
}

impl std::fmt::Display for BlendStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading images"),
            Self::Deghosting => write!(f, "Computing deghosting weights"),
            Self::AwaitingNextImage => write!(f, "Waiting for next image"),
            Self::AssembleWhite => write!(f, "Assembling image"),
            Self::ComputeRoi => write!(f, "Computing blend region"),
            Self::BuildMask => write!(f, "Building mask"),
            Self::BuildPyramids => write!(f, "Building pyramids"),
            Self::BlendCollapse => write!(f, "Blending"),
            Self::Checkpoint => write!(f, "Writing checkpoint"),
            Self::Writing => write!(f, "Writing output"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started. For blend-loop stages `item` is the index of
    /// the layer being blended; otherwise it is the number of work items.
    fn begin_stage(&self, _stage: BlendStage, _item: Option<usize>) {}

    /// One work item within the current stage has completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// What a blend run produced.
#[derive(Clone, Debug)]
pub struct BlendSummary {
    pub output: PathBuf,
    pub layout: PixelLayout,
    /// Panorama canvas, in input placement coordinates.
    pub canvas: BoundingBox,
    /// Number of input images.
    pub images: usize,
    /// Number of blend passes after assembly.
    pub layers: usize,
}
