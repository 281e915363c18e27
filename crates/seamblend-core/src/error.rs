use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::BlendStage;

#[derive(Error, Debug)]
pub enum BlendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Shape mismatch in {stage} (image {index}): expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        stage: &'static str,
        index: usize,
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pyramid level count mismatch: expected {expected}, got {got}")]
    LevelMismatch { expected: usize, got: usize },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Failed to read image {index} ({}): {source}", path.display())]
    Load {
        index: usize,
        path: PathBuf,
        source: Box<BlendError>,
    },

    #[error("Image {index} failed during stage '{stage}': {source}")]
    Stage {
        stage: BlendStage,
        index: usize,
        source: Box<BlendError>,
    },
}

impl BlendError {
    /// Shorthand for a `ShapeMismatch` raised at `stage` for image `index`.
    pub fn shape(
        stage: &'static str,
        index: usize,
        expected: (usize, usize),
        got: (usize, usize),
    ) -> Self {
        Self::ShapeMismatch {
            stage,
            index,
            expected,
            got,
        }
    }

    /// Attach the input index and path to an error raised while reading it.
    pub fn load(index: usize, path: impl Into<PathBuf>) -> impl FnOnce(BlendError) -> Self {
        let path = path.into();
        move |source| Self::Load {
            index,
            path,
            source: Box::new(source),
        }
    }

    /// Attach the blend stage and image index. Shape errors already name a
    /// stage and only get the index filled in.
    pub fn at_stage(self, stage: BlendStage, index: usize) -> Self {
        match self {
            Self::ShapeMismatch {
                stage: origin,
                expected,
                got,
                ..
            } => Self::ShapeMismatch {
                stage: origin,
                index,
                expected,
                got,
            },
            err @ (Self::Stage { .. } | Self::Load { .. }) => err,
            other => Self::Stage {
                stage,
                index,
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, BlendError>;
