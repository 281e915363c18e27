use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{Artifact, ArtifactSink, Composite};
use crate::error::Result;
use crate::io::image_io::{save_composite, save_mask};
use crate::pixel::Pixel;

/// Which intermediate results to write, and where.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DebugArtifacts {
    pub dir: Option<PathBuf>,
    /// Blend mask of every iteration.
    #[serde(default)]
    pub mask: bool,
    /// Every level of the mask's Gaussian pyramid.
    #[serde(default)]
    pub mask_pyramid: bool,
    /// The assembled layer of every iteration.
    #[serde(default)]
    pub white: bool,
}

impl DebugArtifacts {
    pub fn any(&self) -> bool {
        self.mask || self.mask_pyramid || self.white
    }
}

/// Writes checkpoints to the output path and debug artifacts to disk.
pub struct FileSink {
    output: PathBuf,
    debug: DebugArtifacts,
    checkpoints: bool,
}

impl FileSink {
    pub fn new(output: PathBuf, debug: DebugArtifacts, checkpoints: bool) -> Self {
        Self {
            output,
            debug,
            checkpoints,
        }
    }

    fn artifact_path(&self, enabled: bool, name: String) -> Option<PathBuf> {
        if !enabled {
            return None;
        }
        self.debug.dir.as_ref().map(|dir| dir.join(name))
    }
}

fn report(path: &Path, result: Result<()>) {
    match result {
        Ok(()) => debug!(path = %path.display(), "Wrote debug artifact"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to write debug artifact"),
    }
}

impl<P: Pixel> ArtifactSink<P> for FileSink {
    fn checkpoint(&mut self, composite: &Composite<P>) -> Result<()> {
        if !self.checkpoints {
            return Ok(());
        }
        debug!(path = %self.output.display(), sources = ?composite.sources, "Checkpoint");
        save_composite(&composite.to_array(), &composite.alpha, &self.output)
    }

    fn artifact(&mut self, artifact: Artifact<'_, P>) {
        match artifact {
            Artifact::White { iteration, layer } => {
                if let Some(path) =
                    self.artifact_path(self.debug.white, format!("white-{iteration:03}.tif"))
                {
                    report(&path, save_composite(&layer.to_array(), &layer.alpha, &path));
                }
            }
            Artifact::Mask { iteration, mask } => {
                if let Some(path) =
                    self.artifact_path(self.debug.mask, format!("mask-{iteration:03}.tif"))
                {
                    report(&path, save_mask(mask, &path));
                }
            }
            Artifact::MaskLevel {
                iteration,
                level,
                mask,
            } => {
                if let Some(path) = self.artifact_path(
                    self.debug.mask_pyramid,
                    format!("mask-{iteration:03}-level-{level:02}.tif"),
                ) {
                    report(&path, save_mask(mask, &path));
                }
            }
        }
    }
}
