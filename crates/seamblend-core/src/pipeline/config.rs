use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::deghost::DeghostConfig;
use crate::engine::BlendOptions;
use crate::error::{BlendError, Result};
use crate::io::DebugArtifacts;

/// An input file and its placement in the panorama.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub path: PathBuf,
    #[serde(default)]
    pub x: usize,
    #[serde(default)]
    pub y: usize,
}

impl InputSpec {
    pub fn new(path: impl Into<PathBuf>, x: usize, y: usize) -> Self {
        Self {
            path: path.into(),
            x,
            y,
        }
    }
}

/// Parses `path` or `path@x,y`.
impl FromStr for InputSpec {
    type Err = BlendError;

    fn from_str(s: &str) -> Result<Self> {
        let Some((path, offset)) = s.rsplit_once('@') else {
            return Ok(Self::new(s, 0, 0));
        };
        let bad = || BlendError::InvalidParameter(format!("expected PATH@X,Y, got '{s}'"));
        let (x, y) = offset.split_once(',').ok_or_else(bad)?;
        let x = x.trim().parse().map_err(|_| bad())?;
        let y = y.trim().parse().map_err(|_| bad())?;
        if path.is_empty() {
            return Err(bad());
        }
        Ok(Self::new(path, x, y))
    }
}

/// How the seam between overlapping images is chosen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SeamStrategy {
    /// Each overlap pixel goes to the image it lies deeper within.
    #[default]
    Nearest,
    /// Per-pixel deghosting weights decide the overlap.
    Deghost(DeghostConfig),
}

/// Full configuration of a blend run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlendConfig {
    pub output: PathBuf,
    /// Rewrite the output after every blended layer.
    #[serde(default = "default_checkpoints")]
    pub checkpoints: bool,
    /// Log verbosity: 0 = warnings, 1 = info, 2 or more = debug.
    #[serde(default)]
    pub verbosity: u8,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub blend: BlendOptions,
    #[serde(default)]
    pub seam: SeamStrategy,
    #[serde(default)]
    pub debug: DebugArtifacts,
}

fn default_checkpoints() -> bool {
    true
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("panorama.tif"),
            checkpoints: true,
            verbosity: 0,
            inputs: Vec::new(),
            blend: BlendOptions::default(),
            seam: SeamStrategy::default(),
            debug: DebugArtifacts::default(),
        }
    }
}

impl BlendConfig {
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(BlendError::InvalidParameter("no input images".into()));
        }
        self.blend.validate()?;
        if self.debug.any() && self.debug.dir.is_none() {
            return Err(BlendError::InvalidParameter(
                "debug artifacts requested without a debug directory".into(),
            ));
        }
        if let SeamStrategy::Deghost(deghost) = &self.seam {
            deghost.validate()?;
            // Deghosting compares pixels at equal array coordinates, so the
            // stack must share one placement.
            let first = &self.inputs[0];
            if let Some(moved) = self
                .inputs
                .iter()
                .find(|i| (i.x, i.y) != (first.x, first.y))
            {
                return Err(BlendError::InvalidParameter(format!(
                    "deghosting needs aligned inputs, but {} is placed at {},{} and {} at {},{}",
                    first.path.display(),
                    first.x,
                    first.y,
                    moved.path.display(),
                    moved.x,
                    moved.y
                )));
            }
        }
        Ok(())
    }
}
