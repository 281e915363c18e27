use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use seamblend_core::consts::MAX_PYRAMID_LEVELS;
use seamblend_core::deghost::DeghostConfig;
use seamblend_core::engine::BlendOptions;
use seamblend_core::io::DebugArtifacts;
use seamblend_core::pipeline::{run_blend, BlendConfig, InputSpec, SeamStrategy};
use tracing::debug;

use super::cache::CacheFlags;
use super::deghost::DeghostFlags;
use crate::progress::BarReporter;
use crate::summary::{print_blend_result, print_blend_summary};

#[derive(Args)]
pub struct BlendArgs {
    /// Input images as PATH or PATH@X,Y, blended in order
    #[arg(required_unless_present = "config")]
    pub inputs: Vec<InputSpec>,

    /// Blend config file (TOML); replaces the flags below
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file (.tif for 16-bit, .png for 8-bit)
    #[arg(short, long, default_value = "panorama.tif")]
    pub output: PathBuf,

    /// Treat the panorama as a closed 360 degree strip
    #[arg(short, long)]
    pub wrap: bool,

    /// Maximum number of pyramid levels
    #[arg(short, long, default_value_t = MAX_PYRAMID_LEVELS)]
    pub levels: usize,

    #[command(flatten)]
    pub cache: CacheFlags,

    /// Merge non-overlapping inputs into one layer before blending
    #[arg(long)]
    pub assemble: bool,

    /// Choose seams from deghosting weights instead of overlap geometry
    #[arg(long)]
    pub deghost: bool,

    #[command(flatten)]
    pub deghost_flags: DeghostFlags,

    /// Directory for debug artifacts
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,

    /// Save the blend mask of every layer
    #[arg(long)]
    pub save_mask: bool,

    /// Save every level of the mask pyramid
    #[arg(long)]
    pub save_pyramid: bool,

    /// Save every assembled layer
    #[arg(long)]
    pub save_white: bool,

    /// Only write the output once, at the end
    #[arg(long)]
    pub no_checkpoint: bool,
}

fn read_config(path: &Path) -> Result<BlendConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&contents).context("Invalid blend config")
}

/// Verbosity requested by the config file, if any. Errors surface later in [`run`].
pub fn config_verbosity(args: &BlendArgs) -> u8 {
    args.config
        .as_ref()
        .and_then(|path| read_config(path).ok())
        .map_or(0, |config| config.verbosity)
}

pub fn run(args: &BlendArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let mut config = read_config(path)?;
            if !args.inputs.is_empty() {
                config.inputs = args.inputs.clone();
            }
            config
        }
        None => build_config_from_args(args),
    };
    config.validate().context("Invalid blend config")?;
    debug!(from_file = args.config.is_some(), ?config, "Resolved blend config");

    print_blend_summary(&config);

    let reporter = Arc::new(BarReporter::new(config.inputs.len())?);
    let summary = run_blend(&config, reporter.clone())
        .with_context(|| format!("Blending into {} failed", config.output.display()))?;
    reporter.finish();

    print_blend_result(&summary);
    Ok(())
}

fn build_config_from_args(args: &BlendArgs) -> BlendConfig {
    let storage = args.cache.storage();

    let seam = if args.deghost {
        SeamStrategy::Deghost(DeghostConfig {
            storage: storage.clone(),
            ..args.deghost_flags.to_config()
        })
    } else {
        SeamStrategy::Nearest
    };

    BlendConfig {
        output: args.output.clone(),
        checkpoints: !args.no_checkpoint,
        verbosity: 0,
        inputs: args.inputs.clone(),
        blend: BlendOptions {
            wraparound: args.wrap,
            max_levels: args.levels,
            storage,
            assemble_disjoint: args.assemble,
        },
        seam,
        debug: DebugArtifacts {
            dir: args.debug_dir.clone(),
            mask: args.save_mask,
            mask_pyramid: args.save_pyramid,
            white: args.save_white,
        },
    }
}
