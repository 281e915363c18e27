use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array2;
use tracing::info;

use crate::deghost::{DeghostConfig, KhanEstimator};
use crate::engine::{blend_sources, SourceImage};
use crate::error::{BlendError, Result};
use crate::io::{load_source, probe, save_composite, save_mask, FileSink};
use crate::pixel::{Pixel, PixelLayout, Rgb};

use super::config::{BlendConfig, InputSpec, SeamStrategy};
use super::types::{BlendStage, BlendSummary, ProgressReporter};

/// Rgb if any input has color, otherwise grayscale.
fn stack_layout<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<PixelLayout> {
    let mut layout = PixelLayout::Gray;
    for (i, path) in paths.into_iter().enumerate() {
        if probe(path).map_err(BlendError::load(i, path))?.layout == PixelLayout::Rgb {
            layout = PixelLayout::Rgb;
        }
    }
    Ok(layout)
}

fn load_all<P: Pixel>(
    inputs: &[InputSpec],
    reporter: &dyn ProgressReporter,
) -> Result<Vec<SourceImage<P>>> {
    reporter.begin_stage(BlendStage::Loading, Some(inputs.len()));
    let mut sources = Vec::with_capacity(inputs.len());
    for (i, input) in inputs.iter().enumerate() {
        let source = load_source::<P>(&input.path, input.x, input.y)
            .map_err(BlendError::load(i, &input.path))?;
        info!(
            index = i,
            path = %input.path.display(),
            width = source.dim().1,
            height = source.dim().0,
            x = input.x,
            y = input.y,
            "Loaded image"
        );
        sources.push(source);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    Ok(sources)
}

/// Blend the configured inputs into one image and write it.
pub fn run_blend(
    config: &BlendConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<BlendSummary> {
    config.validate()?;
    let layout = stack_layout(config.inputs.iter().map(|i| i.path.as_path()))?;
    info!(images = config.inputs.len(), %layout, output = %config.output.display(), "Blend run");

    match layout {
        PixelLayout::Gray => run_blend_typed::<f32>(config, reporter.as_ref()),
        PixelLayout::Rgb => run_blend_typed::<Rgb>(config, reporter.as_ref()),
    }
}

fn run_blend_typed<P: Pixel>(
    config: &BlendConfig,
    reporter: &dyn ProgressReporter,
) -> Result<BlendSummary> {
    let mut sources = load_all::<P>(&config.inputs, reporter)?;

    if let SeamStrategy::Deghost(deghost) = &config.seam {
        reporter.begin_stage(BlendStage::Deghosting, None);
        let estimator = KhanEstimator::new(deghost.clone())?;
        let images: Vec<Array2<P>> = sources.iter().map(|s| s.data.clone()).collect();
        let weights = estimator.weight_masks(&images)?;
        drop(images);
        sources = sources
            .into_iter()
            .zip(weights)
            .map(|(source, weight)| source.with_weight(weight))
            .collect::<Result<_>>()?;
        reporter.finish_stage();
    }

    let mut sink = FileSink::new(
        config.output.clone(),
        config.debug.clone(),
        config.checkpoints,
    );
    let images = sources.len();
    let outcome = blend_sources(sources, &config.blend, &mut sink, reporter)?;

    reporter.begin_stage(BlendStage::Writing, None);
    save_composite(
        &outcome.composite.to_array(),
        &outcome.composite.alpha,
        &config.output,
    )?;
    reporter.finish_stage();
    info!(output = %config.output.display(), canvas = %outcome.canvas, "Wrote panorama");

    Ok(BlendSummary {
        output: config.output.clone(),
        layout: P::LAYOUT,
        canvas: outcome.canvas,
        images,
        layers: outcome.layers,
    })
}

/// Compute deghosting weights for an aligned stack and write one 16-bit
/// weight map per input into `out_dir`.
pub fn run_deghost(
    inputs: &[PathBuf],
    config: &DeghostConfig,
    out_dir: &Path,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<Vec<PathBuf>> {
    config.validate()?;
    if inputs.is_empty() {
        return Err(BlendError::InvalidParameter("no input images".into()));
    }
    let specs: Vec<InputSpec> = inputs.iter().map(|p| InputSpec::new(p, 0, 0)).collect();
    let weights = match stack_layout(inputs.iter().map(PathBuf::as_path))? {
        PixelLayout::Gray => deghost_typed::<f32>(&specs, config, reporter.as_ref())?,
        PixelLayout::Rgb => deghost_typed::<Rgb>(&specs, config, reporter.as_ref())?,
    };

    std::fs::create_dir_all(out_dir)?;
    reporter.begin_stage(BlendStage::Writing, Some(weights.len()));
    let mut written = Vec::with_capacity(weights.len());
    for (i, (input, weight)) in inputs.iter().zip(&weights).enumerate() {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("image-{i:03}"));
        let path = out_dir.join(format!("{stem}-weight.tif"));
        save_mask(weight, &path)?;
        info!(path = %path.display(), "Wrote weight map");
        written.push(path);
        reporter.advance(i + 1);
    }
    reporter.finish_stage();
    Ok(written)
}

fn deghost_typed<P: Pixel>(
    specs: &[InputSpec],
    config: &DeghostConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<Array2<f32>>> {
    let images: Vec<Array2<P>> = load_all::<P>(specs, reporter)?
        .into_iter()
        .map(|s| s.data)
        .collect();
    reporter.begin_stage(BlendStage::Deghosting, None);
    let weights = KhanEstimator::new(config.clone())?.weight_masks(&images)?;
    reporter.finish_stage();
    Ok(weights)
}
