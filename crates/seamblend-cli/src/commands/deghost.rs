use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use seamblend_core::consts::{DEFAULT_DEGHOST_ITERATIONS, DEFAULT_DEGHOST_SIGMA};
use seamblend_core::deghost::{DeghostConfig, KernelShape};
use seamblend_core::pipeline::run_deghost;

use super::cache::CacheFlags;
use crate::progress::BarReporter;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KernelArg {
    Gaussian,
    Arctangent,
}

impl From<KernelArg> for KernelShape {
    fn from(arg: KernelArg) -> Self {
        match arg {
            KernelArg::Gaussian => KernelShape::Gaussian,
            KernelArg::Arctangent => KernelShape::Arctangent,
        }
    }
}

/// Deghosting parameters shared by `blend --deghost` and `deghost`.
#[derive(Args)]
pub struct DeghostFlags {
    /// Kernel bandwidth in Lab units
    #[arg(long, default_value_t = DEFAULT_DEGHOST_SIGMA)]
    pub sigma: f64,

    /// Number of reweighting passes
    #[arg(long, default_value_t = DEFAULT_DEGHOST_ITERATIONS)]
    pub iterations: usize,

    /// Density kernel
    #[arg(long, value_enum, default_value = "gaussian")]
    pub kernel: KernelArg,

    /// Log-compress inputs before weighting (HDR stacks)
    #[arg(long)]
    pub hdr: bool,
}

impl DeghostFlags {
    pub fn to_config(&self) -> DeghostConfig {
        DeghostConfig {
            iterations: self.iterations,
            sigma: self.sigma,
            kernel: self.kernel.into(),
            hdr: self.hdr,
            ..Default::default()
        }
    }
}

#[derive(Args)]
pub struct DeghostArgs {
    /// Aligned input images of identical size
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Directory for the weight maps
    #[arg(short, long, default_value = "weights")]
    pub output: PathBuf,

    #[command(flatten)]
    pub flags: DeghostFlags,

    #[command(flatten)]
    pub cache: CacheFlags,
}

pub fn run(args: &DeghostArgs) -> Result<()> {
    let config = DeghostConfig {
        storage: args.cache.storage(),
        ..args.flags.to_config()
    };

    println!("Deghosting {} images", args.inputs.len());
    println!(
        "  Kernel:     {} (sigma {}, {} passes)",
        config.kernel, config.sigma, config.iterations
    );
    println!();

    let reporter = Arc::new(BarReporter::new(args.inputs.len())?);
    let written = run_deghost(&args.inputs, &config, &args.output, reporter.clone())
        .context("Deghosting failed")?;
    reporter.finish();

    for path in &written {
        println!("  {}", path.display());
    }
    println!("\n{} weight maps saved to {}", written.len(), args.output.display());
    Ok(())
}
