use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use seamblend_core::deghost::DeghostConfig;
use seamblend_core::pipeline::{BlendConfig, InputSpec, SeamStrategy};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include the deghosting seam strategy
    #[arg(long)]
    pub deghost: bool,
}

/// Print or save a full default BlendConfig as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    // A deghosted blend works on an aligned stack, a plain one on a panorama.
    let (inputs, seam) = if args.deghost {
        (
            vec![
                InputSpec::new("exposure-1.tif", 0, 0),
                InputSpec::new("exposure-2.tif", 0, 0),
            ],
            SeamStrategy::Deghost(DeghostConfig::default()),
        )
    } else {
        (
            vec![
                InputSpec::new("left.tif", 0, 0),
                InputSpec::new("right.tif", 800, 0),
            ],
            SeamStrategy::Nearest,
        )
    };
    let config = BlendConfig {
        inputs,
        seam,
        ..Default::default()
    };
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
