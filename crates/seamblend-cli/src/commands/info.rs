use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use seamblend_core::io::probe;

#[derive(Args)]
pub struct InfoArgs {
    /// Image files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    for (i, file) in args.files.iter().enumerate() {
        let info = probe(file).with_context(|| format!("Failed to read {}", file.display()))?;
        if i > 0 {
            println!();
        }
        println!("File:        {}", file.display());
        println!("Dimensions:  {}x{}", info.width, info.height);
        println!("Layout:      {}", info.layout);
        println!("Alpha:       {}", if info.has_alpha { "yes" } else { "no" });
        println!("Bits/pixel:  {}", info.bits_per_pixel);
    }
    Ok(())
}
