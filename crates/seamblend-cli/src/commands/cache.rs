use std::path::PathBuf;

use clap::Args;
use seamblend_core::storage::StorageMode;

/// Scratch storage flags shared by `blend` and `deghost`.
#[derive(Args)]
pub struct CacheFlags {
    /// Keep working buffers in tiled scratch files instead of memory
    #[arg(long)]
    pub disk_cache: bool,

    /// Directory for the scratch files (implies --disk-cache)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

impl CacheFlags {
    pub fn storage(&self) -> StorageMode {
        if self.disk_cache || self.cache_dir.is_some() {
            StorageMode::Disk {
                dir: self.cache_dir.clone(),
            }
        } else {
            StorageMode::Memory
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use seamblend_core::storage::StorageMode;

    use crate::{Cli, Commands};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("seamblend").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn disk_cache_does_not_swallow_inputs() {
        let Commands::Blend(args) = parse(&["blend", "--disk-cache", "a.tif", "b.tif"]).command
        else {
            panic!("expected blend");
        };
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.cache.storage(), StorageMode::Disk { dir: None });
    }

    #[test]
    fn cache_dir_behaves_the_same_for_both_commands() {
        let expected = StorageMode::Disk {
            dir: Some(PathBuf::from("/scratch")),
        };

        let Commands::Blend(blend) = parse(&["blend", "--cache-dir", "/scratch", "a.tif"]).command
        else {
            panic!("expected blend");
        };
        assert_eq!(blend.cache.storage(), expected);
        assert_eq!(blend.inputs.len(), 1);

        let Commands::Deghost(deghost) =
            parse(&["deghost", "--cache-dir", "/scratch", "a.tif", "b.tif"]).command
        else {
            panic!("expected deghost");
        };
        assert_eq!(deghost.cache.storage(), expected);
        assert_eq!(deghost.inputs.len(), 2);

        let Commands::Deghost(plain) = parse(&["deghost", "a.tif"]).command else {
            panic!("expected deghost");
        };
        assert_eq!(plain.cache.storage(), StorageMode::Memory);
    }
}
