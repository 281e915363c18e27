mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seamblend", about = "Multiresolution panorama blending")]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Blend overlapping images into one panorama
    Blend(commands::blend::BlendArgs),
    /// Compute deghosting weight maps for an aligned stack
    Deghost(commands::deghost::DeghostArgs),
    /// Show image dimensions and channel layout
    Info(commands::info::InfoArgs),
    /// Print or save a default blend config (TOML)
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbosity = match &cli.command {
        Commands::Blend(args) => cli.verbose.max(commands::blend::config_verbosity(args)),
        _ => cli.verbose,
    };
    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Blend(args) => commands::blend::run(args),
        Commands::Deghost(args) => commands::deghost::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
