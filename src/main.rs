use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use racefunds::config::Config;
use racefunds::identity::{HeuristicMatcher, NameMatcher, ScoredMatcher};
use racefunds::logging::configure_logging;
use racefunds::pipeline::Pipeline;

/// Build the campaign-finance dataset for the current election cycle.
#[derive(Parser, Debug)]
#[command(name = "racefunds")]
struct Cli {
    /// Refresh governor races only, skipping the federal roster
    #[arg(long)]
    governors_only: bool,

    /// Use cached API responses only; never touch the network
    #[arg(long)]
    offline: bool,

    /// Use the Jaro-Winkler scoring matcher instead of the prefix heuristic
    #[arg(long)]
    strict_matching: bool,

    /// Output directory for the dataset
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Cache directory for API responses
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Election cycle year
    #[arg(long)]
    cycle: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    configure_logging();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.cache_dir {
        config.cache_dir = dir;
    }
    if let Some(cycle) = cli.cycle {
        config.cycle = cycle;
    }

    let matcher: Box<dyn NameMatcher> = if cli.strict_matching {
        Box::new(ScoredMatcher::default())
    } else {
        Box::new(HeuristicMatcher)
    };

    Pipeline::new(config, matcher, cli.offline)
        .run(cli.governors_only)
        .await
}
