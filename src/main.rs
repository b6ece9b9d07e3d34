//! Chartwright - research-to-chart agent loop
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;

use clap::Parser;
use chartwright::cli::report;
use chartwright::core::config::ProviderType;
use chartwright::{ChartPipeline, Config, Repl};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Chartwright - research a topic and produce chart specifications
#[derive(Parser, Debug)]
#[command(name = "chartwright")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model provider (openai, ollama)
    #[arg(long)]
    provider: Option<ProviderType>,

    /// Research worker model
    #[arg(long, short = 'r')]
    research_model: Option<String>,

    /// Chart worker model
    #[arg(long, short = 'c')]
    chart_model: Option<String>,

    /// Maximum research-chart cycles (0 means unbounded)
    #[arg(long, conflicts_with = "unbounded")]
    max_cycles: Option<usize>,

    /// Run until the chart worker is satisfied, with no cycle cap
    #[arg(long)]
    unbounded: bool,

    /// Write the final chart JSON to this file
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load()?;

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.provider = provider;
    }

    if let Some(ref model) = args.research_model {
        config.set_research_model(model);
    }

    if let Some(ref model) = args.chart_model {
        config.set_chart_model(model);
    }

    if let Some(max) = args.max_cycles {
        config.pipeline.max_cycles = cycle_cap(max);
    }

    if args.unbounded {
        config.pipeline.max_cycles = None;
    }

    if args.debug {
        config.pipeline.debug = true;
    }

    init_logging(config.pipeline.debug);
    config.validate()?;

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let pipeline = ChartPipeline::from_config(&config)?.with_observer(report::progress_observer());
        let outcome = pipeline.run(&prompt).await?;

        report::print_outcome(&outcome);
        if let Some(path) = args.output {
            report::write_output(&outcome, &path)?;
            eprintln!("Saved chart JSON to {}", path.display());
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config, args.output)?;
    repl.run().await?;

    Ok(())
}

/// Cycle cap from a count, where 0 means unbounded
fn cycle_cap(max: usize) -> Option<usize> {
    (max > 0).then_some(max)
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "chartwright=debug"
    } else {
        "chartwright=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_max_cycles_is_unbounded() {
        let args = Args::parse_from(["chartwright", "--max-cycles", "0"]);
        assert_eq!(args.max_cycles.and_then(cycle_cap), None);

        let args = Args::parse_from(["chartwright", "--max-cycles", "3"]);
        assert_eq!(args.max_cycles.and_then(cycle_cap), Some(3));
    }
}
