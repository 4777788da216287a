//! oneclass CLI
//!
//! Prepares a one-class anomaly dataset and reports the resulting split.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

use oneclass::logging::{init_logging, LogConfig, LogLevel};
use oneclass::{load_data, Options};

/// Derive a one-class anomaly-detection split from a labeled image dataset
#[derive(Parser, Debug)]
#[command(name = "oneclass")]
#[command(version)]
#[command(about = "Prepare one-class anomaly-detection datasets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Minimum log level (overrides --verbose)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[command(flatten)]
    options: Options,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    if let Some(level) = cli.log_level {
        log_config = log_config.with_level(level);
    }
    init_logging(&log_config).map_err(|e| anyhow!(e))?;

    let mut data = load_data(&cli.options)
        .with_context(|| format!("failed to prepare dataset {:?}", cli.options.dataset))?;

    println!("Dataset:  {}", cli.options.dataset);
    println!("Root:     {}", data.dataroot.display());
    println!("Channels: {}", data.channels);
    if let Some(summary) = &data.summary {
        println!("{summary}");
    }

    for (name, loader) in [("train", &mut data.train), ("test", &mut data.test)] {
        info!(
            split = name,
            samples = loader.len(),
            batches = loader.num_batches(),
            "loader ready"
        );
        // pull one batch to surface shape errors early
        let first = loader
            .iter_batches()
            .next()
            .transpose()
            .with_context(|| format!("failed to assemble a {name} batch"))?;
        if let Some(batch) = first {
            println!(
                "{name}: {} samples, {} batches, batch shape {:?}",
                loader.len(),
                loader.num_batches(),
                batch.feature_shape
            );
        } else {
            println!("{name}: {} samples, no full batch", loader.len());
        }
    }

    Ok(())
}
