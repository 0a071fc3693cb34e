//! Suitecrawl main entry point
//!
//! This is the command-line interface for the suitecrawl page scraper.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use suitecrawl::config::{load_config_with_hash, Config};
use suitecrawl::{run_crawl, Registry, Suite};

/// Suitecrawl: a suite-driven page scraper
///
/// Scrapes every URL of every configured suite, follows discovered links up
/// to each suite's maximum depth and streams the collected items to the
/// configured writer.
#[derive(Parser, Debug)]
#[command(name = "suitecrawl")]
#[command(version)]
#[command(about = "A suite-driven page scraper", long_about = None)]
struct Cli {
    /// TOML configuration files, merged in order
    #[arg(value_name = "CONFIG", required = true, num_args = 1..)]
    configs: Vec<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show the planned suites without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) =
        load_config_with_hash(&cli.configs).context("Failed to load configuration")?;

    let registry = Registry::default();
    registry
        .validate(&config.run)
        .context("Invalid run configuration")?;

    if cli.dry_run {
        print_dry_run(&config, &config_hash);
        return Ok(());
    }

    registry
        .init_logger(&config.run, suitecrawl::logging::env_filter(cli.verbose, cli.quiet))
        .context("Failed to set up logging")?;

    tracing::info!(
        "Configuration loaded from {} source(s) (hash: {})",
        cli.configs.len(),
        config_hash
    );

    // The manager logs the run summary
    run_crawl(config, &registry).await?;
    Ok(())
}

/// Handles --dry-run: prints the run parameters and the suites that would run
fn print_dry_run(config: &Config, config_hash: &str) {
    let run = &config.run;

    println!("=== Suitecrawl Dry Run ===\n");
    println!("Config hash: {}\n", config_hash);

    println!("Run:");
    println!("  Poll interval: {}ms", run.poll_interval);
    println!("  Poll timeout limit: {}ms", run.poll_timeout_limit);
    println!("  Logger: {}", run.logger);
    println!(
        "  Writer: {} ({})",
        run.writer,
        run.out_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".to_string())
    );
    println!("  Format: {}", run.format);
    match run.batch_size {
        Some(size) => println!("  Batch size: {}", size),
        None => println!("  Batch size: unbounded (single flush)"),
    }

    println!("\nSuites ({}):", config.suites.len());
    for (index, suite_config) in config.suites.iter().enumerate() {
        let suite = Suite::from_config(suite_config, index);
        let depth = suite
            .options
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unbounded".to_string());
        println!(
            "  - {} ({} urls, {} scrapers, max depth {}{})",
            suite.title,
            suite.urls.len(),
            suite.options.scrapers.len(),
            depth,
            if suite.options.more_urls.is_some() {
                ", discovers links"
            } else {
                ""
            }
        );
        for url in &suite.urls {
            println!("    * {}", url);
        }
    }

    println!("\n✓ Configuration is valid");
}
