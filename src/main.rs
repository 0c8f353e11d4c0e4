use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use eyre::Result;
use itertools::Itertools;
use log::{info, warn};
use nangle::arb::opportunity::Opportunity;
use nangle::arb::orchestrator::Orchestrator;
use nangle::arb::registry::VenueRegistry;
use nangle::arb::strategy::{ConstantProductStrategy, ExtremumStrategy, FixedAmountStrategy, Strategy};
use nangle::arb::venue::VenueId;
use nangle::config::Config;
use nangle::provider::{SnapshotProvider, StateBatch, VenueDiscovery, VenueStateProvider};
use nangle::utils::logger::setup_logger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Strategies to run; fixed-amount needs NANGLE_FIXED_AMOUNTS
    #[arg(long, value_enum, value_delimiter = ',', default_value = "extremum")]
    strategies: Vec<StrategyArg>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every cycle once against the snapshot
    Scan {
        /// Snapshot file, overrides NANGLE_SNAPSHOT
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Print opportunities as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Poll the snapshot and evaluate the cycles touched by each change
    Watch {
        /// Snapshot file, overrides NANGLE_SNAPSHOT
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Poll interval, overrides NANGLE_POLL_INTERVAL_MS
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Print how many cycles each strategy watches
    Cycles {
        /// Snapshot file, overrides NANGLE_SNAPSHOT
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
enum StrategyArg {
    /// Profit curve extremum on every cycle
    Extremum,
    /// Closed form on constant-product cycles
    ConstantProduct,
    /// Configured start amounts on cycles with a concentrated venue
    FixedAmount,
}

fn strategies(config: &Config, selected: &[StrategyArg]) -> Vec<Box<dyn Strategy>> {
    selected
        .iter()
        .unique()
        .filter_map(|strategy| -> Option<Box<dyn Strategy>> {
            match strategy {
                StrategyArg::Extremum => Some(Box::new(ExtremumStrategy)),
                StrategyArg::ConstantProduct => Some(Box::new(ConstantProductStrategy)),
                StrategyArg::FixedAmount if config.fixed_amounts.is_empty() => {
                    warn!("fixed-amount strategy skipped, NANGLE_FIXED_AMOUNTS is empty");
                    None
                }
                StrategyArg::FixedAmount => {
                    Some(Box::new(FixedAmountStrategy::new(config.fixed_amounts.clone())))
                }
            }
        })
        .collect()
}

fn build(config: &Config, selected: &[StrategyArg], provider: &mut SnapshotProvider) -> Result<Orchestrator> {
    let mut registry = VenueRegistry::with_blacklist(config.blacklist.clone());
    let ids = registry.extend(provider.discover()?);
    info!("Loaded {} venues from {}", ids.len(), provider.path().display());

    let mut orchestrator = Orchestrator::new(
        registry,
        config.start_tokens.clone(),
        config.hop_counts.clone(),
        config.min_profit,
    )?;
    for strategy in strategies(config, selected) {
        orchestrator.register(strategy)?;
    }
    Ok(orchestrator)
}

/// Applies a polled batch, returning the venues that changed. Refused updates
/// are re-offered on the next poll.
fn apply(orchestrator: &mut Orchestrator, provider: &mut SnapshotProvider, batch: StateBatch) -> Vec<VenueId> {
    let applied = orchestrator.apply_updates(batch.updates);
    provider.forget(applied.rejected.iter().map(|(address, _)| address));
    applied.changed
}

fn report(opportunities: &[Opportunity], json: bool) -> Result<()> {
    for opportunity in opportunities {
        if json {
            println!("{}", serde_json::to_string(opportunity)?);
        } else {
            info!("{opportunity}");
        }
    }
    Ok(())
}

fn scan(config: &Config, selected: &[StrategyArg], json: bool) -> Result<()> {
    let mut provider = SnapshotProvider::new(&config.snapshot);
    let mut orchestrator = build(config, selected, &mut provider)?;
    let batch = provider.poll()?;
    let block_number = batch.block_number;
    apply(&mut orchestrator, &mut provider, batch);
    report(&orchestrator.evaluate_all(block_number), json)
}

fn cycles(config: &Config, selected: &[StrategyArg]) -> Result<()> {
    let mut provider = SnapshotProvider::new(&config.snapshot);
    let orchestrator = build(config, selected, &mut provider)?;
    let counts = orchestrator
        .cycles()
        .counts_by(|(strategy, cycle)| (strategy.kind().to_string(), cycle.len()));
    for ((kind, hops), count) in counts.into_iter().sorted_unstable() {
        println!("{kind} N={hops}: {count}");
    }
    println!("total: {}", orchestrator.cycle_count());
    Ok(())
}

async fn watch(config: &Config, selected: &[StrategyArg], interval: Duration) -> Result<()> {
    let mut provider = SnapshotProvider::new(&config.snapshot);
    let mut orchestrator = build(config, selected, &mut provider)?;
    let batch = provider.poll()?;
    let block_number = batch.block_number;
    apply(&mut orchestrator, &mut provider, batch);
    report(&orchestrator.evaluate_all(block_number), false)?;

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut changed = orchestrator.on_venues_discovered(provider.discover()?)?;
                let batch = provider.poll()?;
                let block_number = batch.block_number;
                changed.extend(apply(&mut orchestrator, &mut provider, batch));
                if changed.is_empty() {
                    continue;
                }
                report(&orchestrator.on_venues_changed(&changed, block_number), false)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping");
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logger()?;

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    match cli.command {
        Commands::Scan { snapshot, json } => {
            config.snapshot = snapshot.unwrap_or(config.snapshot);
            scan(&config, &cli.strategies, json)?;
        }
        Commands::Watch {
            snapshot,
            interval_ms,
        } => {
            config.snapshot = snapshot.unwrap_or(config.snapshot);
            let interval = interval_ms.map_or(config.poll_interval, Duration::from_millis);
            watch(&config, &cli.strategies, interval).await?;
        }
        Commands::Cycles { snapshot } => {
            config.snapshot = snapshot.unwrap_or(config.snapshot);
            cycles(&config, &cli.strategies)?;
        }
    }

    Ok(())
}
