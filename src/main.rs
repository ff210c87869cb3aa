//! afflict_sim - run a status effect simulation

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use afflict::{Config, EffectStore, WorldReport};

/// Status effect simulation runner
#[derive(Parser, Debug)]
#[command(
    name = "afflict_sim",
    version,
    about = "Simulate status effects spreading through a group of entities"
)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks to run (overrides config)
    #[arg(short, long)]
    ticks: Option<u64>,

    /// RNG seed (overrides config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// SQLite file to save final entity state into (overrides config)
    #[arg(short, long)]
    database: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "afflict=info".into()),
        )
        .with(args.json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.json).then(tracing_subscriber::fmt::layer))
        .init();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(ticks) = args.ticks {
        config.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.database.is_some() {
        config.db_path = args.database;
    }

    let registry = config.build_registry()?;
    let mut world = config.build_world(registry);
    info!(
        "Simulating {} entities for {} ticks of {}s",
        world.len(),
        config.ticks,
        config.tick_seconds
    );

    let mut totals = WorldReport::default();
    for _ in 0..config.ticks {
        let report = world.tick(config.tick_seconds);
        debug!("t={:.1} {:?}", world.time(), report);
        totals.intervals += report.intervals;
        totals.expired += report.expired;
        totals.added += report.added;
        totals.infections += report.infections;
        totals.deaths.extend(report.deaths);
    }

    info!(
        "Finished at t={:.1}: {} intervals, {} added, {} expired, {} infections, {} deaths",
        world.time(),
        totals.intervals,
        totals.added,
        totals.expired,
        totals.infections,
        totals.deaths.len()
    );
    for entity in world.entities() {
        let effects: Vec<String> = entity
            .effects
            .effects()
            .iter()
            .map(|e| format!("{} ({})", e.display_name(), e.description()))
            .collect();
        info!(
            "{} health={:.1} alive={} effects=[{}]",
            entity.id(),
            entity.effects.health(),
            entity.is_alive(),
            effects.join(", ")
        );
    }

    if let Some(path) = config.db_path.as_deref() {
        let store = EffectStore::open(Some(path)).await?;
        for entity in world.entities() {
            store
                .save_entity(&entity.id().to_string(), &entity.effects.to_tree())
                .await?;
        }
        info!("Saved {} entities to {}", world.len(), path);
    }

    Ok(())
}
