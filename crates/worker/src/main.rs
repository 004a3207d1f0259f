use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mockbq_core::config::Settings;
use mockbq_core::domain::tag::TagCatalog;
use mockbq_core::storage;

mod dump;
mod seed;

#[derive(Debug, Parser)]
#[command(name = "mockbq_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Insert sample data extractions and trade ideas.
    Seed {
        /// Skip seeding when the database already has extractions.
        #[arg(long)]
        if_empty: bool,

        /// Validate the sample rows without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Replace the tag catalog with the contents of a JSON file.
    LoadTags {
        #[arg(long, default_value = "mock_data/tags/tags.json")]
        file: PathBuf,
    },

    /// Rebuild the denormalized research_extractions table.
    RebuildWarehouse,

    /// Export every extraction with its trade ideas to a JSON file.
    Dump {
        #[arg(long, default_value = "mock_data/extractions.json")]
        out: PathBuf,
    },

    /// Delete all rows from every table.
    Clean,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, args.command).await {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "worker command failed");
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &Settings, command: Command) -> anyhow::Result<()> {
    if let Command::Seed { dry_run: true, .. } = command {
        let samples = seed::validate_rows(seed::sample_rows()?)?;
        let trade_ideas: usize = samples.iter().map(|s| s.trade_ideas.len()).sum();
        tracing::info!(
            dry_run = true,
            extractions = samples.len(),
            trade_ideas,
            "seed rows validated"
        );
        return Ok(());
    }

    let pool = storage::connect(&settings.database_url).await?;
    storage::migrate(&pool).await?;

    match command {
        Command::Seed { if_empty, .. } => {
            let existing = storage::extractions::count(&pool).await?;
            if if_empty && existing > 0 {
                tracing::warn!(existing, "database already has extractions; skipping seed");
                return Ok(());
            }
            let outcome = seed::seed(&pool, seed::sample_rows()?).await?;
            tracing::info!(
                extractions = outcome.extractions,
                trade_ideas = outcome.trade_ideas,
                "sample data seeded"
            );
        }
        Command::LoadTags { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("read tag catalog {} failed", file.display()))?;
            let catalog: TagCatalog = serde_json::from_str(&raw)
                .with_context(|| format!("tag catalog {} is not valid JSON", file.display()))?;
            let report = storage::tags::load_catalog(&pool, &catalog).await?;
            tracing::info!(
                file = %file.display(),
                inserted = report.inserted,
                replaced = report.replaced,
                skipped = report.skipped.len(),
                "tag catalog replaced"
            );
        }
        Command::RebuildWarehouse => {
            let rows = storage::warehouse::rebuild(&pool).await?;
            tracing::info!(rows, "warehouse rebuilt");
        }
        Command::Dump { out } => {
            let total = dump::dump_to_file(&pool, &out).await?;
            tracing::info!(out = %out.display(), total, "dump written");
        }
        Command::Clean => {
            let report = storage::maintenance::purge(&pool).await?;
            tracing::info!(?report, "database cleaned");
        }
    }

    pool.close().await;
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
