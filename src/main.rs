use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tributary::app::AppContext;
use tributary::cli::{Cli, Commands};
use tributary::config::Config;
use tributary::sync::{sweep, Scheduler, SyncOutcome};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(&config)?;

    match cli.command {
        Commands::Serve => {
            let scheduler = Scheduler::new(
                ctx.sync.clone(),
                ctx.store.clone(),
                config.interval_duration()?,
                config.sync.delete_after,
            );
            info!(
                interval = %config.sync.interval,
                delete_after = config.sync.delete_after,
                "starting scheduler"
            );
            let handle = scheduler.start();
            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            handle.stop().await;
        }
        Commands::Update => {
            let mut new_entries = 0usize;
            let mut failed = 0usize;
            for (feed_id, result) in ctx.sync.sync_all().await {
                match result {
                    Ok(SyncOutcome::Synced(count)) => new_entries += count,
                    Ok(SyncOutcome::Skipped) => {}
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(feed_id, error = %e, "feed sync failed");
                    }
                }
            }
            println!("{} new entries, {} feeds failed", new_entries, failed);
        }
        Commands::Sweep => {
            let deleted = sweep(
                ctx.store.as_ref(),
                chrono::Utc::now(),
                config.sync.delete_after,
            )?;
            println!("{} entries removed", deleted);
        }
    }

    Ok(())
}
