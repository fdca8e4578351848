mod analytics;
mod cache;
mod config;
mod display;
mod error;
mod ingest;
mod throttle;
mod tui;
mod types;

use std::sync::Arc;
use std::time::Duration;

use chrono::FixedOffset;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analytics::AnalyticsOptions;
use crate::cache::RecordCache;
use crate::config::{Config, THROTTLE_MAX_REQUESTS, THROTTLE_WINDOW_SECS, VOLATILE_CACHE_TTL_MINS};
use crate::display::{OutputFormat, ReportSection};
use crate::error::{AppError, Result};
use crate::ingest::{apply_rating_deltas, ApiClient};
use crate::throttle::RequestThrottle;

#[derive(Debug, Parser)]
#[command(
    name = "fatigue",
    about = "Session and fatigue analytics for a player's competitive VALORANT matches"
)]
struct Cli {
    /// Player name (the part before the #)
    name: Option<String>,

    /// Player tag (the part after the #)
    tag: Option<String>,

    /// Platform region (na, eu, ap, kr, ...)
    #[arg(long, default_value = "na")]
    region: String,

    /// Number of recent matches to analyze
    #[arg(long, default_value_t = 50)]
    matches: usize,

    /// Rolling-metric window size
    #[arg(long, default_value_t = 20)]
    window: usize,

    /// Session gap threshold in minutes
    #[arg(long, default_value_t = 45)]
    gap: i64,

    /// Minimum session length for the fatigue decay fit
    #[arg(long, default_value_t = 3)]
    min_session_length: usize,

    /// Hour-of-day bucketing offset from UTC (overrides UTC_OFFSET_HOURS)
    #[arg(long)]
    utc_offset: Option<i32>,

    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Report sections to print (repeatable; defaults to all)
    #[arg(long = "report", value_enum)]
    reports: Vec<ReportSection>,

    /// API key (overrides VALORANT_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Launch the interactive terminal viewer
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(key) = &cli.api_key {
        cfg.api_key = key.clone();
    }
    if let Some(offset) = cli.utc_offset {
        cfg.utc_offset_hours = offset;
    }

    // With no player on the command line, fall through to the search screen.
    let riot_id = cli.name.clone().zip(cli.tag.clone());
    let interactive = cli.interactive || riot_id.is_none();

    // The interactive viewer owns the terminal; log lines would tear it up.
    if !interactive {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(&cfg.log_level))
            .init();
    }

    if let Err(e) = run(cli, cfg, riot_id, interactive).await {
        eprintln!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(
    cli: Cli,
    cfg: Config,
    riot_id: Option<(String, String)>,
    interactive: bool,
) -> Result<()> {
    let hour_offset = FixedOffset::east_opt(cfg.utc_offset_hours * 3600)
        .ok_or_else(|| AppError::Config("UTC offset out of range".to_string()))?;
    let options = AnalyticsOptions {
        window: cli.window,
        session_gap: chrono::Duration::minutes(cli.gap),
        min_session_length: cli.min_session_length,
        hour_offset,
    };

    let throttle = Arc::new(RequestThrottle::new(
        THROTTLE_MAX_REQUESTS,
        Duration::from_secs(THROTTLE_WINDOW_SECS),
    ));
    let cache = RecordCache::new(
        &cfg.cache_dir,
        Duration::from_secs(VOLATILE_CACHE_TTL_MINS * 60),
    )?;
    let client = Arc::new(ApiClient::new(&cfg, throttle, cache)?);

    if interactive {
        let params = tui::FetchParams {
            region: cli.region.clone(),
            match_count: cli.matches,
            options,
        };
        tui::run(client, params, riot_id).await?;
        return Ok(());
    }

    let Some((name, tag)) = riot_id else {
        return Err(AppError::Config("player name and tag are required".to_string()));
    };

    info!("looking up {name}#{tag}");
    let account = client.fetch_account(&name, &tag).await?;

    let progress = |done: usize, total: usize| {
        if done == total || done % 10 == 0 {
            info!("fetched {done}/{total} matches");
        }
    };
    let mut matches = client
        .fetch_matches(
            &cli.region,
            &name,
            &tag,
            &account.puuid,
            cli.matches,
            Some(&progress),
        )
        .await?;

    if matches.is_empty() {
        println!("No competitive matches found for {name}#{tag}.");
        return Ok(());
    }

    match client
        .fetch_rating_history(&cli.region, &name, &tag, &account.puuid)
        .await
    {
        Ok(history) => apply_rating_deltas(&mut matches, &history),
        Err(e) => warn!("rating history unavailable, deltas omitted: {e}"),
    }

    let report = analytics::build_report(account, &matches, &options);

    let sections = if cli.reports.is_empty() {
        vec![ReportSection::All]
    } else {
        cli.reports.clone()
    };
    display::print_report(&report, cli.format, &sections);

    Ok(())
}
