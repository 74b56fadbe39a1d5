//! CLI entry point for the run-club announcer.
//!
//! Provides subcommands for previewing the weekly route schedule and for
//! composing the announcement text (email, WhatsApp, Facebook) for a chosen
//! run date, enriched with Strava route summaries where possible.

use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use run_announcer::compose::{Channel, compose};
use run_announcer::config::Config;
use run_announcer::schedule::{self, ScheduleCache, ScheduleRow};
use run_announcer::strava::{self, AccessToken};
use run_announcer::summary::RouteSummary;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "run_announcer")]
#[command(about = "Compose run-club announcements from the route schedule", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preview the weekly route schedule
    Schedule {
        /// Path to the schedule file (.csv, .xlsx or .xls)
        #[arg(short, long, default_value = "route_schedule.xlsx")]
        file: PathBuf,

        /// Print the rows as pretty JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Compose the announcement for a run date
    Announce {
        /// Path to the schedule file (.csv, .xlsx or .xls)
        #[arg(short, long, default_value = "route_schedule.xlsx")]
        file: PathBuf,

        /// Run date to announce (YYYY-MM-DD); prompts interactively when omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Also write the announcement text to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/run_announcer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("run_announcer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schedule { file, json } => {
            let mut cache = ScheduleCache::new();
            let rows = cache
                .load(&file)
                .with_context(|| format!("Failed to load schedule {}", file.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&*rows)?);
            } else {
                print_schedule(&rows);
            }
        }
        Commands::Announce { file, date, output } => {
            announce(&file, date, output.as_deref()).await?;
        }
    }

    Ok(())
}

/// Runs the full announcement flow for one session.
///
/// Fatal: missing credentials or an unloadable schedule. Everything else
/// degrades: a failed token refresh skips route enrichment, and a failed
/// route download empties only that route's description.
async fn announce(file: &Path, date: Option<NaiveDate>, output: Option<&Path>) -> Result<()> {
    let config = Config::from_env().context("Strava credentials are not configured")?;

    let mut cache = ScheduleCache::new();
    let rows = cache
        .load(file)
        .with_context(|| format!("Failed to load schedule {}", file.display()))?;
    if rows.is_empty() {
        anyhow::bail!("Schedule {} has no rows", file.display());
    }

    print_schedule(&rows);

    let token = match strava::refresh_access_token(&config).await {
        Ok(token) => {
            info!("Strava token acquired");
            Some(token)
        }
        Err(e) => {
            warn!(error = %e, "Could not acquire Strava token; route descriptions will be skipped");
            None
        }
    };

    let selected = match date {
        Some(date) => date,
        None => pick_date(&rows)?,
    };
    let row = rows
        .iter()
        .find(|row| row.date == selected)
        .with_context(|| format!("No schedule row for {selected}"))?;

    let desc_8k = route_description(row.link_8k.as_deref(), token.as_ref(), "8k").await;
    let desc_5k = route_description(row.link_5k.as_deref(), token.as_ref(), "5k").await;

    let message = compose(row, &desc_8k, &desc_5k);

    for channel in Channel::ALL {
        println!("\n{}", channel.heading());
        println!("{}", "-".repeat(40));
        println!("{message}");
    }

    if let Some(path) = output {
        std::fs::write(path, &message)
            .with_context(|| format!("Failed to write announcement to {}", path.display()))?;
        info!(path = %path.display(), "Announcement written");
    }

    Ok(())
}

/// Fetches and summarizes one route, reducing every failure to an empty
/// description so the announcement still renders.
async fn route_description(
    link: Option<&str>,
    token: Option<&AccessToken>,
    label: &str,
) -> String {
    let (Some(link), Some(token)) = (link, token) else {
        return String::new();
    };

    match strava::download_route(link, token).await {
        Ok(doc) => RouteSummary::from_document(&doc).render(),
        Err(e) => {
            warn!(route = label, error = %e, "Route enrichment skipped");
            String::new()
        }
    }
}

fn print_schedule(rows: &[ScheduleRow]) {
    println!("\n📅 Schedule");
    println!(
        "{:<6} {:<12} {:<26} {:<26} {:<26}",
        "Week", "Date", "Meeting point", "8k Route", "5k Route"
    );
    for row in rows {
        println!(
            "{:<6} {:<12} {:<26} {:<26} {:<26}",
            row.week,
            row.date.to_string(),
            row.meeting_point,
            row.route_8k,
            row.route_5k
        );
    }
}

/// Interactive date picker. Defaults to the nearest upcoming run date; an
/// empty line accepts the default, a number picks a row, and a date literal
/// picks by value.
fn pick_date(rows: &[ScheduleRow]) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    let default = schedule::next_run_date(rows, today).context("Schedule has no dates")?;

    println!("\nChoose run date:");
    for (i, row) in rows.iter().enumerate() {
        let marker = if row.date == default { "*" } else { " " };
        println!("{marker} [{}] {}  {}", i + 1, row.date, row.meeting_point);
    }
    print!("Run date [{default}]: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        return Ok(default);
    }
    if let Ok(index) = input.parse::<usize>() {
        if (1..=rows.len()).contains(&index) {
            return Ok(rows[index - 1].date);
        }
        anyhow::bail!("Selection {index} is out of range");
    }
    input
        .parse::<NaiveDate>()
        .with_context(|| format!("Unrecognized selection {input:?}"))
}
