use super::Host;
use crate::aggregate::Aggregator;
use crate::config::Config;
use crate::github::{Client, discover_repositories, fetch_identity, resolve_token};
use crate::metrics::{YearRange, parse_year, year_ranges};
use crate::misc::ColorMode;
use crate::progress::{ProgressReporter, RequestTracker};
use crate::reports::{RenderedReport, generate_console};
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use core::time::Duration;
use std::io::Write;
use std::path::PathBuf;

/// Log target for the report command
const LOG_TARGET: &str = "report";

/// How long the query phase runs before a progress bar is shown.
const PROGRESS_DELAY: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "contrib-metrics", version, about = "Aggregate your yearly GitHub contribution metrics")]
pub struct ReportArgs {
    /// Years to report on [default: previous and current year]
    #[arg(long = "year", value_name = "YYYY", num_args = 1.., value_parser = parse_year)]
    pub years: Vec<i32>,

    /// Directory receiving `metrics_report.json` and `metrics_report.csv`
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file [default: contrib-metrics.toml in the current directory]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of repositories queried at once
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Access token [default: output of the configured token helper]
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Increase logging verbosity (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl ReportArgs {
    /// The requested years as sorted, deduplicated ranges.
    pub fn year_ranges(&self) -> crate::Result<Vec<YearRange>> {
        if self.years.is_empty() {
            let current = Utc::now().year();
            year_ranges([current - 1, current])
        } else {
            year_ranges(self.years.iter().copied())
        }
    }
}

pub async fn process_report<H: Host>(host: &mut H, args: &ReportArgs) -> Result<()> {
    let ranges = args.year_ranges().context("selecting years")?;

    let cwd = std::env::current_dir().context("determining the current directory")?;
    let mut config = Config::load(&cwd, args.config.as_deref()).context("loading configuration")?;
    if let Some(output_dir) = &args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = usize::from(concurrency);
    }

    let token = resolve_token(args.token.as_deref(), &config)
        .await
        .context("resolving access token")?;

    let progress = ProgressReporter::new(PROGRESS_DELAY);
    progress.set_prefix("Querying");
    let tracker = RequestTracker::new(progress.clone());
    let visibility_guard = progress.start_visibility_checking();

    let client = Client::new(&config, token, Some(tracker.clone())).context("creating API client")?;

    progress.spin("identifying the authenticated user");
    let identity = fetch_identity(&client).await.context("identifying the authenticated user")?;
    writeln!(host.output(), "Authenticated as: {} (ID: {})", identity.login, identity.id)?;

    progress.spin("discovering repositories");
    let repositories = discover_repositories(&client, &config)
        .await
        .context("discovering repositories")?;
    if repositories.is_empty() {
        log::warn!(target: LOG_TARGET, "No repositories found for '{}'", identity.login);
    }
    writeln!(host.output(), "Found {} repositories", repositories.len())?;

    let years = ranges.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ");
    log::info!(target: LOG_TARGET, "Aggregating {} repositories for {years}", repositories.len());

    let aggregator = Aggregator::new(client, identity, ranges);
    let report = aggregator
        .aggregate_all(&repositories, config.concurrency)
        .await
        .context("aggregating contributions")?;

    drop(visibility_guard);
    progress.finish_and_clear();

    let (completed, issued) = tracker.totals();
    log::info!(target: LOG_TARGET, "Completed {completed} of {issued} GraphQL requests");

    write!(host.output(), "{}", generate_console(&report, args.color.enabled()))?;

    let rendered = RenderedReport::new(&report).context("rendering reports")?;
    let paths = rendered
        .write_to(&config.output_dir)
        .with_context(|| format!("writing reports to '{}'", config.output_dir.display()))?;
    for path in paths {
        writeln!(host.output(), "Saved to {}", path.display())?;
    }

    Ok(())
}
