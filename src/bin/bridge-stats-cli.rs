use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use bridge_stats::config::Config;
use bridge_stats::query::{DateRangeParam, Directionality, EventFilter};
use bridge_stats::stats::{StatsClient, StatsSource};
use bridge_stats::timeseries::{cumulative, DateRange, QueryCache, TimeSeriesAggregator};

#[derive(Parser)]
#[command(name = "bridge-stats-cli")]
#[command(about = "Query bridge transaction statistics", long_about = None)]
struct Cli {
    /// Talk to the provider directly with PLAUSIBLE_API_KEY instead of the proxy
    #[arg(long, global = true)]
    direct: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Event name, e.g. swap_standard
    #[arg(long)]
    event: Option<String>,
    /// Network name to filter on
    #[arg(long)]
    network: Option<String>,
    /// Which side of the transfer the network is on (from, to, either)
    #[arg(long, value_parser = parse_direction, default_value = "either")]
    direction: Directionality,
}

impl FilterArgs {
    fn to_filter(&self) -> Option<EventFilter> {
        let event = self.event.as_ref()?;
        let mut filter = EventFilter::new(event.clone());
        if let Some(network) = &self.network {
            filter = filter.with_network(network.clone(), self.direction);
        }
        Some(filter)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print one value per day
    Series {
        /// First day (YYYY-MM-DD), defaults to 30 days ago
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Print running totals instead of daily values
        #[arg(long)]
        cumulative: bool,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print a single aggregate count
    Total {
        /// Provider period keyword, e.g. 30d, 7d, day
        #[arg(long, default_value = "30d")]
        period: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn parse_direction(raw: &str) -> Result<Directionality, String> {
    match raw.to_lowercase().as_str() {
        "from" => Ok(Directionality::From),
        "to" => Ok(Directionality::To),
        "either" => Ok(Directionality::Either),
        other => Err(format!("unknown direction '{other}' (expected from, to or either)")),
    }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let client = if cli.direct {
        let Some(api_key) = config.plausible.api_key.clone() else {
            bail!("--direct requires PLAUSIBLE_API_KEY to be set");
        };
        StatsClient::new(
            config.plausible.upstream_url.clone(),
            Some(api_key),
            config.plausible.timeout_secs.map(Duration::from_secs),
        )?
    } else {
        StatsClient::new(
            config.proxy_url.clone(),
            None,
            config.plausible.timeout_secs.map(Duration::from_secs),
        )?
    };

    let source: Arc<dyn StatsSource> = Arc::new(client);
    let cache = Arc::new(QueryCache::new(source, &config.cache));
    let aggregator = TimeSeriesAggregator::new(config.plausible.site_id.clone(), cache);

    match cli.command {
        Commands::Series {
            start,
            end,
            cumulative: running,
            filter,
        } => {
            let today = Utc::now().date_naive();
            let range = match (start, end) {
                (Some(start), Some(end)) => DateRange::new(start, end)?,
                (Some(start), None) => DateRange::new(start, today.max(start))?,
                (None, Some(end)) => DateRange::last_days(30, end),
                (None, None) => DateRange::last_days(30, today),
            };

            let state = aggregator.fetch_series(&range, filter.to_filter().as_ref()).await;
            if let Some(error) = &state.error {
                eprintln!("⚠ Some days failed and are shown as 0: {}", error.message);
            }

            let points = if running {
                cumulative(state.points())
            } else {
                state.points().to_vec()
            };

            println!("{:<10} {}", "Date", if running { "Total" } else { "Events" });
            println!("{}", "-".repeat(24));
            for point in points {
                println!("{:<10} {}", point.date, format_value(point.value));
            }
        }
        Commands::Total { period, filter } => {
            let value = aggregator
                .fetch_total(DateRangeParam::Period(period.clone()), filter.to_filter().as_ref())
                .await
                .with_context(|| format!("failed to fetch aggregate for period {period}"))?;

            match value {
                Some(value) => println!("{}", format_value(value)),
                None => println!("No data for period {period}"),
            }
        }
    }

    Ok(())
}
