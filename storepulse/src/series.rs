//! storepulse-series - print one metric as a fixed-length time series
//!
//! Buckets end with the one containing the current instant; empty buckets
//! are reported as zero.

use anyhow::{Context, Result};
use clap::Parser;
use storepulse_core::dashboard::RenderContext;
use storepulse_core::metrics::{build_series, Aggregation, BucketUnit, Predicate, SeriesRequest};
use storepulse_core::{Config, Database, Entity};

#[derive(Parser)]
#[command(name = "storepulse-series")]
#[command(about = "Print a bucketed metric series")]
#[command(version)]
struct Args {
    /// Entity to aggregate: orders, products, customers, reviews, campaigns
    #[arg(short, long, default_value = "orders")]
    entity: String,

    /// count, sum:FIELD or avg:FIELD
    #[arg(short, long, default_value = "count")]
    aggregation: String,

    /// Bucket width: day, week or month
    #[arg(short, long, default_value = "day")]
    unit: String,

    /// Number of buckets (defaults to dashboard.series_lookback)
    #[arg(short, long)]
    lookback: Option<usize>,

    /// Only count rows with this status
    #[arg(short, long)]
    status: Option<String>,

    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        storepulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let entity: Entity = args.entity.parse().map_err(anyhow::Error::msg)?;
    let aggregation: Aggregation = args.aggregation.parse().map_err(anyhow::Error::msg)?;
    let unit: BucketUnit = args.unit.parse().map_err(anyhow::Error::msg)?;
    let lookback = args
        .lookback
        .unwrap_or(config.dashboard.series_lookback as usize);

    let mut request = SeriesRequest::new(entity, aggregation, unit, lookback);
    if let Some(status) = &args.status {
        request = request.filter(Predicate::new().eq("status", status.as_str()));
    }

    let db_path = config.database_path();
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let ctx = RenderContext::now();
    let points = build_series(&db, &request, ctx.now)
        .with_context(|| format!("failed to build {} series over {}", request.aggregation, entity))?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&points)?);
    } else {
        println!(
            "{} of {} per {} ({} buckets)",
            request.aggregation,
            entity,
            unit.as_str(),
            points.len()
        );
        for point in &points {
            println!("  {:<10} {:>12.2}", point.bucket_label, point.value);
        }
    }

    Ok(())
}
