//! storepulse - render the back-office dashboard from the shop database
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/storepulse/data.db (~/.local/share/storepulse/data.db)
//! - Logs: $XDG_STATE_HOME/storepulse/storepulse.log (~/.local/state/storepulse/storepulse.log)
//! - Config: $XDG_CONFIG_HOME/storepulse/config.toml (~/.config/storepulse/config.toml)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use storepulse_core::dashboard::{
    default_catalog, ChartPayload, Dashboard, DashboardReport, RenderContext, WidgetOutput,
};
use storepulse_core::metrics::PresentationCard;
use storepulse_core::{Config, DataStore, Database};

#[derive(Parser)]
#[command(name = "storepulse")]
#[command(about = "Render the store dashboard")]
#[command(version)]
struct Args {
    /// Output format: text (default) or json
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Only render these widgets (repeatable)
    #[arg(short, long = "widget", value_name = "KEY")]
    widgets: Vec<String>,

    /// Render widgets in parallel
    #[arg(long)]
    concurrent: bool,

    /// List widget keys and exit
    #[arg(long)]
    list_widgets: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        storepulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("storepulse starting");

    let catalog = default_catalog(&config.dashboard).context("invalid dashboard configuration")?;
    let mut dashboard = Dashboard::new(catalog);

    if args.list_widgets {
        for widget in dashboard.widgets() {
            println!("{:<24} {}", widget.key, widget.label);
        }
        return Ok(());
    }

    if !args.widgets.is_empty() {
        for key in &args.widgets {
            if !dashboard.widgets().iter().any(|w| &w.key == key) {
                anyhow::bail!("unknown or disabled widget '{}' (see --list-widgets)", key);
            }
        }
        dashboard = dashboard.only(&args.widgets);
    }

    let db_path = config.database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let ctx = RenderContext::now();
    let report = if args.concurrent {
        let store: Arc<dyn DataStore> = Arc::new(db);
        dashboard
            .render_concurrent(store, &ctx)
            .context("failed to render dashboard")?
    } else {
        dashboard.render(&db, &ctx)
    };

    if args.format == "json" {
        println!("{}", report.to_json().context("failed to encode report")?);
    } else {
        print_text_report(&report);
    }

    Ok(())
}

fn print_text_report(report: &DashboardReport) {
    println!(
        "Dashboard at {}",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!();

    for widget in &report.widgets {
        match &widget.output {
            Some(WidgetOutput::Card(card)) => print_card(card),
            Some(WidgetOutput::Chart(chart)) => print_chart(&widget.label, chart),
            None => println!("{:<24} [{}]", widget.label, widget.status.as_str()),
        }
        if let Some(error) = &widget.error {
            println!("{:<24} {}", "", error);
        }
    }

    let problems = report.problem_count();
    if problems > 0 {
        println!();
        println!("{} widget(s) could not be rendered normally", problems);
    }
}

fn print_card(card: &PresentationCard) {
    println!(
        "{:<24} {:>14}  {:<32} [{}]",
        card.label,
        card.formatted_value,
        card.description.as_deref().unwrap_or(""),
        card.color_tier.as_str()
    );
}

fn print_chart(label: &str, chart: &ChartPayload) {
    println!();
    println!("{}", label);
    let header: Vec<String> = chart
        .datasets
        .iter()
        .map(|d| format!("{:>12}", d.label))
        .collect();
    println!("  {:<10} {}", "", header.join(" "));
    for (i, bucket) in chart.labels.iter().enumerate() {
        let row: Vec<String> = chart
            .datasets
            .iter()
            .map(|d| format!("{:>12.2}", d.data.get(i).copied().unwrap_or(0.0)))
            .collect();
        println!("  {:<10} {}", bucket, row.join(" "));
    }
    println!();
}
