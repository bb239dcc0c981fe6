use analytics::AnalyticsReport;
use analyzer::{ReportAnalyzer, ReportRequest};
use anyhow::Context;
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{CancelledOrderPolicy, Config, LoggingConfig};
use core_types::OrderStatus;
use database::{connect, run_migrations, DbRepository, InMemoryOrderStore, OrderStore};
use lifecycle::OrderStateMachine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;
use web_server::AppState;

mod demo;

/// The main entry point for the canteen order service.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; DATABASE_URL may come from the environment.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref())?;
    if let Some(policy) = cli.cancelled {
        config.analytics.cancelled_orders = policy;
    }
    let _log_guard = init_tracing(&config.logging);

    let store = open_store(cli.demo, &config).await?;

    match cli.command {
        Commands::Serve(args) => handle_serve(args, store, &config).await,
        Commands::Report(args) => handle_report(args, store, &config).await,
        Commands::Transition(args) => handle_transition(args, store).await,
        Commands::Stats(args) => handle_stats(args, store, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Order lifecycle and sales analytics for a campus canteen.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file. Defaults to ./config.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use an in-memory store seeded with sample orders instead of PostgreSQL.
    #[arg(long, global = true)]
    demo: bool,

    /// Overrides `analytics.cancelled_orders` from the configuration.
    #[arg(long, global = true, value_enum)]
    cancelled: Option<CancelledOrderPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and WebSocket server.
    Serve(ServeArgs),
    /// Print the analytics report for a date range.
    Report(ReportArgs),
    /// Move an order to a new status.
    Transition(TransitionArgs),
    /// Print the admin dashboard figures for one day.
    Stats(StatsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Address to bind. Defaults to `server.listen_addr`.
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct ReportArgs {
    /// First day of the report (format: YYYY-MM-DD).
    #[arg(long)]
    from: NaiveDate,

    /// Last day of the report, inclusive (format: YYYY-MM-DD).
    #[arg(long)]
    to: NaiveDate,

    /// Time-series bucket width: "hour", "day" or "month".
    #[arg(long, default_value = "day")]
    group_by: String,

    /// Print the report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct TransitionArgs {
    #[arg(long)]
    order_id: Uuid,

    /// Target status, e.g. "in_preparation" or "ready".
    #[arg(long)]
    status: OrderStatus,
}

#[derive(Parser)]
struct StatsArgs {
    /// Day to report on (format: YYYY-MM-DD). Defaults to today (UTC).
    #[arg(long)]
    date: Option<NaiveDate>,
}

// ==============================================================================
// Setup
// ==============================================================================

/// Installs the global subscriber. `RUST_LOG` wins over `logging.level`.
///
/// The returned guard flushes the file writer on drop and must be held until exit.
fn init_tracing(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer());

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}

async fn open_store(demo: bool, config: &Config) -> anyhow::Result<Arc<dyn OrderStore>> {
    if demo {
        let orders = demo::seed_orders(Utc::now())?;
        tracing::info!(orders = orders.len(), "Using the in-memory demo store.");
        return Ok(Arc::new(InMemoryOrderStore::with_orders(orders)));
    }

    let pool = connect(&config.database)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(Arc::new(DbRepository::new(pool)))
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(
    args: ServeArgs,
    store: Arc<dyn OrderStore>,
    config: &Config,
) -> anyhow::Result<()> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => config
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid server.listen_addr '{}'", config.server.listen_addr))?,
    };
    web_server::run_server(addr, AppState::new(store, config)).await
}

async fn handle_report(
    args: ReportArgs,
    store: Arc<dyn OrderStore>,
    config: &Config,
) -> anyhow::Result<()> {
    let end_date = args
        .to
        .succ_opt()
        .context("--to is at the end of the supported calendar")?;
    let request = ReportRequest {
        start: args.from.and_time(NaiveTime::MIN).and_utc(),
        end: end_date.and_time(NaiveTime::MIN).and_utc(),
        granularity: Some(args.group_by),
    };

    let analyzer = ReportAnalyzer::new(config.analytics.clone());
    let report = analyzer.run(store.as_ref(), &request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn handle_transition(args: TransitionArgs, store: Arc<dyn OrderStore>) -> anyhow::Result<()> {
    let machine = OrderStateMachine::new(store);
    let outcome = machine.attempt_transition(args.order_id, args.status).await?;

    println!(
        "Order {} moved from {} to {}.",
        outcome.order.order_id, outcome.previous_status, outcome.order.status
    );
    Ok(())
}

async fn handle_stats(
    args: StatsArgs,
    store: Arc<dyn OrderStore>,
    config: &Config,
) -> anyhow::Result<()> {
    let date = args.date.unwrap_or_else(|| Utc::now().date_naive());
    let analyzer = ReportAnalyzer::new(config.analytics.clone());
    let stats = analyzer.daily_stats(store.as_ref(), date).await?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Date".to_string(), stats.date.to_string()]);
    table.add_row(vec!["Orders".to_string(), stats.orders_today.to_string()]);
    table.add_row(vec!["Revenue".to_string(), stats.revenue_today.to_string()]);
    table.add_row(vec!["Pending".to_string(), stats.pending_orders.to_string()]);
    table.add_row(vec!["In preparation".to_string(), stats.in_preparation_orders.to_string()]);
    table.add_row(vec!["Ready".to_string(), stats.ready_orders.to_string()]);
    println!("{table}");
    Ok(())
}

// ==============================================================================
// Report Rendering
// ==============================================================================

fn print_report(report: &AnalyticsReport) {
    println!(
        "\nAnalytics from {} to {} (by {})",
        report.period.start, report.period.end, report.granularity
    );

    let summary = &report.summary;
    let performance = &report.performance;
    let customers = &report.customers;
    let change = summary
        .change_vs_previous
        .map(|c| format!("{c}%"))
        .unwrap_or_else(|| "n/a".to_string());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    let rows = [
        ("Total orders", summary.total_orders.to_string()),
        ("Total revenue", summary.total_revenue.to_string()),
        ("Average order value", summary.avg_order_value.to_string()),
        ("Items sold", summary.total_items_sold.to_string()),
        ("Previous period orders", summary.previous_period_orders.to_string()),
        ("Change vs previous", change),
        (
            "Peak hour",
            performance
                .peak_hour
                .map(|h| format!("{h:02}:00 ({} orders)", performance.peak_hour_orders))
                .unwrap_or_else(|| "-".to_string()),
        ),
        (
            "Best day",
            performance
                .best_day_of_week
                .clone()
                .map(|d| format!("{d} ({} orders)", performance.best_day_avg_orders))
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Completion rate", format!("{}%", performance.completion_rate)),
        ("Unique customers", customers.unique_customers.to_string()),
        ("Returning customers", customers.returning_customers.to_string()),
        ("New customers", format!("{} ({}%)", customers.new_customers, customers.new_customer_percentage)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    println!("{table}");

    let mut series = Table::new();
    series.load_preset(UTF8_FULL).set_header(vec!["Bucket", "Orders", "Revenue"]);
    for bucket in &report.time_series {
        series.add_row(vec![
            bucket.label.clone(),
            bucket.order_count.to_string(),
            bucket.revenue.to_string(),
        ]);
    }
    println!("{series}");

    if !report.revenue.top_items_by_revenue.is_empty() {
        let mut items = Table::new();
        items.load_preset(UTF8_FULL).set_header(vec!["Top item", "Quantity", "Revenue"]);
        for item in &report.revenue.top_items_by_revenue {
            items.add_row(vec![item.name.clone(), item.quantity.to_string(), item.revenue.to_string()]);
        }
        println!("{items}");
    }

    if !report.revenue.category_breakdown.is_empty() {
        let mut categories = Table::new();
        categories.load_preset(UTF8_FULL).set_header(vec!["Category", "Revenue", "Share"]);
        for category in &report.revenue.category_breakdown {
            categories.add_row(vec![
                category.category.clone(),
                category.revenue.to_string(),
                format!("{}%", category.percentage),
            ]);
        }
        println!("{categories}");
    }
}
