use analytics::{BenchmarkComparisonResult, BenchmarkRequest, MetricsResult};
use anyhow::Context;
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use configuration::{Config, LogFormat};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// The main entry point for the Meridian performance engine.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; it only carries optional overrides.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = configuration::load_config(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, config).await,
        Commands::Metrics(args) => handle_metrics(args, &config).await,
        Commands::Benchmark(args) => handle_benchmark(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Money-weighted portfolio performance and benchmark comparison.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to ./meridian.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured console log format.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Print portfolio metrics, optionally for a single book.
    Metrics(MetricsArgs),
    /// Compare the portfolio against a benchmark basket described in a JSON file.
    Benchmark(BenchmarkArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides the configured listening port.
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct MetricsArgs {
    /// Restrict the calculation to one book.
    #[arg(long, default_value = "")]
    book: String,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct BenchmarkArgs {
    /// A JSON file in the same shape as the benchmark endpoint's request body.
    #[arg(long)]
    request: PathBuf,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let addr = config.server.socket_addr().ok_or_else(|| {
        anyhow::anyhow!("invalid server address {}:{}", config.server.host, config.server.port)
    })?;

    let state = web_server::build_state(&config)?;
    web_server::run_server(addr, state).await
}

async fn handle_metrics(args: MetricsArgs, config: &Config) -> anyhow::Result<()> {
    let state = web_server::build_state(config)?;
    let metrics = state.metrics.calculate(&args.book).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics.result)?);
    } else {
        println!("{}", metrics_table(&metrics.result));
    }
    Ok(())
}

async fn handle_benchmark(args: BenchmarkArgs, config: &Config) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.request)
        .with_context(|| format!("failed to read {}", args.request.display()))?;
    let request: BenchmarkRequest = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", args.request.display()))?;

    let state = web_server::build_state(config)?;
    let result = state.benchmark.compare(&request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", comparison_table(&result));
    }
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn percent(rate: Decimal) -> String {
    format!("{:.2}%", rate * Decimal::ONE_HUNDRED)
}

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

fn metrics_table(result: &MetricsResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Book",
        "IRR",
        "Price Paid",
        "Market Value",
        "Dividends",
    ]);
    table.add_row(vec![
        result.label.clone().unwrap_or_else(|| "(all)".to_string()),
        percent(result.irr),
        money(result.total_price_paid),
        money(result.market_value),
        money(result.total_dividends),
    ]);
    table
}

fn comparison_table(result: &BenchmarkComparisonResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "",
        "IRR",
        "Price Paid",
        "Market Value",
        "Dividends",
        "Fees",
    ]);
    table.add_row(vec![
        "Portfolio".to_string(),
        percent(result.portfolio.irr),
        money(result.portfolio.total_price_paid),
        money(result.portfolio.market_value),
        money(result.portfolio.total_dividends),
        "-".to_string(),
    ]);
    table.add_row(vec![
        "Benchmark".to_string(),
        percent(result.benchmark.irr),
        money(result.benchmark.price_paid),
        money(result.benchmark.market_value),
        money(result.benchmark.dividends),
        money(result.benchmark.fees),
    ]);
    table.add_row(vec![
        "Difference".to_string(),
        percent(result.irr_difference),
        String::new(),
        String::new(),
        String::new(),
        format!("winner: {:?}", result.winner).to_lowercase(),
    ]);
    table
}
