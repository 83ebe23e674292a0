//! tickerstat CLI: fetch, summarize, persist and inspect market series.
//!
//! Commands:
//! - `run`: fetch both sources, summarize, classify, initialize tables if missing
//! - `fetch`: fetch and summarize only, no database access
//! - `show`: print stored rows, optionally filtered by ticker and metric
//! - `delete`: delete stored rows for a ticker (and metric)
//! - `drop-table` / `drop-database`: destructive, dry run unless `--confirm` names the target

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tickerstat_core::data::{fetch, ReqwestTransport};
use tickerstat_core::TickerSummary;
use tickerstat_runner::{
    AppConfig, Commander, Confirmation, ConnectionStatus, InitReport, RowFilter, SqliteGateway,
    Status, Store, StoredRow, TableInit,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "tickerstat",
    version,
    about = "tickerstat: market series summaries in SQLite"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch both sources, summarize, classify and persist.
    Run {
        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the summaries and init report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch and summarize both sources without touching the database.
    Fetch {
        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the summaries as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print stored rows.
    Show {
        /// Table name (stocks, crypto).
        table: String,

        #[arg(long)]
        ticker: Option<String>,

        #[arg(long)]
        metric: Option<String>,

        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete stored rows for a ticker.
    Delete {
        table: String,

        #[arg(long)]
        ticker: String,

        #[arg(long)]
        metric: Option<String>,

        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Drop a table. Without `--confirm TABLE` only reports what would happen.
    DropTable {
        table: String,

        #[arg(long)]
        confirm: Option<String>,

        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Drop the whole database. Without `--confirm NAME` only reports what would happen.
    DropDatabase {
        /// Database name (file stem of the configured path).
        #[arg(long)]
        confirm: Option<String>,

        /// Path to a TOML settings file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, json } => run_pipeline(&load_config(config)?, json),
        Commands::Fetch { config, json } => run_fetch(&load_config(config)?, json),
        Commands::Show {
            table,
            ticker,
            metric,
            config,
            json,
        } => run_show(&load_config(config)?, &table, RowFilter { ticker, metric }, json),
        Commands::Delete {
            table,
            ticker,
            metric,
            config,
        } => run_delete(
            &load_config(config)?,
            &table,
            RowFilter {
                ticker: Some(ticker),
                metric,
            },
        ),
        Commands::DropTable {
            table,
            confirm,
            config,
        } => {
            let confirmation = confirm.map_or(Confirmation::DryRun, Confirmation::Table);
            run_drop_table(&load_config(config)?, &table, &confirmation)
        }
        Commands::DropDatabase { confirm, config } => {
            let confirmation = confirm.map_or(Confirmation::DryRun, Confirmation::Database);
            run_drop_database(&load_config(config)?, &confirmation)
        }
    }
}

/// Logs go to stderr so `--json` output stays clean. `RUST_LOG` overrides the default.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig> {
    let config = AppConfig::load(path.as_deref()).context("configuration")?;
    info!(database = %config.settings.database.path, "configuration loaded");
    Ok(config)
}

/// Open an existing database without fetching. Only `run` creates one.
fn open_commander(config: &AppConfig) -> Result<Commander> {
    let gateway = SqliteGateway::connect_existing(&config.gateway_config());
    if gateway.status() == ConnectionStatus::Inactive {
        bail!(
            "database '{}' not found or could not be opened; `run` creates it",
            config.settings.database.path
        );
    }
    Ok(Commander::from_parts(gateway, None, None))
}

#[derive(Serialize)]
struct RunOutput<'a> {
    stocks: Option<&'a TickerSummary>,
    crypto: Option<&'a TickerSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init: Option<&'a InitReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rows: Vec<(&'static str, usize)>,
}

fn run_pipeline(config: &AppConfig, json: bool) -> Result<()> {
    let transport = ReqwestTransport::new()?;
    let mut commander = Commander::connect(config, &transport);
    let report = commander.init_tables();
    let rows = commander.row_counts();

    if json {
        let output = RunOutput {
            stocks: commander.stock_data(),
            crypto: commander.crypto_data(),
            init: Some(&report),
            rows,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary("Stocks", commander.stock_data());
        print_summary("Crypto", commander.crypto_data());
        print_init_report(&report, &rows);
    }

    commander.close();
    if report
        .tables
        .iter()
        .any(|(_, init)| *init == TableInit::CreateFailed)
    {
        bail!("table initialization failed; see log for details");
    }
    Ok(())
}

fn run_fetch(config: &AppConfig, json: bool) -> Result<()> {
    let transport = ReqwestTransport::new()?;
    let stocks = fetch(&transport, &config.stock_source());
    let crypto = fetch(&transport, &config.crypto_source());

    if json {
        let output = RunOutput {
            stocks: stocks.as_ref(),
            crypto: crypto.as_ref(),
            init: None,
            rows: Vec::new(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_summary("Stocks", stocks.as_ref());
        print_summary("Crypto", crypto.as_ref());
    }
    Ok(())
}

fn run_show(config: &AppConfig, table: &str, filter: RowFilter, json: bool) -> Result<()> {
    let mut commander = open_commander(config)?;
    let rows = match filter.condition() {
        Some((condition, values)) => commander.extract_record(table, Some(&condition), &values),
        None => commander.extract_table(table),
    };
    commander.close();

    let stored: Vec<StoredRow> = rows.iter().filter_map(StoredRow::from_row).collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    if stored.is_empty() {
        println!("No rows in '{table}'.");
        return Ok(());
    }
    println!(
        "{:>5}  {:<10} {:<12} {:>14} {:>14} {:>12} {:>14} {:>14} {:>6}",
        "id", "ticker", "metric", "mean", "median", "std", "low", "max", "count"
    );
    for s in &stored {
        println!(
            "{:>5}  {:<10} {:<12} {:>14} {:>14} {:>12} {:>14} {:>14} {:>6}",
            s.id,
            or_dash(s.ticker.as_deref()),
            or_dash(s.metric.as_deref()),
            real(s.mean),
            real(s.median),
            real(s.std),
            real(s.low),
            real(s.max),
            s.count.map_or_else(|| "-".to_string(), |c| c.to_string()),
        );
    }
    Ok(())
}

/// NULL columns print as `-`.
fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn real(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

fn run_delete(config: &AppConfig, table: &str, filter: RowFilter) -> Result<()> {
    let Some((condition, values)) = filter.condition() else {
        bail!("delete needs a ticker");
    };
    let mut commander = open_commander(config)?;
    let status = commander.delete_record(table, &condition, &values);
    commander.close();

    expect_success("delete", status)?;
    println!("Deleted matching rows from '{table}'.");
    Ok(())
}

fn run_drop_table(config: &AppConfig, table: &str, confirmation: &Confirmation) -> Result<()> {
    let mut commander = open_commander(config)?;
    let status = commander.drop_table(table, confirmation);
    commander.close();

    if status == Status::Forbidden {
        println!("Dry run: table '{table}' would be dropped. Re-run with --confirm {table}.");
        return Ok(());
    }
    expect_success("drop-table", status)?;
    println!("Dropped table '{table}'.");
    Ok(())
}

fn run_drop_database(config: &AppConfig, confirmation: &Confirmation) -> Result<()> {
    let mut commander = open_commander(config)?;
    let name = commander.store().database_name();
    let status = commander.drop_database(confirmation);
    commander.close();

    if status == Status::Forbidden {
        println!("Dry run: database '{name}' would be dropped. Re-run with --confirm {name}.");
        return Ok(());
    }
    expect_success("drop-database", status)?;
    println!("Dropped database '{name}'.");
    Ok(())
}

fn expect_success(command: &str, status: Status) -> Result<()> {
    if !status.is_success() {
        bail!("{command} failed: {status}");
    }
    Ok(())
}

fn print_summary(label: &str, data: Option<&TickerSummary>) {
    println!();
    let Some(data) = data else {
        println!("=== {label}: no data (see log) ===");
        return;
    };
    let summary = &data.summary;
    println!("=== {label}: {} ===", data.ticker);
    println!("Records:   {}", summary.count());
    println!("Standing:  {}", summary.standing);
    println!(
        "{:<12} {:>14} {:>12} {:>14} {:>14} {:>14}",
        "field", "mean", "std", "median", "min", "max"
    );
    for (field, s) in summary.stats.iter() {
        println!(
            "{:<12} {:>14.4} {:>12.4} {:>14.4} {:>14.4} {:>14.4}",
            field, s.mean, s.std, s.median, s.min, s.max
        );
    }
}

fn print_init_report(report: &InitReport, rows: &[(&str, usize)]) {
    println!();
    println!("--- Tables ---");
    for (table, init) in &report.tables {
        let outcome = match init {
            TableInit::AlreadyPresent => "already present, left unchanged".to_string(),
            TableInit::NoData => "created, no data".to_string(),
            TableInit::Created { inserted, failed: 0 } => format!("created, {inserted} rows"),
            TableInit::Created { inserted, failed } => {
                format!("created, {inserted} rows ({failed} failed)")
            }
            TableInit::CreateFailed => "could not be created".to_string(),
        };
        println!("{table:<8} {outcome}");
    }
    for (table, count) in rows {
        println!("Rows in {table}: {count}");
    }
}
