//! Jobsweep CLI - operator commands against a running daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9631";

#[derive(Parser)]
#[command(name = "jobsweep-cli")]
#[command(about = "Jobsweep CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "JOBSWEEP_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the last page state and cache summary
    Status,

    /// Load a page snapshot into the daemon
    Load {
        /// Page URL (decides feed / jobs / network mode)
        url: String,

        /// HTML file with the page content
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Read or change operator settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Job URL cache administration
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show stored and effective settings
    Get,

    /// Set one setting (value is JSON; bare words are taken as strings)
    Set {
        key: String,

        /// e.g. true, 48, '["acme","globex"]'
        value: Option<String>,

        /// Drop the stored value so the default applies
        #[arg(long, conflicts_with = "value")]
        reset: bool,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Entry counts
    Stats,

    /// Evict entries not seen within the retention window
    Evict {
        /// Override the configured retention window
        #[arg(long)]
        retention_hours: Option<i64>,
    },

    /// Delete every cached URL
    Clear,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct CacheStatsRow {
    entries: usize,
    resolved: usize,
    without_url: usize,
}

#[derive(Tabled)]
struct SettingRow {
    key: String,
    stored: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

/// Parse a setting value from the command line
fn parse_setting_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Status => {
            println!("{}", "Jobsweep Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "page.state.v1", json!({})).await {
                Ok(state) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Page:".bold(), state["url"]);
                    println!("  {} {}", "Mode:".bold(), state["mode"]);
                    let enabled = if state["enabled"].as_bool().unwrap_or(false) {
                        "yes".green()
                    } else {
                        "no".yellow()
                    };
                    println!("  {} {}", "Enabled:".bold(), enabled);
                    println!("  {} {}", "Visible jobs:".bold(), state["visible_jobs"]);
                    println!("  {} {}", "Removed jobs:".bold(), state["removed_jobs"]);
                    println!("  {} {}", "Annotated:".bold(), state["annotated_jobs"]);
                    println!(
                        "  {} {}",
                        "Resolutions in flight:".bold(),
                        state["in_flight_resolutions"]
                    );
                    println!("  {} {}", "Last tick (ms):".bold(), state["last_tick_at"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                    return Ok(());
                }
            }

            if let Ok(stats) = call_rpc(&cli.rpc_url, "cache.stats.v1", json!({})).await {
                println!();
                let row: CacheStatsRow = serde_json::from_value(stats)?;
                println!("{}", Table::new(vec![row]));
            }
        }

        Commands::Load { url, file } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let result = call_rpc(
                &cli.rpc_url,
                "page.load.v1",
                json!({ "url": url, "html": html }),
            )
            .await?;

            println!(
                "{}",
                format!("✓ Page loaded ({})", result["mode"].as_str().unwrap_or("?"))
                    .green()
                    .bold()
            );
        }

        Commands::Settings { action } => match action {
            SettingsAction::Get => {
                let result = call_rpc(&cli.rpc_url, "settings.get.v1", json!({})).await?;

                let rows: Vec<SettingRow> = result["stored"]
                    .as_object()
                    .map(|stored| {
                        stored
                            .iter()
                            .map(|(key, value)| SettingRow {
                                key: key.clone(),
                                stored: value.to_string(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                if rows.is_empty() {
                    println!("{}", "No stored settings (defaults apply)".yellow());
                } else {
                    println!("{}", Table::new(rows));
                }
                println!();
                println!("{}", "Effective:".cyan().bold());
                println!("{}", serde_json::to_string_pretty(&result["effective"])?);
            }

            SettingsAction::Set { key, value, reset } => {
                let value = match (value, reset) {
                    (_, true) => serde_json::Value::Null,
                    (Some(raw), false) => parse_setting_value(&raw),
                    (None, false) => anyhow::bail!("Provide a value or --reset"),
                };

                call_rpc(
                    &cli.rpc_url,
                    "settings.set.v1",
                    json!({ "key": key, "value": value }),
                )
                .await?;

                if reset {
                    println!("{}", format!("✓ {} reset to default", key).green().bold());
                } else {
                    println!("{}", format!("✓ {} = {}", key, value).green().bold());
                }
            }
        },

        Commands::Cache { action } => match action {
            CacheAction::Stats => {
                let stats = call_rpc(&cli.rpc_url, "cache.stats.v1", json!({})).await?;
                let oldest = stats["oldest_last_seen_at"].clone();
                let row: CacheStatsRow = serde_json::from_value(stats)?;
                println!("{}", Table::new(vec![row]));
                println!("  {} {}", "Oldest last seen (ms):".bold(), oldest);
            }

            CacheAction::Evict { retention_hours } => {
                let result = call_rpc(
                    &cli.rpc_url,
                    "cache.evict.v1",
                    json!({ "retention_hours": retention_hours }),
                )
                .await?;
                println!(
                    "{}",
                    format!(
                        "✓ {} entries evicted (retention {}h)",
                        result["evicted"], result["retention_hours"]
                    )
                    .green()
                    .bold()
                );
            }

            CacheAction::Clear => {
                let result = call_rpc(&cli.rpc_url, "cache.clear.v1", json!({})).await?;
                println!(
                    "{}",
                    format!("✓ {} entries cleared", result["cleared"]).green().bold()
                );
            }
        },
    }

    Ok(())
}
