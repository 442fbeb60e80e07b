//! NEXRAD file inspector.
//!
//! Loads Level II archives or Level III products through the per-site
//! manager registry, computes one sweep through a product view and prints
//! its metadata.

mod report;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use radar_common::RadarConfig;
use radar_manager::{RadarProductManager, RadarProductManagerRegistry};
use radar_view::{ColorTableSource, RadarProductView, ViewEvent, ViewProduct};
use tokio::sync::broadcast;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wsr88d::DataBlockType;

use report::SweepReport;

const SWEEP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "radar-inspector")]
#[command(about = "Inspect NEXRAD Level II and Level III files")]
struct Args {
    /// Configuration file (YAML)
    #[arg(short, long, env = "RADAR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides configuration)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Palette directory (overrides configuration)
    #[arg(long)]
    color_table_dir: Option<PathBuf>,

    /// Volumes cached per site (overrides configuration)
    #[arg(long)]
    max_cached_volumes: Option<usize>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load Archive II files and report one sweep per site
    Level2 {
        /// Archive II files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Moment to compute (REF, VEL, SW, ZDR, PHI, RHO, CFP)
        #[arg(short, long, default_value = "REF")]
        moment: DataBlockType,

        /// Requested elevation angle (degrees)
        #[arg(short, long, default_value_t = 0.5)]
        elevation: f32,

        /// Latest scan time to consider (RFC 3339)
        #[arg(short, long)]
        time: Option<DateTime<Utc>>,
    },

    /// Load Level III products and report one product per site
    Level3 {
        /// Level III product files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Product code (defaults to the first loaded)
        #[arg(short, long)]
        product: Option<i16>,

        /// Site for products without a recognizable identifier
        #[arg(long)]
        site: Option<String>,

        /// Latest product time to consider (RFC 3339)
        #[arg(short, long)]
        time: Option<DateTime<Utc>>,
    },

    /// List known radar sites
    Sites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .max_blocking_threads(config.worker_threads)
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(run(args, config))
}

/// Defaults, then the YAML file or environment, then command-line flags.
fn load_config(args: &Args) -> Result<RadarConfig> {
    let mut config = match &args.config {
        Some(path) => RadarConfig::from_yaml(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RadarConfig::from_env(),
    };

    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if args.log_json {
        config.log_json = true;
    }
    if let Some(dir) = &args.color_table_dir {
        config.color_table_dir = dir.clone();
    }
    if let Some(volumes) = args.max_cached_volumes {
        config.max_cached_volumes = volumes;
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &RadarConfig) -> Result<()> {
    let level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

async fn run(args: Args, config: RadarConfig) -> Result<()> {
    let registry = RadarProductManagerRegistry::from_config(&config)?;

    let reports = match args.command {
        Command::Level2 {
            files,
            moment,
            elevation,
            time,
        } => {
            let mut managers = BTreeMap::new();
            for file in &files {
                let manager = registry
                    .load_level2_file(file)
                    .await
                    .with_context(|| format!("failed to load {}", file.display()))?;
                info!(file = %file.display(), site = %manager.radar_site().id, "Loaded Level II file");
                managers.insert(manager.radar_site().id.clone(), manager);
            }

            let mut reports = Vec::new();
            for manager in managers.into_values() {
                let product = ViewProduct::Level2(moment);
                reports.push(inspect(&config, manager, product, elevation, time).await?);
            }
            reports
        }

        Command::Level3 {
            files,
            product,
            site,
            time,
        } => {
            let fallback = site.unwrap_or_else(|| config.default_site.clone());
            let mut managers = BTreeMap::new();
            for file in &files {
                let manager = registry
                    .load_level3_file(file, Some(&fallback))
                    .await
                    .with_context(|| format!("failed to load {}", file.display()))?;
                info!(file = %file.display(), site = %manager.radar_site().id, "Loaded Level III file");
                managers.insert(manager.radar_site().id.clone(), manager);
            }

            let mut reports = Vec::new();
            for manager in managers.into_values() {
                let code = match product {
                    Some(code) => code,
                    None => match manager.level3_products().await.first() {
                        Some(&code) => code,
                        None => bail!("no Level III products loaded for {}", manager.radar_site().id),
                    },
                };
                let product = ViewProduct::Level3(code);
                reports.push(inspect(&config, manager, product, 0.0, time).await?);
            }
            reports
        }

        Command::Sites => {
            let sites = registry.sites();
            let mut ids = sites.ids();
            ids.sort();
            for id in ids {
                if let Some(site) = sites.get(&id) {
                    println!("{} {:>9.4} {:>10.4} {:>6.0} ft", site.id, site.latitude, site.longitude, site.elevation_ft);
                }
            }
            return Ok(());
        }
    };

    match args.format {
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", report);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }
    Ok(())
}

/// Compute one sweep of `product` and summarize it.
async fn inspect(
    config: &RadarConfig,
    manager: Arc<RadarProductManager>,
    product: ViewProduct,
    elevation: f32,
    time: Option<DateTime<Utc>>,
) -> Result<SweepReport> {
    let view = RadarProductView::new(manager, product);
    view.select_elevation(elevation).await;
    view.select_time(time).await;

    let source = ColorTableSource::for_product(config, &product);
    if matches!(source, ColorTableSource::None) {
        warn!(product = %product.short_name(), "No color table configured, sweep will have no geometry");
    }

    let mut events = view.subscribe();
    view.initialize(source).await?;
    wait_for_sweep(&mut events).await?;

    Ok(SweepReport::collect(&view).await)
}

async fn wait_for_sweep(events: &mut broadcast::Receiver<ViewEvent>) -> Result<()> {
    let wait = async {
        loop {
            match events.recv().await {
                Ok(ViewEvent::SweepComputed) => return Ok(()),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => bail!("view closed before computing a sweep"),
            }
        }
    };
    tokio::time::timeout(SWEEP_TIMEOUT, wait)
        .await
        .context("timed out waiting for sweep")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level2_arguments() {
        let args = Args::try_parse_from([
            "radar-inspector",
            "--format",
            "json",
            "level2",
            "KTLX20240506_223045_V06",
            "--moment",
            "vel",
            "--elevation",
            "1.5",
            "--time",
            "2024-05-06T22:30:00Z",
        ])
        .unwrap();

        assert_eq!(args.format, OutputFormat::Json);
        match args.command {
            Command::Level2 {
                files,
                moment,
                elevation,
                time,
            } => {
                assert_eq!(files, vec![PathBuf::from("KTLX20240506_223045_V06")]);
                assert_eq!(moment, DataBlockType::MomentVel);
                assert_eq!(elevation, 1.5);
                assert_eq!(time, Some(test_utils::volume_time()));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_level2_requires_files() {
        assert!(Args::try_parse_from(["radar-inspector", "level2"]).is_err());
        assert!(Args::try_parse_from(["radar-inspector", "level2", "f", "--moment", "XYZ"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::try_parse_from([
            "radar-inspector",
            "--log-level",
            "debug",
            "--max-cached-volumes",
            "3",
            "--color-table-dir",
            "/tmp/palettes",
            "sites",
        ])
        .unwrap();
        let config = load_config(&args).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_cached_volumes, 3);
        assert_eq!(config.color_table_dir, PathBuf::from("/tmp/palettes"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args =
            Args::try_parse_from(["radar-inspector", "--max-cached-volumes", "0", "sites"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
