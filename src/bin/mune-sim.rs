//! MUNE-Sim command line front end

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use mune_sim::config::{ConfigLoader, ScanFormat, SimulationConfig};
use mune_sim::export::format::format_scan;
use mune_sim::export::FileExporter;
use mune_sim::motor::MotorPool;
use mune_sim::simulation::SimulationDriver;

#[derive(Parser)]
#[command(name = "mune-sim")]
#[command(about = "Motor pool degeneration and CMAP scan simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults: mune-sim.toml, config/local.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full experiment matrix and export every artifact
    Run {
        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Scan file format (mem, dat)
        #[arg(short, long)]
        format: Option<String>,

        /// Seeds to simulate (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        seeds: Vec<u64>,
    },

    /// Write the default configuration as TOML
    InitConfig {
        /// Destination file
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Check a configuration file
    Validate {
        /// Configuration file
        path: PathBuf,
    },

    /// Print one scan of a freshly sampled pool to stdout
    Scan {
        /// Seed of the sampled pool
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Pool size, overriding the configuration
        #[arg(short, long)]
        units: Option<usize>,

        /// Scan file format (mem, dat)
        #[arg(short, long, default_value = "dat")]
        format: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "mune_sim=debug" } else { "mune_sim=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            output,
            threads,
            format,
            seeds,
        } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(output) = output {
                config.export.output_dir = output;
            }
            if threads.is_some() {
                config.experiment.worker_threads = threads;
            }
            if let Some(format) = format {
                config.export.scan_format = parse_format(&format)?;
            }
            if !seeds.is_empty() {
                config.experiment.seeds = seeds;
            }
            run(config)
        }
        Commands::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            ConfigLoader::export_config(&SimulationConfig::default(), &path)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Commands::Validate { path } => {
            ConfigLoader::with_paths(Vec::new())
                .without_env()
                .validate_config_file(&path)
                .with_context(|| format!("validating {}", path.display()))?;
            println!("{} is valid", path.display());
            Ok(())
        }
        Commands::Scan { seed, units, format } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(units) = units {
                config.pool.unit_count = units;
            }
            scan(&config, seed, parse_format(&format)?)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let loader = match path {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file {} not found", path.display());
            }
            ConfigLoader::with_paths(vec![path.clone()])
        }
        None => ConfigLoader::new(),
    };
    loader.load().context("loading configuration")
}

fn parse_format(value: &str) -> Result<ScanFormat> {
    match value.to_ascii_lowercase().as_str() {
        "mem" => Ok(ScanFormat::Mem),
        "dat" => Ok(ScanFormat::Dat),
        other => bail!("unknown scan format '{}' (expected mem or dat)", other),
    }
}

fn run(config: SimulationConfig) -> Result<()> {
    let exporter = FileExporter::new(config.export.clone(), config.scan.grid().scan_points());
    let driver = SimulationDriver::new(config)?;
    let report = driver.run(&exporter)?;

    println!(
        "{} trajectories, {} failed, {} export errors; output in {}",
        report.trajectory_count(),
        report.failed_trajectories(),
        report.export_error_count(),
        exporter.root().display()
    );

    if report.failed_trajectories() > 0 {
        bail!("{} trajectories failed", report.failed_trajectories());
    }
    Ok(())
}

fn scan(config: &SimulationConfig, seed: u64, format: ScanFormat) -> Result<()> {
    let driver = SimulationDriver::new(config.clone())?;
    let mut rng = StdRng::seed_from_u64(seed);
    let pool = MotorPool::initialize(&config.pool.parameters(), &mut rng)?;
    let scan = driver.scanner().scan(&pool, &mut rng)?;

    let text = format_scan(&scan, format, &config.scan.grid().scan_points());
    std::io::stdout().lock().write_all(text.as_bytes())?;
    Ok(())
}
