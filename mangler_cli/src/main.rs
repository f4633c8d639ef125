use mangler_core::{ManglerConfig, Mutator};

use anyhow::Context;
use clap::Parser;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "mangler.toml";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Generate corrupted variants of an input file", long_about = None)]
struct Cli {
    /// Seed file to corrupt.
    #[clap(short, long, value_parser)]
    input: PathBuf,
    /// Directory that receives one `<md5>.bin` file per distinct output.
    #[clap(short, long, value_parser)]
    output_dir: PathBuf,
    #[clap(short, long, value_parser)]
    config_file: Option<PathBuf>,
    #[clap(short = 'n', long, default_value_t = 1)]
    count: u64,
    /// Overrides the seed from the config file.
    #[clap(short, long)]
    seed: Option<u64>,
    #[clap(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit path, then `mangler.toml` in `search_dir`, then built-in defaults.
fn resolve_config(explicit: Option<&Path>, search_dir: &Path) -> anyhow::Result<ManglerConfig> {
    match explicit {
        Some(path) => {
            info!(?path, "Loading configuration");
            ManglerConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))
        }
        None => {
            let default_path = search_dir.join(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                info!(path = ?default_path, "No config file specified, loading default");
                ManglerConfig::load_from_file(&default_path).with_context(|| {
                    format!("Failed to load config file {}", default_path.display())
                })
            } else {
                info!("No config file found, using built-in defaults");
                Ok(ManglerConfig::default())
            }
        }
    }
}

fn output_file_name(data: &[u8]) -> String {
    format!("{:x}.bin", md5::compute(data))
}

/// Runs `mutator` `count` times over `input`, writing each new output once.
/// Returns the number of files written.
fn generate(
    mutator: &mut dyn Mutator,
    input: &[u8],
    output_dir: &Path,
    count: u64,
) -> anyhow::Result<usize> {
    let mut seen = HashSet::new();
    for iteration in 0..count {
        let output = mutator
            .transform(input)
            .with_context(|| format!("Mutation failed at iteration {iteration}"))?;
        let file_name = output_file_name(&output);
        if !seen.insert(file_name.clone()) {
            debug!(iteration, file = %file_name, "Duplicate output skipped");
            continue;
        }
        let path = output_dir.join(&file_name);
        std::fs::write(&path, &output)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(iteration, file = %file_name, len = output.len(), "Wrote output");
    }
    Ok(seen.len())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let mut config = resolve_config(cli.config_file.as_deref(), &cwd)?;
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
    if config.seed.is_none() {
        warn!("No seed configured, outputs will not be reproducible");
    }
    debug!(?config, "Effective configuration");

    let mut mutator = config.build().context("Invalid mutation settings")?;
    info!(?mutator, "Built mutator");

    let input = std::fs::read(&cli.input)
        .with_context(|| format!("Failed to read input file {}", cli.input.display()))?;
    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("Failed to create output directory {}", cli.output_dir.display())
    })?;

    let start_time = Instant::now();
    let written = generate(&mut mutator, &input, &cli.output_dir, cli.count)?;
    info!(
        iterations = cli.count,
        written,
        elapsed = ?start_time.elapsed(),
        "Generation finished"
    );
    println!(
        "Wrote {} distinct outputs from {} iterations to {}",
        written,
        cli.count,
        cli.output_dir.display()
    );
    Ok(())
}
