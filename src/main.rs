//! wikiml: download Wikipedia dumps and turn them into ML-ready datasets

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wikiml::config::{CacheMode, Config, LogFormat, LoggingConfig, Split};

#[derive(Parser)]
#[command(name = "wikiml")]
#[command(about = "Download Wikipedia dumps and build sharded text datasets")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "wikiml.toml")]
    config: PathBuf,

    /// Data directory (overrides dump.data_dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level; also enables progress bars
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Dump selection overrides shared by the dump commands
#[derive(Args)]
struct DumpArgs {
    /// Wikipedia language code (e.g. en, fr, simple)
    #[arg(short, long)]
    language: Option<String>,

    /// Dump date as YYYYMMDD
    #[arg(long)]
    date: Option<u32>,

    /// Download again even if a complete copy exists
    #[arg(long)]
    force: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or reuse) a dump, build the dataset and preview records
    Load {
        #[command(flatten)]
        dump: DumpArgs,

        /// force-redownload, reuse-dataset-if-exists or reuse-cache-if-exists
        #[arg(long)]
        cache_mode: Option<CacheMode>,

        /// Split to read (train, test, all)
        #[arg(long)]
        split: Option<Split>,

        /// Records per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Shuffle shard order
        #[arg(long)]
        shuffle: bool,

        /// Number of records to print
        #[arg(long, default_value = "3")]
        preview: usize,
    },

    /// Download a dump into the cache without building a dataset
    Fetch {
        #[command(flatten)]
        dump: DumpArgs,
    },

    /// Show what is cached for a dump (no network access)
    Status {
        #[command(flatten)]
        dump: DumpArgs,
    },

    /// Write a starter configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { path, force } = &cli.command {
        init_logging(&LoggingConfig::default(), cli.verbose)?;
        return commands::init::init_config(path, *force);
    }

    let mut config = if cli.config.exists() {
        Config::from_file(&cli.config)?
    } else {
        Config::default()
    };

    if let Some(data_dir) = cli.data_dir {
        config.dump.data_dir = data_dir;
    }
    if cli.verbose > 0 {
        config.logging.verbose = true;
    }

    init_logging(&config.logging, cli.verbose)?;
    if !cli.config.exists() {
        debug!("No config file at {}, using defaults", cli.config.display());
    }

    match cli.command {
        Commands::Load {
            dump,
            cache_mode,
            split,
            batch_size,
            shuffle,
            preview,
        } => {
            apply_dump_args(&mut config, dump);
            if let Some(mode) = cache_mode {
                config.dump.cache_mode = mode;
            }
            if let Some(split) = split {
                config.dataset.split = split;
            }
            if let Some(batch_size) = batch_size {
                config.dataset.batch_size = batch_size;
            }
            if shuffle {
                config.dataset.shuffle_files = true;
            }
            config.validate()?;
            commands::load::load_dataset(config, preview).await
        }
        Commands::Fetch { dump } => {
            apply_dump_args(&mut config, dump);
            config.validate()?;
            commands::fetch::fetch_dump(config).await
        }
        Commands::Status { dump } => {
            apply_dump_args(&mut config, dump);
            config.validate()?;
            commands::status::show_status(config).await
        }
        Commands::Init { .. } => Ok(()),
    }
}

fn apply_dump_args(config: &mut Config, args: DumpArgs) {
    if let Some(language) = args.language {
        config.dump.language = Some(language);
    }
    if let Some(date) = args.date {
        config.dump.date = Some(date);
    }
    if args.force {
        config.dump.force_download = true;
    }
}

/// `RUST_LOG` wins over the configured level
fn init_logging(logging: &LoggingConfig, verbosity: u8) -> Result<()> {
    let level = logging.level.raised_by(verbosity);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    match logging.format {
        LogFormat::Text => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
