use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sqlsnap::config::DbConfig;
use sqlsnap::settings::{NameFilter, SchemaSettings};
use sqlsnap::snapshot::SnapshotBuilder;

#[derive(Parser, Debug)]
#[command(name = "sqlsnap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// ADO-style connection string (overrides environment configuration)
    #[arg(long)]
    connection: Option<String>,

    /// Path to .env file for connection config
    #[arg(long, default_value = "./.env")]
    env_file: PathBuf,

    /// Output file path (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip the Tables section
    #[arg(long)]
    no_tables: bool,

    /// Skip the Views section
    #[arg(long)]
    no_views: bool,

    /// Skip the StoredProcedures section
    #[arg(long)]
    no_procedures: bool,

    /// Skip the UserDefinedFunctions section
    #[arg(long)]
    no_functions: bool,

    /// Skip the Synonyms section
    #[arg(long)]
    no_synonyms: bool,

    /// Comma-separated list of object names to include (default: all)
    #[arg(long, value_delimiter = ',')]
    include: Option<Vec<String>>,

    /// Comma-separated list of object names to exclude
    #[arg(long, value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = ?e, "Fatal error");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    info!("sqlsnap v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.connection {
        Some(connection) => DbConfig::from_connection_string(connection)
            .context("Failed to parse connection string")?,
        None => DbConfig::load(&cli.env_file).context("Failed to load database configuration")?,
    };
    debug!(connection = ?config.redacted_connection_string(), "Loaded configuration");

    // Build name filter
    let filter = NameFilter {
        include: cli.include,
        exclude: cli.exclude,
    };

    if filter.include.is_some() || filter.exclude.is_some() {
        debug!(filter = ?filter, "Name filter configured");
    }

    let settings = SchemaSettings::new()
        .with_tables(!cli.no_tables)
        .with_views(!cli.no_views)
        .with_stored_procedures(!cli.no_procedures)
        .with_user_defined_functions(!cli.no_functions)
        .with_synonyms(!cli.no_synonyms)
        .with_include(filter.into_predicate());
    debug!(settings = ?settings, "Snapshot settings");

    let builder = SnapshotBuilder::new(settings);
    let document = builder
        .build_from_config(&config)
        .await
        .context("Failed to build schema snapshot")?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = ?path, bytes = document.len(), "Snapshot written");
        }
        None => println!("{document}"),
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}
