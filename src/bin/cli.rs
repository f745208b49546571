//! Atlas CLI
//!
//! Command-line interface for configuration, migrations, and memory management.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

use atlas::config::{config_path, save_config, validate_config, Config, IndexBackendType};
use atlas::core::{Metadata, ScoredMemory};
use atlas::database::{init_pool_for_migrations, migrations};
use atlas::memory;
use atlas::VERSION;

#[derive(Parser)]
#[command(
    name = "atlas",
    author = "Atlas Contributors",
    version = VERSION,
    about = "Atlas - AI agent with vector-backed long-term memory",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default values
    InitConfig {
        /// Destination (defaults to $ATLAS_CONFIG or the user config dir)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Check the effective configuration for problems
    Validate,

    /// Enable pgvector and create the memory collection
    Migrate,

    /// Store a memory
    Store {
        /// Memory text
        text: String,
        /// Metadata as a JSON object
        #[arg(long, short)]
        metadata: Option<String>,
    },

    /// Retrieve the memories closest to a query
    Retrieve {
        /// Query text
        query: String,
        /// Number of results (defaults to memory.default_k)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Delete memories older than a maximum age
    Expire {
        /// Maximum age such as `15days` (defaults to memory.max_age)
        #[arg(long)]
        max_age: Option<String>,
    },

    /// Count stored memories
    Count,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,atlas=info,sqlx=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::InitConfig { path, force } => init_config(path, force),
        Commands::Validate => validate(),
        Commands::Migrate => migrate().await,
        Commands::Store { text, metadata } => store(&text, metadata.as_deref()).await,
        Commands::Retrieve { query, k } => retrieve(&query, k).await,
        Commands::Expire { max_age } => expire(max_age.as_deref()).await,
        Commands::Count => count().await,
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> anyhow::Result<()> {
    let path = path.unwrap_or_else(config_path);

    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    save_config(&Config::default(), &path)?;
    println!(
        "{} Wrote default configuration to {}",
        style("✓").green(),
        style(path.display()).cyan()
    );
    Ok(())
}

fn validate() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let result = validate_config(&config);

    for issue in &result.errors {
        println!("{} {}", style("✗").red(), issue);
    }
    for issue in &result.warnings {
        println!("{} {}", style("⚠").yellow(), issue);
    }

    if !result.valid {
        bail!("configuration has {} error(s)", result.errors.len());
    }

    println!("{} Configuration is valid", style("✓").green());
    Ok(())
}

async fn migrate() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    if config.index.backend == IndexBackendType::Postgres {
        let postgres = config
            .index
            .postgres
            .as_ref()
            .context("PostgreSQL index selected but no database URL is configured")?;
        // Skip the pgvector check, this is what installs it
        let pool = init_pool_for_migrations(postgres).await?;
        migrations::run(&pool).await?;
        println!("{} pgvector extension enabled", style("✓").green());
    }

    let store = memory::open(&config).await?;
    println!(
        "{} Collection {} ready ({} dims)",
        style("✓").green(),
        style(&store.config().collection).cyan(),
        store.config().dimensions
    );
    Ok(())
}

/// Open the configured store, refusing the in-process index
async fn open_persistent_store() -> anyhow::Result<memory::MemoryStore> {
    let config = Config::from_env()?;
    require_persistent_index(&config)?;
    Ok(memory::open(&config).await?)
}

fn require_persistent_index(config: &Config) -> atlas::Result<()> {
    if config.index.backend == IndexBackendType::Memory {
        return Err(atlas::Error::Config(
            "the in-memory index does not persist across CLI invocations; \
             set DATABASE_URL or index.backend = \"postgres\""
                .into(),
        ));
    }
    Ok(())
}

async fn store(text: &str, metadata: Option<&str>) -> anyhow::Result<()> {
    let metadata: Metadata = match metadata {
        Some(raw) => serde_json::from_str(raw).context("--metadata must be a JSON object")?,
        None => Metadata::new(),
    };

    let store = open_persistent_store().await?;
    store.store(text, metadata).await?;

    println!("{} Stored", style("✓").green());
    Ok(())
}

async fn retrieve(query: &str, k: Option<usize>) -> anyhow::Result<()> {
    let store = open_persistent_store().await?;

    let results = match k {
        Some(k) => store.retrieve(query, k).await?,
        None => store.retrieve_default(query).await?,
    };

    if results.is_empty() {
        println!("{}", style("No memories found").dim());
        return Ok(());
    }

    for (i, memory) in results.iter().enumerate() {
        print_memory(i + 1, memory);
    }
    Ok(())
}

fn print_memory(rank: usize, memory: &ScoredMemory) {
    println!(
        "{:>3}. {} {}",
        rank,
        style(format!("[{:.4}]", memory.distance)).dim(),
        memory.text
    );
    println!(
        "     {}",
        style(memory.timestamp.format("%Y-%m-%d %H:%M:%S UTC")).dim()
    );
    if !memory.metadata.is_empty() {
        println!(
            "     {}",
            style(serde_json::Value::Object(memory.metadata.clone())).dim()
        );
    }
}

async fn expire(max_age: Option<&str>) -> anyhow::Result<()> {
    let store = open_persistent_store().await?;

    let deleted = match max_age {
        Some(raw) => {
            let age = humantime_serde::re::humantime::parse_duration(raw)
                .with_context(|| format!("invalid --max-age {:?}", raw))?;
            let age = chrono::Duration::from_std(age).context("--max-age is out of range")?;
            store.expire(age).await?
        }
        None => store.expire_default().await?,
    };

    println!("{} Deleted {} memories", style("✓").green(), deleted);
    Ok(())
}

async fn count() -> anyhow::Result<()> {
    let store = open_persistent_store().await?;
    println!("{}", store.count().await?);
    Ok(())
}
