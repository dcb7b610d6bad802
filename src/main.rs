//! Binary entrypoint for the storeforge CLI.
//!
//! Commands:
//! - `init [--store <path>]` - write a starter `storeforge.toml` and optionally a starter store
//! - `validate <store>` - load a store document and check every graph invariant
//! - `summary <store>` - print categories, goods, currencies and offer hooks
//! - `normalize <store> [-o <path>]` - load and re-write a store, repairing upgrade links
//!
//! See the library crate docs for module-level details: `storeforge::`.
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use storeforge::config::Config;
use storeforge::economy::{Economy, GoodType, Purchasable};
use storeforge::store::Store;

#[derive(Parser)]
#[command(name = "storeforge")]
#[command(about = "Author and check virtual-economy store documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "storeforge.toml", global = true)]
    config: String,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Also write a starter store document here
        #[arg(short, long)]
        store: Option<String>,
    },
    /// Check a store document for consistency
    Validate {
        store: String,
    },
    /// Print an overview of a store document
    Summary {
        store: String,
    },
    /// Load a store document and write it back in canonical form
    Normalize {
        store: String,
        /// Output path (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let pre_config = match cli.command {
        Commands::Init { .. } => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init { store } => {
            info!("Initializing storeforge configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            if let Some(path) = store {
                let config = Config::default();
                let json = starter_store(&config)?.to_json()?;
                tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("Failed to write store {}", path))?;
                info!("Starter store written to {}", path);
            }
        }
        Commands::Validate { store } => {
            let config = config_or_default(pre_config, &cli.config);
            let store = load_store(&store, &config).await?;
            store
                .check_invariants()
                .map_err(|e| anyhow!("Store is inconsistent: {}", e))?;
            println!("ok");
        }
        Commands::Summary { store } => {
            let config = config_or_default(pre_config, &cli.config);
            let store = load_store(&store, &config).await?;
            print_summary(&store);
        }
        Commands::Normalize { store: path, output } => {
            let config = config_or_default(pre_config, &cli.config);
            let store = load_store(&path, &config).await?;
            let target = output.unwrap_or_else(|| path.clone());
            tokio::fs::write(&target, store.to_json()?)
                .await
                .with_context(|| format!("Failed to write store {}", target))?;
            info!("Normalized {} -> {}", path, target);
        }
    }

    Ok(())
}

fn config_or_default(config: Option<Config>, path: &str) -> Config {
    config.unwrap_or_else(|| {
        warn!("No usable config at {}; using defaults", path);
        Config::default()
    })
}

async fn load_store(path: &str, config: &Config) -> Result<Store> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("Failed to read store {}: {}", path, e))?;
    let store =
        Store::from_json(&json, config).map_err(|e| anyhow!("Failed to load store {}: {}", path, e))?;
    Ok(store)
}

/// One category, the default currency and a single good priced in it.
fn starter_store(config: &Config) -> Result<Store> {
    let mut economy = Economy::with_config(config.economy.clone());
    let category = config.economy.default_category_name.clone();
    economy.add_category(&category)?;
    economy.add_currency(
        &config.economy.default_currency_id,
        &config.economy.default_currency_name,
    )?;
    let good = economy.create_good("first_good", GoodType::SingleUse);
    economy.add_good(&category, good)?;

    let mut store = Store::new(config);
    store.economy = economy;
    Ok(store)
}

fn print_summary(store: &Store) {
    let economy = &store.economy;
    println!("Categories: {}", economy.categories().len());
    for category in economy.categories() {
        println!("  {} ({} goods)", category.name, category.goods().len());
        for good in category.goods() {
            let upgrades = good
                .upgrade_chain()
                .map(|c| format!(", level {}/{}", c.level(), c.len()))
                .unwrap_or_default();
            println!(
                "    {} [{}] price {}{}",
                good.item_id,
                good.good_type().as_str(),
                good.price(),
                upgrades
            );
        }
    }
    println!("Currencies: {}", economy.currencies().len());
    for currency in economy.currencies() {
        println!(
            "  {} \"{}\" balance {} ({} packs)",
            currency.item_id,
            currency.name,
            currency.balance(),
            currency.packs().len()
        );
    }
    let offers: Vec<&str> = store.offer_hooks().map(|a| a.id()).collect();
    println!("Offer hooks: {}", offers.len());
    for id in offers {
        println!("  {}", id);
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when attached to a terminal
        let is_tty = atty::is(atty::Stream::Stderr);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
