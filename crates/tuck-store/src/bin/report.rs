//! # Stock Report
//!
//! Loads a seed into a fresh store and prints the dashboard figures and the
//! per-item stock table as JSON.
//!
//! ## Usage
//! ```bash
//! cargo run -p tuck-store --bin report -- --seed ./seed.json
//!
//! # Options:
//! #   -s, --seed <PATH>      Seed file (default: [store] seed_path from config)
//! #   -c, --config <PATH>    Config file (default: platform config dir)
//! ```

use std::env;
use std::path::PathBuf;

use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use tuck_store::{CounterConfig, DocumentStore, OrderDesk, Seed};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut seed_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    seed_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tuckshop Stock Report");
                println!();
                println!("Usage: report [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --seed <PATH>      Seed file to load");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    let config = CounterConfig::load(config_path)?;
    info!(shop = %config.shop.name, "Counter config loaded");

    let desk = OrderDesk::from_config(DocumentStore::new(config.store.change_capacity), &config);

    match seed_path.or_else(|| config.store.seed_path.clone()) {
        Some(path) => {
            let loaded = desk.store().load_seed(Seed::from_path(&path)?).await?;
            info!(?path, documents = loaded, "Seed loaded");
        }
        None => warn!("No seed configured, reporting on an empty store"),
    }

    let report = json!({
        "shop": config.shop.name,
        "dashboard": desk.dashboard(),
        "items": desk.item_rows(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
