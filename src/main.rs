//! ratecache - an offline-first currency converter for the terminal.
//!
//! Fetches the currency list and pairwise conversion rates from a remote
//! rate service, keeps everything seen in a local store, and stays usable
//! without connectivity.

mod api;
mod app;
mod assets;
mod config;
mod connectivity;
mod models;
mod store;
mod view;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::ApiClient;
use app::App;
use assets::{AssetCache, ASSET_MANIFEST, BUCKET_VERSION};
use config::Config;
use connectivity::ConnectivityMonitor;
use models::EditedField;
use store::StoreManager;
use view::{TerminalView, ViewSink};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Set up logging with environment-based filter
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("ratecache starting");

    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    let api = ApiClient::new(&config.api_url)?;
    let http = reqwest::Client::new();

    let store = match config.store_dir() {
        Ok(dir) => StoreManager::open(dir),
        Err(e) => {
            warn!(error = %e, "No cache directory, operating without local persistence");
            StoreManager::unavailable()
        }
    };

    let asset_cache = setup_asset_cache(&config, &http).await;

    // Stand-in for the platform connectivity signal; toggled at runtime
    // with the `online`/`offline` commands.
    let online = std::env::var("RATECACHE_OFFLINE").is_err();
    let monitor = ConnectivityMonitor::new(online);

    let view = Arc::new(TerminalView);
    view.set_connectivity(monitor.is_online());

    let mut app = App::new(
        Arc::new(api),
        store,
        view,
        monitor.is_online(),
        &config.last_from,
        &config.last_to,
    );
    app.hydrate_currencies().await;

    run(&mut app, &monitor, asset_cache.as_ref(), &http).await?;

    // Remember the selection for next startup.
    let (from, to) = app.selected_pair();
    config.last_from = from.to_string();
    config.last_to = to.to_string();
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    info!("ratecache shutting down");
    Ok(())
}

/// Install and activate the asset cache when an application origin is
/// configured. Failures here are never fatal.
async fn setup_asset_cache(config: &Config, http: &reqwest::Client) -> Option<AssetCache> {
    let dir = match config.assets_dir() {
        Ok(dir) => dir,
        Err(e) => {
            warn!(error = %e, "Asset cache disabled");
            return None;
        }
    };

    let mut cache = AssetCache::open(dir, BUCKET_VERSION, &config.api_url);

    if let Some(app_url) = config.app_url.as_deref() {
        match reqwest::Url::parse(app_url) {
            Ok(base) => match cache.install(http, &base, ASSET_MANIFEST).await {
                Ok(()) => {
                    if let Err(e) = cache.activate() {
                        warn!(error = %e, "Asset cache activation failed");
                    }
                }
                Err(e) => warn!(error = %e, "Asset cache install failed"),
            },
            Err(e) => warn!(error = %e, url = app_url, "Invalid app URL, asset cache not installed"),
        }
    }

    Some(cache)
}

async fn run(
    app: &mut App,
    monitor: &ConnectivityMonitor,
    assets: Option<&AssetCache>,
    http: &reqwest::Client,
) -> Result<()> {
    let mut connectivity = monitor.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();

    loop {
        print!("{}", if app.is_online() { "> " } else { "offline> " });
        io::stdout().flush()?;

        tokio::select! {
            changed = connectivity.changed() => {
                if changed.is_err() {
                    break;
                }
                let online = *connectivity.borrow_and_update();
                app.apply_connectivity(online).await;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_command(app, monitor, assets, http, line.trim()).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

async fn handle_command(
    app: &mut App,
    monitor: &ConnectivityMonitor,
    assets: Option<&AssetCache>,
    http: &reqwest::Client,
    line: &str,
) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match (command, args.as_slice()) {
        ("", _) => {}
        ("help", _) => print_help(),
        ("list", _) => {
            for currency in app.currencies() {
                println!("  {}", currency.label());
            }
        }
        ("pair", [from, to]) => app.hydrate_rate(from, to).await,
        ("from", [amount]) => match amount.parse::<f64>() {
            Ok(amount) => app.edit_amount(EditedField::From, amount).await,
            Err(_) => println!("Not a number: {}", amount),
        },
        ("to", [amount]) => match amount.parse::<f64>() {
            Ok(amount) => app.edit_amount(EditedField::To, amount).await,
            Err(_) => println!("Not a number: {}", amount),
        },
        ("saved", _) => {
            let (rates, age) = app.offline_conversions();
            if rates.is_empty() {
                println!("No conversions saved yet");
            } else {
                for rate in &rates {
                    match rate.pair_id.split_once('_') {
                        Some((from, to)) => println!("  {} to {} -- {}", from, to, rate.value),
                        None => println!("  {} -- {}", rate.pair_id, rate.value),
                    }
                }
                if let Some(age) = age {
                    println!("(last saved {})", age);
                }
            }
        }
        ("online", _) => monitor.set_online(true),
        ("offline", _) => monitor.set_online(false),
        ("asset", [url]) => match assets {
            Some(cache) => match cache.serve(http, url).await {
                Ok(asset) => println!(
                    "{} bytes ({})",
                    asset.body.len(),
                    asset.content_type.as_deref().unwrap_or("unknown type")
                ),
                Err(e) => println!("Could not serve asset: {}", e),
            },
            None => println!("Asset cache is disabled"),
        },
        ("quit" | "exit", _) => return Ok(false),
        _ => println!("Unknown command, try `help`"),
    }

    Ok(true)
}

fn print_help() {
    println!("Commands:");
    println!("  pair <from> <to>   select a currency pair, e.g. `pair USD EUR`");
    println!("  from <amount>      convert an amount of the first currency");
    println!("  to <amount>        convert an amount of the second currency");
    println!("  list               show the available currencies");
    println!("  saved              show conversions available offline");
    println!("  online | offline   toggle connectivity");
    println!("  asset <url>        fetch a static asset through the asset cache");
    println!("  quit               exit");
}
