mod analyzer;
mod cache;
mod config;
mod model;
mod normalizer;
mod orchestrator;
mod parser;
mod provider;
mod report;
mod scalar;
mod storage;
mod utils;

use cache::SeriesCache;
use config::{AppConfig, load_config};
use model::{AnalysisError, FetchRequest};
use orchestrator::{AnalysisRequest, Orchestrator};
use provider::{MarketDataProvider, YahooProvider};
use storage::SqliteStorage;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, warn};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    // Load configuration from file, falling back to built-in defaults
    let config = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            AppConfig::default()
        }
    };

    println!();
    println!("--- ADVANCED USD->EUR CONVERSION SIMULATOR ---");
    print!("Enter the amount in USD (e.g. 100 for 100k$): ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    let usd_amount = match io::stdin().read_line(&mut line) {
        Ok(_) => utils::parse_amount(&line).unwrap_or_else(|| {
            println!(
                "Invalid input. Using the default amount: {:.2} USD",
                config.default_usd_amount
            );
            config.default_usd_amount
        }),
        Err(_) => config.default_usd_amount,
    };

    let provider: Arc<dyn MarketDataProvider> = Arc::new(YahooProvider::new());
    let ttl = chrono::Duration::minutes(config.cache_ttl_minutes);

    // Cache persistence is best-effort: without a database the cache still
    // works for the lifetime of the process.
    let cache = match SqliteStorage::new(&config.db_path) {
        Ok(storage) => Arc::new(SeriesCache::with_storage(
            provider,
            ttl,
            Arc::new(Mutex::new(storage)),
        )),
        Err(e) => {
            warn!("Cache persistence unavailable: {}", e);
            Arc::new(SeriesCache::new(provider, ttl))
        }
    };

    let request = FetchRequest {
        symbol: config.symbol.clone(),
        range: config.range.clone(),
        interval: config.interval.clone(),
    };
    let orchestrator = Orchestrator::new(cache, request, config.volatility_threshold);

    let analysis = AnalysisRequest {
        usd_amount,
        applied_rate: config.applied_rate,
        force_refresh: false,
    };

    match orchestrator.run(&analysis).await {
        Ok(recommendation) => {
            println!("{}", report::render(&recommendation));
            ExitCode::SUCCESS
        }
        Err(e @ AnalysisError::InvalidInput(_)) => {
            error!("Rejected input: {}", e);
            eprintln!("ERROR: {}. Correct the amount or the applied rate and rerun.", e);
            ExitCode::FAILURE
        }
        Err(e @ (AnalysisError::DataUnavailable(_) | AnalysisError::InsufficientData { .. })) => {
            error!("Market data problem: {}", e);
            eprintln!(
                "ERROR: could not complete the analysis ({}).\nCheck your connection or that the symbol '{}' is correct, then retry.",
                e, config.symbol
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Analysis failed: {}", e);
            eprintln!("ERROR: could not complete the analysis ({}).", e);
            ExitCode::FAILURE
        }
    }
}
