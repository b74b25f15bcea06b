use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Quote symbol, USD per 1 EUR.
    pub symbol: String,
    /// Lookback range requested from the provider, e.g. "2y".
    pub range: String,
    /// Bar interval, e.g. "1d".
    pub interval: String,
    /// Broker rate applied to the conversion, EUR per 1 USD.
    pub applied_rate: f64,
    /// Fallback when the interactive amount cannot be parsed.
    pub default_usd_amount: f64,
    pub cache_ttl_minutes: i64,
    pub db_path: String,
    pub volatility_threshold: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: "EURUSD=X".to_string(),
            range: "2y".to_string(),
            interval: "1d".to_string(),
            applied_rate: 0.8462,
            default_usd_amount: 125_000.0,
            cache_ttl_minutes: 60,
            db_path: "cache.db".to_string(),
            volatility_threshold: 0.0075,
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
