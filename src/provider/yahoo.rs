use crate::model::{FetchRequest, MarketSeries, ProviderError};
use crate::normalizer::normalize_bars;
use crate::parser::ChartParser;
use crate::provider::traits::MarketDataProvider;

use reqwest::Client;
use std::time::Duration;

/// Fetches daily bars from the public Yahoo chart endpoint, the same API
/// the usual Python tooling wraps.
pub struct YahooProvider {
    client: Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new() -> Self {
        Self::with_base_url("https://query1.finance.yahoo.com")
    }

    pub fn with_base_url(base_url: &str) -> Self {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) FxAdvisor/0.1")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap();

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, req: &FetchRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}",
            self.base_url, req.symbol, req.range, req.interval
        )
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch(&self, req: &FetchRequest) -> Result<MarketSeries, ProviderError> {
        let url = self.build_url(req);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Http(e.to_string()))?;

        let bars = normalize_bars(ChartParser::new().parse(&body)?);
        Ok(MarketSeries::new(&req.symbol, &req.interval, bars)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_carries_symbol_range_and_interval() {
        let provider = YahooProvider::with_base_url("http://localhost:9999/");
        let req = FetchRequest {
            symbol: "EURUSD=X".to_string(),
            range: "2y".to_string(),
            interval: "1d".to_string(),
        };
        assert_eq!(
            provider.build_url(&req),
            "http://localhost:9999/v8/finance/chart/EURUSD=X?range=2y&interval=1d"
        );
    }
}
