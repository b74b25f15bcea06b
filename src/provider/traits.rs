use crate::model::{FetchRequest, MarketSeries, ProviderError};

/// Supplier of historical bars. Implementations must return a series that
/// is sorted ascending, deduplicated and free of missing-value bars.
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<MarketSeries, ProviderError>;
}
