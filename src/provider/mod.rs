// Provider module: pluggable source of historical bars.

pub mod traits;
pub mod yahoo;

pub use traits::MarketDataProvider;
pub use yahoo::YahooProvider;
