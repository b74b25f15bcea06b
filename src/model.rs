// Core structs: Bar, MarketSeries, Signal, Recommendation
use chrono::NaiveDate;
use thiserror::Error;

/// One daily OHLCV observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// All prices positive and finite, volume non-negative and finite.
    /// FX feeds report zero volume, so zero is allowed.
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite() && *p > 0.0)
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}

/// Ordered, validated time series of bars for one symbol.
/// Dates are strictly ascending and unique; immutable after construction.
#[derive(Debug, Clone)]
pub struct MarketSeries {
    symbol: String,
    interval: String,
    bars: Vec<Bar>,
}

impl MarketSeries {
    pub fn new(symbol: &str, interval: &str, bars: Vec<Bar>) -> Result<Self, ParserError> {
        if bars.is_empty() {
            return Err(ParserError::EmptySeries);
        }
        for bar in &bars {
            if !bar.is_valid() {
                return Err(ParserError::InvalidBar(bar.date));
            }
        }
        for w in bars.windows(2) {
            if w[1].date <= w[0].date {
                return Err(ParserError::OutOfOrder(w[1].date));
            }
        }
        Ok(Self {
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn last_bar(&self) -> &Bar {
        // non-empty by construction
        self.bars.last().unwrap()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars dated `from` or later. The series is sorted, so this is a suffix.
    pub fn tail_from(&self, from: NaiveDate) -> &[Bar] {
        let idx = self.bars.partition_point(|b| b.date < from);
        &self.bars[idx..]
    }
}

/// One fetch of historical bars, keyed for caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub symbol: String,
    pub range: String,
    pub interval: String,
}

impl FetchRequest {
    pub fn cache_key(&self) -> String {
        format!("{}-{}-{}", self.symbol, self.range, self.interval)
    }
}

/// One scored factor of the recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub name: &'static str,
    pub raw_value: f64,
    pub score: u32,
    pub cap: u32,
}

/// Overall verdict derived from the total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Excellent,
    Good,
    Neutral,
    Unfavorable,
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Action::Excellent => "EXCELLENT (green)",
            Action::Good => "GOOD (yellow)",
            Action::Neutral => "NEUTRAL (orange)",
            Action::Unfavorable => "UNFAVORABLE (red)",
        }
    }
}

/// Best or worst market rate seen in the lookback window, with the EUR
/// amount that would have been obtained at that rate through the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalExtreme {
    pub rate: f64,
    pub date: NaiveDate,
    pub eur_amount: f64,
}

/// Immutable result of one analysis run. Presentation values are rounded
/// at assembly; nothing in here is mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub symbol: String,
    pub usd_amount: f64,
    pub applied_rate: f64,
    pub eur_amount: f64,
    pub market_rate: f64,
    pub spread: f64,
    pub percentile: f64,
    pub volatility: f64,
    pub sma50: f64,
    pub signals: Vec<Signal>,
    pub total_score: u32,
    pub action: Action,
    pub narrative: String,
    pub best: HistoricalExtreme,
    pub worst: HistoricalExtreme,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http request failed: {0}")]
    Http(String),
    #[error("provider returned status {0}")]
    Status(u16),
    #[error("provider payload rejected: {0}")]
    Payload(#[from] ParserError),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("malformed chart payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("provider error: {0}")]
    Chart(String),
    #[error("payload contained no usable bars")]
    EmptySeries,
    #[error("invalid bar at {0}")]
    InvalidBar(NaiveDate),
    #[error("bars out of order at {0}")]
    OutOfOrder(NaiveDate),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("corrupt cache row: {0}")]
    Corrupt(String),
}

/// Run-level error taxonomy. `InvalidInput` means the caller should fix its
/// parameters; `DataUnavailable` means a retry may succeed later.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("market data unavailable: {0}")]
    DataUnavailable(#[from] ProviderError),
    #[error("insufficient data: need {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("could not reduce {0} to a scalar")]
    InvalidScalar(&'static str),
}
