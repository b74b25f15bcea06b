//! Qualitative commentary assembled from three independent
//! classifications: percentile scenario, volatility regime, SMA50 trend.
//! Each clause is a pure function so the buckets stay testable on their own.

/// 30-day volatility above this reads as a nervous market; twice this as
/// high risk.
pub const DEFAULT_VOLATILITY_THRESHOLD: f64 = 0.0075;

/// Deviations from SMA50 under half a percent are reported as flat.
const TREND_DEAD_ZONE: f64 = 0.005;

/// Scenario bucket by percentile, inclusive at each upper bound. Low
/// percentile means a historically strong dollar.
pub fn scenario_clause(percentile: f64) -> &'static str {
    if percentile <= 15.0 {
        "SCENARIO: EXCELLENT. The dollar is near its strongest levels of the past year, a potentially golden opportunity."
    } else if percentile <= 40.0 {
        "SCENARIO: GOOD. The dollar is strong against its average, the conversion is advantageous."
    } else if percentile <= 70.0 {
        "SCENARIO: NEUTRAL. The exchange rate is in an intermediate phase with no clear edge."
    } else {
        "SCENARIO: UNFAVORABLE. The euro is strong, making the conversion comparatively expensive."
    }
}

pub fn volatility_clause(volatility: f64, threshold: f64) -> &'static str {
    if volatility > threshold * 2.0 {
        "The market is highly volatile and timing carries real risk."
    } else if volatility > threshold {
        "The market is nervous and unpredictable."
    } else {
        "The market is stable."
    }
}

/// For this pair a price under its 50-day average favors the dollar side
/// of the conversion.
pub fn trend_clause(price: f64, sma50: f64) -> &'static str {
    let deviation = (price - sma50) / sma50;
    if deviation.abs() < TREND_DEAD_ZONE {
        "The short-term trend is flat around its 50-day average."
    } else if deviation < 0.0 {
        "The short-term trend favors further dollar strength."
    } else {
        "The short-term trend is pushing in favor of the euro."
    }
}

pub fn narrative(
    percentile: f64,
    volatility: f64,
    price: f64,
    sma50: f64,
    volatility_threshold: f64,
) -> String {
    format!(
        "{} {} {}",
        scenario_clause(percentile),
        volatility_clause(volatility, volatility_threshold),
        trend_clause(price, sma50)
    )
}
