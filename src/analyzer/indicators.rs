//! Derived series over a market series. Every series function returns a
//! vector aligned with its input: positions before the window fills hold
//! NaN, and consumers go through the scalar extractors rather than reading
//! NaN positions directly.

use crate::model::{AnalysisError, Bar, MarketSeries};
use chrono::Months;

/// Bars required for the full set; SMA200 is the deepest window.
pub const MIN_BARS_FULL_SET: usize = 200;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;
pub const VOLATILITY_WINDOW: usize = 30;

/// One snapshot of every derived series, recomputed per analysis run.
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub sma20: Vec<f64>,
    pub sma50: Vec<f64>,
    pub sma200: Vec<f64>,
    pub rsi14: Vec<f64>,
    pub boll_mid: Vec<f64>,
    pub boll_upper: Vec<f64>,
    pub boll_lower: Vec<f64>,
    pub atr14: Vec<f64>,
    pub vwap: Vec<f64>,
    pub volatility30: Vec<f64>,
}

pub struct IndicatorEngine;

impl IndicatorEngine {
    pub fn new() -> Self {
        Self
    }

    /// Computes the full indicator set. The series must cover the deepest
    /// window; shorter series are rejected before any series is built.
    pub fn compute(&self, series: &MarketSeries) -> Result<IndicatorSet, AnalysisError> {
        if series.len() < MIN_BARS_FULL_SET {
            return Err(AnalysisError::InsufficientData {
                required: MIN_BARS_FULL_SET,
                available: series.len(),
            });
        }

        let closes = series.closes();
        let (boll_mid, boll_upper, boll_lower) =
            bollinger_bands(&closes, BOLLINGER_PERIOD, BOLLINGER_K)?;

        Ok(IndicatorSet {
            sma20: sma(&closes, 20)?,
            sma50: sma(&closes, 50)?,
            sma200: sma(&closes, 200)?,
            rsi14: rsi(&closes, RSI_PERIOD)?,
            boll_mid,
            boll_upper,
            boll_lower,
            atr14: atr(series.bars(), ATR_PERIOD)?,
            vwap: vwap(series.bars()),
            volatility30: rolling_volatility(&closes, VOLATILITY_WINDOW)?,
        })
    }
}

fn ensure_window(window: usize, available: usize) -> Result<(), AnalysisError> {
    if window == 0 || window > available {
        return Err(AnalysisError::InsufficientData {
            required: window.max(1),
            available,
        });
    }
    Ok(())
}

fn sample_std(values: &[f64]) -> f64 {
    debug_assert!(values.len() >= 2);
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Simple moving average, defined from index `window - 1`.
pub fn sma(values: &[f64], window: usize) -> Result<Vec<f64>, AnalysisError> {
    ensure_window(window, values.len())?;

    let mut out = vec![f64::NAN; values.len()];
    for (i, w) in values.windows(window).enumerate() {
        out[i + window - 1] = w.iter().sum::<f64>() / window as f64;
    }
    Ok(out)
}

/// Sample standard deviation of daily returns over `window` observations.
/// Returns start at index 1, so the first defined position is `window`.
pub fn rolling_volatility(closes: &[f64], window: usize) -> Result<Vec<f64>, AnalysisError> {
    ensure_window(window.max(2) + 1, closes.len())?;

    let mut returns = vec![f64::NAN; closes.len()];
    for t in 1..closes.len() {
        returns[t] = closes[t] / closes[t - 1] - 1.0;
    }

    let mut out = vec![f64::NAN; closes.len()];
    for t in window..closes.len() {
        out[t] = sample_std(&returns[t + 1 - window..=t]);
    }
    Ok(out)
}

/// Average-rank percentile of `value` within `window`: ties count half,
/// so percentile(v1) <= percentile(v2) whenever v1 < v2.
pub fn percentile_rank(window: &[f64], value: f64) -> Result<f64, AnalysisError> {
    if window.is_empty() {
        return Err(AnalysisError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    let below = window.iter().filter(|v| **v < value).count() as f64;
    let equal = window.iter().filter(|v| **v == value).count() as f64;
    Ok((below + 0.5 * equal) / window.len() as f64 * 100.0)
}

/// RSI over simple rolling averages of gains and losses. A window with no
/// losses reads 100 (the overbought ceiling), not a division error.
pub fn rsi(closes: &[f64], period: usize) -> Result<Vec<f64>, AnalysisError> {
    ensure_window(period + 1, closes.len())?;

    let mut out = vec![f64::NAN; closes.len()];
    for t in period..closes.len() {
        let mut gains = 0.0;
        let mut losses = 0.0;
        for i in t + 1 - period..=t {
            let delta = closes[i] - closes[i - 1];
            if delta > 0.0 {
                gains += delta;
            } else {
                losses -= delta;
            }
        }
        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;

        out[t] = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
    }
    Ok(out)
}

/// Bollinger Bands: middle is SMA(window), upper/lower at +-k sample
/// standard deviations. Returns (middle, upper, lower).
pub fn bollinger_bands(
    closes: &[f64],
    window: usize,
    k: f64,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>), AnalysisError> {
    ensure_window(window.max(2), closes.len())?;

    let mid = sma(closes, window)?;
    let mut upper = vec![f64::NAN; closes.len()];
    let mut lower = vec![f64::NAN; closes.len()];
    for t in window - 1..closes.len() {
        let std = sample_std(&closes[t + 1 - window..=t]);
        upper[t] = mid[t] + k * std;
        lower[t] = mid[t] - k * std;
    }
    Ok((mid, upper, lower))
}

/// Average True Range. True range needs the previous close, so the first
/// defined position is `period`.
pub fn atr(bars: &[Bar], period: usize) -> Result<Vec<f64>, AnalysisError> {
    ensure_window(period + 1, bars.len())?;

    let mut tr = vec![f64::NAN; bars.len()];
    for t in 1..bars.len() {
        let prev_close = bars[t - 1].close;
        tr[t] = (bars[t].high - bars[t].low)
            .max((bars[t].high - prev_close).abs())
            .max((bars[t].low - prev_close).abs());
    }

    let mut out = vec![f64::NAN; bars.len()];
    for t in period..bars.len() {
        out[t] = tr[t + 1 - period..=t].iter().sum::<f64>() / period as f64;
    }
    Ok(out)
}

/// Cumulative VWAP from the series start. While no volume has traded yet
/// (routine for FX symbols) the ratio is undefined and the close stands in.
pub fn vwap(bars: &[Bar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;
    for bar in bars {
        cum_pv += bar.close * bar.volume;
        cum_vol += bar.volume;
        out.push(if cum_vol > 0.0 { cum_pv / cum_vol } else { bar.close });
    }
    out
}

/// Closes of the last 12 months, the reference window for percentile rank.
pub fn twelve_month_closes(series: &MarketSeries) -> Vec<f64> {
    let last = series.last_bar().date;
    let bars = match last.checked_sub_months(Months::new(12)) {
        Some(from) => series.tail_from(from),
        None => series.bars(),
    };
    bars.iter().map(|b| b.close).collect()
}
