//! Multi-factor scoring. Each factor is a small pure function over
//! immutable inputs; the factors compose into the 0-100 total by simple
//! summation, and the total maps onto a fixed action classification.

use crate::model::{Action, Signal};

pub const TREND_CAP: u32 = 40;
pub const MOMENTUM_CAP: u32 = 30;
pub const BAND_CAP: u32 = 20;
pub const PERCENTILE_CAP: u32 = 10;

/// Latest indicator values, already reduced to definite scalars.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    pub price: f64,
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub rsi: f64,
    pub boll_upper: f64,
    pub boll_lower: f64,
    pub percentile: f64,
}

#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub signals: Vec<Signal>,
    pub total: u32,
    pub action: Action,
}

/// Price below a moving average means a strong dollar; the three checks
/// are independent and strict, so price equal to every average scores 0.
pub fn trend_score(price: f64, sma20: f64, sma50: f64, sma200: f64) -> u32 {
    let mut score = 0;
    if price < sma20 {
        score += 10;
    }
    if price < sma50 {
        score += 15;
    }
    if price < sma200 {
        score += 15;
    }
    score
}

pub fn momentum_score(rsi: f64) -> u32 {
    if rsi < 30.0 {
        30
    } else if rsi < 40.0 {
        20
    } else if rsi < 50.0 {
        10
    } else if rsi > 70.0 {
        0
    } else {
        5
    }
}

/// Position of the price inside the Bollinger channel, 0 at the lower band
/// and 1 at the upper. A zero-width channel has no defined position.
pub fn band_position(price: f64, lower: f64, upper: f64) -> Option<f64> {
    let width = upper - lower;
    if width == 0.0 {
        None
    } else {
        Some((price - lower) / width)
    }
}

/// Low in the channel is favorable. A degenerate (flat) channel scores the
/// neutral 5 instead of dividing by zero.
pub fn band_score(price: f64, lower: f64, upper: f64) -> u32 {
    match band_position(price, lower, upper) {
        Some(pos) if pos < 0.2 => 20,
        Some(pos) if pos < 0.4 => 10,
        Some(pos) if pos > 0.8 => 0,
        Some(_) => 5,
        None => 5,
    }
}

/// Low percentile = historically strong dollar.
pub fn percentile_score(percentile: f64) -> u32 {
    if percentile <= 20.0 {
        10
    } else if percentile <= 40.0 {
        7
    } else if percentile <= 60.0 {
        3
    } else {
        0
    }
}

/// Buckets are inclusive at their lower bound and cover all of [0, 100].
pub fn classify(total: u32) -> Action {
    if total >= 70 {
        Action::Excellent
    } else if total >= 50 {
        Action::Good
    } else if total >= 30 {
        Action::Neutral
    } else {
        Action::Unfavorable
    }
}

pub fn score(inputs: &ScoreInputs) -> ScoreBreakdown {
    let trend = trend_score(inputs.price, inputs.sma20, inputs.sma50, inputs.sma200);
    let momentum = momentum_score(inputs.rsi);
    let band = band_score(inputs.price, inputs.boll_lower, inputs.boll_upper);
    let percentile = percentile_score(inputs.percentile);

    let signals = vec![
        Signal {
            name: "trend",
            raw_value: inputs.price,
            score: trend,
            cap: TREND_CAP,
        },
        Signal {
            name: "momentum",
            raw_value: inputs.rsi,
            score: momentum,
            cap: MOMENTUM_CAP,
        },
        Signal {
            name: "band_position",
            raw_value: band_position(inputs.price, inputs.boll_lower, inputs.boll_upper)
                .unwrap_or(0.5),
            score: band,
            cap: BAND_CAP,
        },
        Signal {
            name: "percentile",
            raw_value: inputs.percentile,
            score: percentile,
            cap: PERCENTILE_CAP,
        },
    ];

    let total = signals.iter().map(|s| s.score).sum();
    ScoreBreakdown {
        signals,
        total,
        action: classify(total),
    }
}
