//! One analysis run, staged: validate inputs, fetch data, compute
//! indicators, score, narrate, assemble. The first failing stage aborts
//! the run; no partial result ever escapes.

use crate::analyzer::indicators::{self, IndicatorEngine};
use crate::analyzer::{narrative, scoring};
use crate::cache::SeriesCache;
use crate::model::{
    AnalysisError, Bar, FetchRequest, HistoricalExtreme, MarketSeries, Recommendation,
};
use crate::scalar;
use crate::utils::round_to;

use chrono::Months;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-run inputs supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest {
    pub usd_amount: f64,
    pub applied_rate: f64,
    pub force_refresh: bool,
}

pub struct Orchestrator {
    cache: Arc<SeriesCache>,
    request: FetchRequest,
    volatility_threshold: f64,
}

impl Orchestrator {
    pub fn new(cache: Arc<SeriesCache>, request: FetchRequest, volatility_threshold: f64) -> Self {
        Self {
            cache,
            request,
            volatility_threshold,
        }
    }

    pub async fn run(&self, input: &AnalysisRequest) -> Result<Recommendation, AnalysisError> {
        validate_inputs(input)?;

        info!("Fetching market data for {}...", self.request.symbol);
        let series = self.cache.get(&self.request, input.force_refresh).await?;

        info!("Computing indicators over {} bars...", series.len());
        let set = IndicatorEngine::new().compute(&series)?;

        let price = scalar::latest("close", &series.closes())?;
        let window = indicators::twelve_month_closes(&series);
        let percentile = indicators::percentile_rank(&window, price)?;

        let inputs = scoring::ScoreInputs {
            price,
            sma20: scalar::latest("sma20", &set.sma20)?,
            sma50: scalar::latest("sma50", &set.sma50)?,
            sma200: scalar::latest("sma200", &set.sma200)?,
            rsi: scalar::latest("rsi14", &set.rsi14)?,
            boll_upper: scalar::latest("bollinger upper", &set.boll_upper)?,
            boll_lower: scalar::latest("bollinger lower", &set.boll_lower)?,
            percentile,
        };
        let breakdown = scoring::score(&inputs);

        let volatility = scalar::latest("volatility30", &set.volatility30)?;
        let text = narrative::narrative(
            percentile,
            volatility,
            price,
            inputs.sma50,
            self.volatility_threshold,
        );

        info!("Total score {} -> {}", breakdown.total, breakdown.action.label());
        Ok(assemble(
            input, &series, price, percentile, volatility, inputs.sma50, breakdown, text,
        ))
    }
}

fn validate_inputs(input: &AnalysisRequest) -> Result<(), AnalysisError> {
    if !input.usd_amount.is_finite() || input.usd_amount <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "amount must be positive, got {}",
            input.usd_amount
        )));
    }
    if !input.applied_rate.is_finite() || input.applied_rate <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "applied rate must be positive, got {}",
            input.applied_rate
        )));
    }

    // sanity check only: an implausible broker rate is worth a warning but
    // must not block the run
    let implied = 1.0 / input.applied_rate;
    if !(0.5..=2.0).contains(&implied) {
        warn!(
            "Implied market rate {:.4} is outside the plausible [0.5, 2.0] band",
            implied
        );
    }
    Ok(())
}

/// Conversion arithmetic plus the historical best/worst comparison.
/// Presentation rounding happens here and only here: rates to 5 places,
/// currency to 2, percentages to 2.
fn assemble(
    input: &AnalysisRequest,
    series: &MarketSeries,
    price: f64,
    percentile: f64,
    volatility: f64,
    sma50: f64,
    breakdown: scoring::ScoreBreakdown,
    narrative: String,
) -> Recommendation {
    let eur_amount = input.usd_amount * input.applied_rate;
    // the broker's effective USD-per-EUR rate minus the market's
    let spread = 1.0 / input.applied_rate - price;

    let last = series.last_bar().date;
    let lookback = match last.checked_sub_months(Months::new(12)) {
        Some(from) => series.tail_from(from),
        None => series.bars(),
    };
    let best_bar = extreme_bar(lookback, |bar| -bar.low);
    let worst_bar = extreme_bar(lookback, |bar| bar.high);

    let best = HistoricalExtreme {
        rate: round_to(best_bar.low, 5),
        date: best_bar.date,
        eur_amount: round_to(input.usd_amount / (best_bar.low + spread), 2),
    };
    let worst = HistoricalExtreme {
        rate: round_to(worst_bar.high, 5),
        date: worst_bar.date,
        eur_amount: round_to(input.usd_amount / (worst_bar.high + spread), 2),
    };

    Recommendation {
        symbol: series.symbol().to_string(),
        usd_amount: input.usd_amount,
        applied_rate: input.applied_rate,
        eur_amount: round_to(eur_amount, 2),
        market_rate: round_to(price, 5),
        spread: round_to(spread, 5),
        percentile: round_to(percentile, 2),
        volatility: round_to(volatility, 5),
        sma50: round_to(sma50, 5),
        signals: breakdown.signals,
        total_score: breakdown.total,
        action: breakdown.action,
        narrative,
        best,
        worst,
    }
}

/// Bar maximizing `key` over a non-empty window.
fn extreme_bar(bars: &[Bar], key: impl Fn(&Bar) -> f64) -> &Bar {
    bars.iter()
        .reduce(|acc, bar| if key(bar) > key(acc) { bar } else { acc })
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MarketSeries, ProviderError};
    use crate::provider::MarketDataProvider;
    use chrono::{Days, Duration, NaiveDate};

    struct FixedProvider {
        bars: usize,
    }

    impl FixedProvider {
        fn series(n: usize) -> MarketSeries {
            let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
            let bars = (0..n)
                .map(|i| {
                    let close = 1.05 + 0.05 * (i as f64 * 0.1).sin();
                    Bar {
                        date: start + Days::new(i as u64),
                        open: close,
                        high: close + 0.004,
                        low: close - 0.004,
                        close,
                        volume: 0.0,
                    }
                })
                .collect();
            MarketSeries::new("EURUSD=X", "1d", bars).unwrap()
        }
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn fetch(&self, _req: &FetchRequest) -> Result<MarketSeries, ProviderError> {
            Ok(Self::series(self.bars))
        }
    }

    fn orchestrator(bars: usize) -> Orchestrator {
        let cache = Arc::new(SeriesCache::new(
            Arc::new(FixedProvider { bars }),
            Duration::hours(1),
        ));
        let request = FetchRequest {
            symbol: "EURUSD=X".to_string(),
            range: "2y".to_string(),
            interval: "1d".to_string(),
        };
        Orchestrator::new(cache, request, narrative::DEFAULT_VOLATILITY_THRESHOLD)
    }

    fn analysis(amount: f64, rate: f64) -> AnalysisRequest {
        AnalysisRequest {
            usd_amount: amount,
            applied_rate: rate,
            force_refresh: false,
        }
    }

    #[tokio::test]
    async fn eur_amount_is_exact_and_score_bounded() {
        let rec = orchestrator(250)
            .run(&analysis(10_000.0, 0.955))
            .await
            .unwrap();

        assert_eq!(rec.eur_amount, 9550.00);
        assert!(rec.total_score <= 100);
        assert_eq!(rec.signals.len(), 4);
        let sum: u32 = rec.signals.iter().map(|s| s.score).sum();
        assert_eq!(rec.total_score, sum);
    }

    #[tokio::test]
    async fn rejects_nonpositive_amount_and_rate() {
        let orch = orchestrator(250);
        assert!(matches!(
            orch.run(&analysis(0.0, 0.955)).await,
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            orch.run(&analysis(10_000.0, -1.0)).await,
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn minimum_series_length_is_a_hard_boundary() {
        assert!(orchestrator(200).run(&analysis(10_000.0, 0.955)).await.is_ok());

        let err = orchestrator(199)
            .run(&analysis(10_000.0, 0.955))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData {
                required: 200,
                available: 199
            }
        ));
    }

    #[tokio::test]
    async fn same_inputs_give_identical_results() {
        let orch = orchestrator(250);
        let first = orch.run(&analysis(125_000.0, 0.8462)).await.unwrap();
        let second = orch.run(&analysis(125_000.0, 0.8462)).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn historical_extremes_use_the_spread() {
        let rec = orchestrator(250)
            .run(&analysis(100_000.0, 0.8462))
            .await
            .unwrap();

        // best rate is the lowest low, worst the highest high
        assert!(rec.best.rate < rec.worst.rate);
        // a stronger dollar in the past means more EUR than the worst day
        assert!(rec.best.eur_amount > rec.worst.eur_amount);
        // spread re-applied: converting at the best historical rate through
        // the same broker beats or matches today's conversion
        assert!(rec.best.eur_amount >= rec.eur_amount - 0.01);
    }

    #[tokio::test]
    async fn presentation_values_are_rounded() {
        let rec = orchestrator(250)
            .run(&analysis(33_333.0, 0.8765))
            .await
            .unwrap();

        assert_eq!(rec.market_rate, round_to(rec.market_rate, 5));
        assert_eq!(rec.spread, round_to(rec.spread, 5));
        assert_eq!(rec.eur_amount, round_to(rec.eur_amount, 2));
        assert_eq!(rec.percentile, round_to(rec.percentile, 2));
    }
}
