// Chart-endpoint JSON parsing
use crate::model::{Bar, ParserError};
use chrono::DateTime;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct ChartParser;

impl ChartParser {
    pub fn new() -> Self {
        Self
    }

    /// Decodes a chart payload into bars. Rows with any missing OHLC field
    /// are dropped; a missing volume reads as zero (FX symbols report none).
    pub fn parse(&self, body: &str) -> Result<Vec<Bar>, ParserError> {
        let response: ChartResponse = serde_json::from_str(body)?;

        if let Some(err) = response.chart.error {
            return Err(ParserError::Chart(format!(
                "{}: {}",
                err.code,
                err.description.unwrap_or_default()
            )));
        }

        let result = response
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
            .ok_or(ParserError::EmptySeries)?;
        let quote = result
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or(ParserError::EmptySeries)?;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let fields = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close)) = fields else {
                continue;
            };
            let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
                continue;
            };
            let volume = quote.volume.get(i).copied().flatten().unwrap_or(0.0);
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if bars.is_empty() {
            return Err(ParserError::EmptySeries);
        }
        Ok(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(timestamps: &str, quote: &str) -> String {
        format!(
            r#"{{"chart":{{"result":[{{"timestamp":{timestamps},"indicators":{{"quote":[{quote}]}}}}],"error":null}}}}"#
        )
    }

    #[test]
    fn parses_rows_and_drops_holes() {
        let body = payload(
            "[1704153600,1704240000,1704326400]",
            r#"{"open":[1.09,null,1.10],"high":[1.10,1.11,1.11],"low":[1.08,1.09,1.09],"close":[1.095,1.10,1.105],"volume":[0,0,null]}"#,
        );
        let bars = ChartParser::new().parse(&body).unwrap();
        // middle row has a null open and is dropped
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 1.095);
        assert_eq!(bars[1].volume, 0.0);
    }

    #[test]
    fn provider_error_is_typed() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = ChartParser::new().parse(body).unwrap_err();
        assert!(matches!(err, ParserError::Chart(_)));
    }

    #[test]
    fn empty_result_is_not_a_series() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(
            ChartParser::new().parse(body),
            Err(ParserError::EmptySeries)
        ));

        let all_null = payload(
            "[1704153600]",
            r#"{"open":[null],"high":[null],"low":[null],"close":[null],"volume":[null]}"#,
        );
        assert!(matches!(
            ChartParser::new().parse(&all_null),
            Err(ParserError::EmptySeries)
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(
            ChartParser::new().parse("{not json"),
            Err(ParserError::Json(_))
        ));
    }
}
