use crate::model::Bar;

/// Final cleanup before series construction: invalid bars dropped, dates
/// sorted ascending, duplicate dates collapsed keeping the latest row.
pub fn normalize_bars(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.retain(Bar::is_valid);
    bars.sort_by_key(|b| b.date);

    let mut out: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match out.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => out.push(bar),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 0.01,
            low: close - 0.01,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn sorts_and_dedupes_keeping_last() {
        let raw = vec![bar(3, 1.10), bar(2, 1.08), bar(3, 1.11)];
        let out = normalize_bars(raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(out[1].close, 1.11);
    }

    #[test]
    fn drops_invalid_bars() {
        let mut broken = bar(4, 1.09);
        broken.low = -1.0;
        let out = normalize_bars(vec![bar(2, 1.08), broken]);
        assert_eq!(out.len(), 1);
    }
}
