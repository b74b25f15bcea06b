//! Renders one recommendation as the terminal report. Pure formatting:
//! every number arrives already rounded by the assembly stage.

use crate::model::Recommendation;
use chrono::Local;
use std::fmt::Write;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

pub fn render(rec: &Recommendation) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "ADVANCED EXCHANGE ANALYSIS - {}",
        Local::now().format("%d/%m/%Y %H:%M")
    );
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(
        out,
        "Capital: {:.2} USD  |  Obtained at the applied rate: {:.2} EUR",
        rec.usd_amount, rec.eur_amount
    );
    let _ = writeln!(
        out,
        "Market rate ({}): {:.5}  |  Broker spread: {:.5}",
        rec.symbol, rec.market_rate, rec.spread
    );
    let _ = writeln!(out, "{}", THIN_RULE);
    let _ = writeln!(
        out,
        "Statistical positioning: {:.1}th percentile (0 = best, 100 = worst)",
        rec.percentile
    );
    let _ = writeln!(
        out,
        "30-day volatility: {:.5} (risk/opportunity index)",
        rec.volatility
    );
    let _ = writeln!(out, "{}", THIN_RULE);
    for signal in &rec.signals {
        let _ = writeln!(
            out,
            "  {:<14} {:>3}/{:<3} (raw {:.4})",
            signal.name, signal.score, signal.cap, signal.raw_value
        );
    }
    let _ = writeln!(
        out,
        "TOTAL SCORE: {}/100 -> {}",
        rec.total_score,
        rec.action.label()
    );
    let _ = writeln!(out, "{}", THIN_RULE);
    let _ = writeln!(out, "ANALYSIS: {}", rec.narrative);
    let _ = writeln!(out, "{}", THIN_RULE);
    let _ = writeln!(out, "Historical record (12 months, for comparison):");
    let _ = writeln!(
        out,
        "  - Best rate {} ({}): {:.2} EUR",
        rec.best.rate,
        rec.best.date.format("%d/%m/%Y"),
        rec.best.eur_amount
    );
    let _ = writeln!(
        out,
        "  - Worst rate {} ({}): {:.2} EUR",
        rec.worst.rate,
        rec.worst.date.format("%d/%m/%Y"),
        rec.worst.eur_amount
    );
    let _ = writeln!(
        out,
        "  - Distance from the best possible: {:.2} EUR",
        rec.best.eur_amount - rec.eur_amount
    );
    let _ = writeln!(out, "{}", RULE);

    out
}
