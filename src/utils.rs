// Utility functions

/// Parses the USD amount typed by the user. Comma is accepted as decimal
/// point, and values under 1000 are read as thousands ("100" means 100k$).
pub fn parse_amount(input: &str) -> Option<f64> {
    let raw: f64 = input.trim().replace(',', ".").parse().ok()?;
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    Some(if raw < 1000.0 { raw * 1000.0 } else { raw })
}

/// Rounds to `places` decimal places. Presentation boundary only.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}
