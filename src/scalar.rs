// Scalar extraction: downstream math needs definite floats, never NaN.
use crate::model::AnalysisError;

/// First element of a computed series. An empty series or a non-finite
/// head maps to `InvalidScalar` instead of leaking NaN downstream.
pub fn first(name: &'static str, values: &[f64]) -> Result<f64, AnalysisError> {
    match values.first() {
        Some(v) if v.is_finite() => Ok(*v),
        _ => Err(AnalysisError::InvalidScalar(name)),
    }
}

/// Most recent element of a computed series, same rules as [`first`].
/// Aligned indicator series carry a NaN prefix, so the tail is the only
/// position guaranteed to hold a usable value.
pub fn latest(name: &'static str, values: &[f64]) -> Result<f64, AnalysisError> {
    match values.last() {
        Some(v) if v.is_finite() => Ok(*v),
        _ => Err(AnalysisError::InvalidScalar(name)),
    }
}
