// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod indicators;
pub mod narrative;
pub mod scoring;

// Re-export the engine types for ease of use.
pub use indicators::{IndicatorEngine, IndicatorSet};
