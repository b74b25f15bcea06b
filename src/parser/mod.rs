// Parser module: decodes the provider's chart payload into bars.

pub mod chart_parser;

pub use chart_parser::ChartParser;
