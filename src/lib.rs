pub mod analyzers;
pub mod chart;
pub mod error;
pub mod output;
pub mod stats;
pub mod table;

pub use error::AnalysisError;
